//! Route definitions for the Spice Ledger API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .nest("/inventory", inventory_routes())
        .nest("/remittances", remittance_routes())
        .route("/budget", get(handlers::get_budget))
        .nest("/staff", staff_routes())
        .nest("/fund-requests", fund_request_routes())
        .route("/dashboard", get(handlers::get_dashboard))
        .nest("/reports", report_routes())
        .route("/reset", post(handlers::reset_all))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // PIN login (public)
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}

/// Stock ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/items/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route(
            "/purchases",
            get(handlers::list_purchases).post(handlers::record_purchase),
        )
        .route(
            "/purchases/:purchase_id",
            get(handlers::get_purchase)
                .put(handlers::update_purchase)
                .delete(handlers::delete_purchase),
        )
        .route(
            "/consumptions",
            get(handlers::list_consumptions).post(handlers::record_consumption),
        )
        .route(
            "/consumptions/:consumption_id",
            get(handlers::get_consumption)
                .put(handlers::update_consumption)
                .delete(handlers::delete_consumption),
        )
        .route("/audit", get(handlers::audit_stock))
        .route("/rebuild", post(handlers::rebuild_stock))
        .route(
            "/requests",
            get(handlers::list_inventory_requests).post(handlers::create_inventory_request),
        )
        .route(
            "/requests/:request_id",
            put(handlers::advance_inventory_request)
                .delete(handlers::delete_inventory_request),
        )
}

/// Remittance ledger routes
fn remittance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_remittances).post(handlers::create_remittance),
        )
        .route("/totals", get(handlers::remittance_totals))
        .route(
            "/:remittance_id",
            get(handlers::get_remittance)
                .put(handlers::update_remittance)
                .delete(handlers::delete_remittance),
        )
        .route(
            "/:remittance_id/confirm",
            post(handlers::confirm_remittance),
        )
}

/// Payroll ledger routes
fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_staff).post(handlers::create_staff))
        .route(
            "/:staff_id",
            get(handlers::get_staff)
                .put(handlers::update_staff)
                .delete(handlers::delete_staff),
        )
        .route("/:staff_id/salary", post(handlers::record_salary))
        .route("/:staff_id/advance", post(handlers::record_advance))
        .route(
            "/:staff_id/setup-recovery",
            post(handlers::record_setup_recovery),
        )
        .route("/:staff_id/setup-cost", post(handlers::initialize_setup_cost))
        .route("/:staff_id/compensate", post(handlers::compensate_entry))
}

fn fund_request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_fund_requests).post(handlers::create_fund_request),
        )
        .route(
            "/:request_id",
            put(handlers::advance_fund_request)
                .delete(handlers::delete_fund_request),
        )
}

/// CSV/JSON exports
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/remittances", get(handlers::export_remittances))
        .route("/purchases", get(handlers::export_purchases))
        .route("/payroll", get(handlers::export_payroll))
}
