//! Spice Ledger - reconciliation engine for a meal service run from India
//! with a kitchen in Russia.
//!
//! Tracks groceries, money transfers, staff pay and student contracts, and
//! derives the budget, alerts and dashboard from those ledgers.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
use error::AppResult;
use services::AuthService;
use store::LedgerStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub config: Arc<Config>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, config: Config) -> AppResult<Self> {
        let auth = AuthService::new(&config)?;
        Ok(Self {
            store,
            config: Arc::new(config),
            auth,
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Spice Ledger API v1"
}
