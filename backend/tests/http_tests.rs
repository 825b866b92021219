//! HTTP surface tests
//!
//! Drives the full router over an in-memory store: PIN login, bearer
//! authentication, role enforcement and the error body.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

use spice_ledger::config::{Config, StorageBackend};
use spice_ledger::store::MemoryStore;
use spice_ledger::{create_app, AppState};

fn app() -> Router {
    let mut config = Config::default();
    config.environment = "development".to_string();
    config.storage.backend = StorageBackend::Memory;
    config.auth.bcrypt_cost = 4;
    let state = AppState::new(Arc::new(MemoryStore::new()), config).unwrap();
    create_app(state)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

async fn login(app: &Router, pin: &str) -> String {
    let (status, body) = send(app, Method::POST, "/api/v1/auth/login", None, Some(json!({ "pin": pin }))).await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "connected");
}

#[tokio::test]
async fn test_login_resolves_role() {
    let app = app();
    let token = login(&app, "5678").await;
    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "manager");
    assert!(body["capabilities"]
        .as_array()
        .unwrap()
        .contains(&json!("record_purchase")));
}

#[tokio::test]
async fn test_wrong_pin_is_unauthorized() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/v1/auth/login", None, Some(json!({ "pin": "0000" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/v1/inventory/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/api/v1/inventory/items", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

// ============================================================================
// Ledger flows
// ============================================================================

#[tokio::test]
async fn test_cook_cannot_create_items() {
    let app = app();
    let token = login(&app, "9999").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        Some(&token),
        Some(json!({ "name": "Rice", "unit": "kg" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn test_purchase_flow_over_http() {
    let app = app();
    let admin = login(&app, "1234").await;

    let (status, item) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        Some(&admin),
        Some(json!({ "name": "Rice", "unit": "kg", "minimum_threshold": "5" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, remittance) = send(
        &app,
        Method::POST,
        "/api/v1/remittances",
        Some(&admin),
        Some(json!({
            "amount_inr": "1000",
            "rubal_rate": "0.9",
            "sent_to": "Kitchen account",
            "purpose": "Groceries",
            "proof_image_url": "proofs/transfer.png"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let remittance_id = remittance["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/remittances/{}/confirm", remittance_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/remittances/{}/confirm", remittance_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let manager = login(&app, "5678").await;
    let (status, change) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/purchases",
        Some(&manager),
        Some(json!({
            "item_id": item["id"],
            "quantity": "10",
            "price_rub": "850",
            "invoice_image": "invoices/rice.jpg",
            "purchased_by": "Olga",
            "linked_remittance_id": remittance_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&change["items"][0]["current_stock"]), Decimal::from(10));
    let purchase_id = change["record"]["id"].as_str().unwrap().to_string();

    let cook = login(&app, "9999").await;
    let (status, purchase) = send(
        &app,
        Method::GET,
        &format!("/api/v1/inventory/purchases/{}", purchase_id),
        Some(&cook),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&purchase["quantity"]), Decimal::from(10));

    let (status, change) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/consumptions",
        Some(&cook),
        Some(json!({
            "item_id": item["id"],
            "quantity_used": "3",
            "logged_by": "Olga"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let consumption_id = change["record"]["id"].as_str().unwrap().to_string();

    let (status, consumption) = send(
        &app,
        Method::GET,
        &format!("/api/v1/inventory/consumptions/{}", consumption_id),
        Some(&cook),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&consumption["quantity_used"]), Decimal::from(3));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/inventory/consumptions/{}", purchase_id),
        Some(&cook),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, budget) = send(&app, Method::GET, "/api/v1/budget", Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&budget["procurement_gap_rub"]), Decimal::from(50));
    assert_eq!(budget["status"], "balanced");
}

#[tokio::test]
async fn test_missing_invoice_names_field() {
    let app = app();
    let admin = login(&app, "1234").await;
    let (_, item) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        Some(&admin),
        Some(json!({ "name": "Rice", "unit": "kg" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/purchases",
        Some(&admin),
        Some(json!({
            "item_id": item["id"],
            "quantity": "10",
            "price_rub": "850",
            "purchased_by": "Olga",
            "linked_remittance_id": uuid::Uuid::new_v4()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "invoice_image");
}

#[tokio::test]
async fn test_reset_requires_confirmation() {
    let app = app();
    let admin = login(&app, "1234").await;
    let (status, _) = send(&app, Method::POST, "/api/v1/reset", Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, counts) = send(
        &app,
        Method::POST,
        "/api/v1/reset",
        Some(&admin),
        Some(json!({ "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts["inventory_items"], 0);
}

#[tokio::test]
async fn test_payroll_csv_export() {
    let app = app();
    let admin = login(&app, "1234").await;
    let (_, ledger) = send(
        &app,
        Method::POST,
        "/api/v1/staff",
        Some(&admin),
        Some(json!({ "staff_name": "Cook Olga", "monthly_salary_rub": "5000" })),
    )
    .await;
    let staff_id = ledger["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/staff/{}/salary", staff_id),
        Some(&admin),
        Some(json!({ "amount": "1000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/api/v1/reports/payroll?format=csv")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with("staff_name,"));
    assert!(csv.contains("Cook Olga"));
    assert!(csv.contains("salary_paid"));
}
