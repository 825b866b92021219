//! HTTP handlers for the stock ledger

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    ConsumptionUpdate, InventoryConsumption, InventoryItem, InventoryPurchase, ItemDetailsUpdate,
    NewConsumption, NewInventoryItem, NewPurchase, PurchaseUpdate, StockAudit, StockDrift,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::StockService;
use crate::store::StockChange;
use crate::AppState;

// ============================================================================
// Items
// ============================================================================

pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let service = StockService::new(state.store);
    let items = service.list_items(current_user.role()).await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewInventoryItem>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    let service = StockService::new(state.store);
    let item = service.create_item(current_user.role(), input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let service = StockService::new(state.store);
    let item = service.get_item(current_user.role(), item_id).await?;
    Ok(Json(item))
}

/// Edit descriptive fields; stock is never writable here
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<ItemDetailsUpdate>,
) -> AppResult<Json<InventoryItem>> {
    let service = StockService::new(state.store);
    let item = service
        .update_item(current_user.role(), item_id, input)
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = StockService::new(state.store);
    service.delete_item(current_user.role(), item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Purchases
// ============================================================================

pub async fn list_purchases(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryPurchase>>> {
    let service = StockService::new(state.store);
    let purchases = service.list_purchases(current_user.role()).await?;
    Ok(Json(purchases))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<InventoryPurchase>> {
    let service = StockService::new(state.store);
    let purchase = service.get_purchase(current_user.role(), purchase_id).await?;
    Ok(Json(purchase))
}

pub async fn record_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewPurchase>,
) -> AppResult<(StatusCode, Json<StockChange<InventoryPurchase>>)> {
    let service = StockService::new(state.store);
    let change = service.record_purchase(current_user.role(), input).await?;
    Ok((StatusCode::CREATED, Json(change)))
}

pub async fn update_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
    Json(input): Json<PurchaseUpdate>,
) -> AppResult<Json<StockChange<InventoryPurchase>>> {
    let service = StockService::new(state.store);
    let change = service
        .update_purchase(current_user.role(), purchase_id, input)
        .await?;
    Ok(Json(change))
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<StockChange<InventoryPurchase>>> {
    let service = StockService::new(state.store);
    let change = service
        .delete_purchase(current_user.role(), purchase_id)
        .await?;
    Ok(Json(change))
}

// ============================================================================
// Consumptions
// ============================================================================

pub async fn list_consumptions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryConsumption>>> {
    let service = StockService::new(state.store);
    let consumptions = service.list_consumptions(current_user.role()).await?;
    Ok(Json(consumptions))
}

pub async fn get_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(consumption_id): Path<Uuid>,
) -> AppResult<Json<InventoryConsumption>> {
    let service = StockService::new(state.store);
    let consumption = service
        .get_consumption(current_user.role(), consumption_id)
        .await?;
    Ok(Json(consumption))
}

pub async fn record_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewConsumption>,
) -> AppResult<(StatusCode, Json<StockChange<InventoryConsumption>>)> {
    let service = StockService::new(state.store);
    let change = service
        .record_consumption(current_user.role(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(change)))
}

pub async fn update_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(consumption_id): Path<Uuid>,
    Json(input): Json<ConsumptionUpdate>,
) -> AppResult<Json<StockChange<InventoryConsumption>>> {
    let service = StockService::new(state.store);
    let change = service
        .update_consumption(current_user.role(), consumption_id, input)
        .await?;
    Ok(Json(change))
}

pub async fn delete_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(consumption_id): Path<Uuid>,
) -> AppResult<Json<StockChange<InventoryConsumption>>> {
    let service = StockService::new(state.store);
    let change = service
        .delete_consumption(current_user.role(), consumption_id)
        .await?;
    Ok(Json(change))
}

// ============================================================================
// Audit
// ============================================================================

/// Compare stored counters with a full replay of the logs
pub async fn audit_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<StockAudit>> {
    let service = StockService::new(state.store);
    let audit = service.audit(current_user.role()).await?;
    Ok(Json(audit))
}

/// Overwrite counters with the replayed values
pub async fn rebuild_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StockDrift>>> {
    let service = StockService::new(state.store);
    let drift = service.rebuild(current_user.role()).await?;
    Ok(Json(drift))
}
