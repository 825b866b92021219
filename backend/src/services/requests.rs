//! Fund and inventory request workflow service

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use shared::{
    FundRequest, InventoryRequest, NewFundRequest, NewInventoryRequest, Operation, RequestStatus,
    Role,
};

use super::authorize;
use crate::error::AppResult;
use crate::store::{LedgerStore, RequestKind};

#[derive(Debug, Deserialize)]
pub struct AdvanceRequestInput {
    pub status: RequestStatus,
}

/// Request workflow service; requests never move ledger balances
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn LedgerStore>,
}

/// Fulfilment is open to managers, every other decision is the admin's
fn operation_for(next: RequestStatus) -> Operation {
    match next {
        RequestStatus::Fulfilled => Operation::FulfillRequest,
        _ => Operation::ReviewRequest,
    }
}

impl RequestService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn create_fund_request(
        &self,
        role: Role,
        input: NewFundRequest,
    ) -> AppResult<FundRequest> {
        authorize(role, Operation::RaiseRequest)?;
        let request = FundRequest::from_new(input, role.as_str(), Utc::now())?;
        let request = self.store.insert_fund_request(request).await?;
        tracing::info!(request_id = %request.id, amount_rub = %request.amount_rub, "Fund request raised");
        Ok(request)
    }

    pub async fn list_fund_requests(&self, role: Role) -> AppResult<Vec<FundRequest>> {
        authorize(role, Operation::RaiseRequest)?;
        self.store.list_fund_requests().await
    }

    pub async fn advance_fund_request(
        &self,
        role: Role,
        id: Uuid,
        next: RequestStatus,
    ) -> AppResult<FundRequest> {
        authorize(role, operation_for(next))?;
        let request = self.store.advance_fund_request(id, next, Utc::now()).await?;
        tracing::info!(request_id = %id, status = next.as_str(), "Fund request advanced");
        Ok(request)
    }

    pub async fn create_inventory_request(
        &self,
        role: Role,
        input: NewInventoryRequest,
    ) -> AppResult<InventoryRequest> {
        authorize(role, Operation::RaiseRequest)?;
        let request = InventoryRequest::from_new(input, role.as_str(), Utc::now())?;
        let request = self.store.insert_inventory_request(request).await?;
        tracing::info!(request_id = %request.id, item = %request.item_name, "Inventory request raised");
        Ok(request)
    }

    pub async fn list_inventory_requests(&self, role: Role) -> AppResult<Vec<InventoryRequest>> {
        authorize(role, Operation::RaiseRequest)?;
        self.store.list_inventory_requests().await
    }

    pub async fn advance_inventory_request(
        &self,
        role: Role,
        id: Uuid,
        next: RequestStatus,
    ) -> AppResult<InventoryRequest> {
        authorize(role, operation_for(next))?;
        let request = self
            .store
            .advance_inventory_request(id, next, Utc::now())
            .await?;
        tracing::info!(request_id = %id, status = next.as_str(), "Inventory request advanced");
        Ok(request)
    }

    pub async fn delete_request(&self, role: Role, kind: RequestKind, id: Uuid) -> AppResult<()> {
        authorize(role, Operation::ReviewRequest)?;
        self.store.delete_request(kind, id).await?;
        tracing::info!(request_id = %id, "Request deleted");
        Ok(())
    }
}
