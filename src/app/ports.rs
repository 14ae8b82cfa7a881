use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{DeviceEntry, NewSale};
use crate::error::StoreResult;

/// Read side of the device registry
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Entries whose `device_key` equals `identifier` exactly, at most `limit` rows. When none of
    /// them carries a tenant, followed by up to `limit` entries whose `device_name` matches.
    /// An empty vec means "not found"; `Err` means the query itself failed.
    async fn find_devices(&self, identifier: &str, limit: usize) -> StoreResult<Vec<DeviceEntry>>;
}

/// Write side of the sales table
#[async_trait]
pub trait SalesLedger: Send + Sync {
    /// Insert one row and return what was persisted.
    /// Must fail with `StoreError::UniqueViolation` when (tenant_id, txn) already exists.
    async fn insert_sale(&self, sale: &NewSale) -> StoreResult<Vec<Value>>;
}
