use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::app::ports::{DeviceDirectory, SalesLedger};
use crate::domain::{DeviceEntry, NewSale};
use crate::error::{StoreError, StoreResult};
use crate::payload::iso_timestamp;

#[derive(Default)]
struct SalesTable {
    rows: Vec<Value>,
    keys: HashSet<(String, String)>,
}

/// In-memory device registry and sales table for local runs and tests.
///
/// The (tenant_id, txn) check and the insert happen under one lock, so
/// concurrent duplicates behave like the database constraint.
#[derive(Default)]
pub struct InMemoryStore {
    devices: RwLock<Vec<DeviceEntry>>,
    sales: Mutex<SalesTable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: Vec<DeviceEntry>) -> Self {
        Self {
            devices: RwLock::new(devices),
            sales: Mutex::new(SalesTable::default()),
        }
    }

    /// Load a JSON array of device registry rows
    pub fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read device seed file '{}'", path.display()))?;
        let devices: Vec<DeviceEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse device seed file '{}'", path.display()))?;
        Ok(Self::with_devices(devices))
    }

    pub fn register_device(&self, entry: DeviceEntry) {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn device_count(&self) -> usize {
        self.devices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Snapshot of persisted rows, in insertion order
    pub fn sales(&self) -> Vec<Value> {
        self.sales
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .clone()
    }
}

#[async_trait]
impl DeviceDirectory for InMemoryStore {
    async fn find_devices(&self, identifier: &str, limit: usize) -> StoreResult<Vec<DeviceEntry>> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<DeviceEntry> = devices
            .iter()
            .filter(|d| d.key_matches(identifier))
            .take(limit)
            .cloned()
            .collect();
        if entries.iter().any(|e| e.tenant().is_some()) {
            return Ok(entries);
        }

        entries.extend(
            devices
                .iter()
                .filter(|d| d.name_matches(identifier))
                .take(limit)
                .cloned(),
        );
        Ok(entries)
    }
}

#[async_trait]
impl SalesLedger for InMemoryStore {
    async fn insert_sale(&self, sale: &NewSale) -> StoreResult<Vec<Value>> {
        let mut row = serde_json::to_value(sale).map_err(|e| StoreError::Decode(e.to_string()))?;
        let id = Uuid::new_v4();
        if let Value::Object(fields) = &mut row {
            fields.insert("id".to_string(), Value::String(id.to_string()));
            fields.insert("created_at".to_string(), Value::String(iso_timestamp(Utc::now())));
        }

        let key = (sale.tenant_id.key(), sale.txn.clone());
        let mut table = self.sales.lock().unwrap_or_else(PoisonError::into_inner);
        if !table.keys.insert(key) {
            return Err(StoreError::UniqueViolation {
                message: format!(
                    "duplicate key value violates unique constraint: (tenant_id, txn)=({}, {}) already exists",
                    sale.tenant_id, sale.txn
                ),
            });
        }
        table.rows.push(row.clone());

        debug!("Stored sale {} for tenant {} with id {}", sale.txn, sale.tenant_id, id);
        Ok(vec![row])
    }
}
