use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::app::ports::{DeviceDirectory, SalesLedger};
use crate::config::SupabaseConfig;
use crate::constants::{
    DEVICE_REGISTRY_COLUMNS, DEVICE_REGISTRY_TABLE, SALES_TABLE, UNIQUE_VIOLATION_SQLSTATE,
};
use crate::domain::{DeviceEntry, NewSale};
use crate::error::{StoreError, StoreResult};

/// Device registry and sales ledger backed by Supabase's PostgREST API.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    rest_url: Option<String>,
    service_key: Option<String>,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &SupabaseConfig) -> Self {
        Self {
            client,
            rest_url: config
                .url
                .as_ref()
                .map(|u| format!("{}/rest/v1", u.trim_end_matches('/'))),
            service_key: config.service_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> StoreResult<RequestBuilder> {
        let base = self
            .rest_url
            .as_deref()
            .ok_or_else(|| StoreError::Unconfigured("SUPABASE_URL is not set".to_string()))?;
        let key = self
            .service_key
            .as_deref()
            .ok_or_else(|| StoreError::Unconfigured("SUPABASE_SERVICE_KEY is not set".to_string()))?;

        Ok(self
            .client
            .request(method, format!("{}/{}", base, table))
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key)))
    }

    /// `GET /device_registry?<column>=eq.<identifier>`. The value after `eq.` is taken literally.
    async fn select_devices(
        &self,
        column: &str,
        identifier: &str,
        limit: usize,
    ) -> StoreResult<Vec<DeviceEntry>> {
        let filter = format!("eq.{}", identifier);
        let limit = limit.to_string();

        let resp = self
            .request(reqwest::Method::GET, DEVICE_REGISTRY_TABLE)?
            .query(&[
                ("select", DEVICE_REGISTRY_COLUMNS),
                (column, filter.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("device_registry rows: {}", e)))
    }
}

#[async_trait]
impl DeviceDirectory for SupabaseStore {
    async fn find_devices(&self, identifier: &str, limit: usize) -> StoreResult<Vec<DeviceEntry>> {
        let mut entries = self.select_devices("device_key", identifier, limit).await?;
        if entries.iter().any(|e| e.tenant().is_some()) {
            return Ok(entries);
        }

        let by_name = self.select_devices("device_name", identifier, limit).await?;
        entries.extend(by_name);
        Ok(entries)
    }
}

#[async_trait]
impl SalesLedger for SupabaseStore {
    async fn insert_sale(&self, sale: &NewSale) -> StoreResult<Vec<Value>> {
        let resp = self
            .request(reqwest::Method::POST, SALES_TABLE)?
            .header("Prefer", "return=representation")
            .json(&[sale])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("inserted sales rows: {}", e)))
    }
}

/// PostgREST error body
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Map a non-2xx PostgREST response onto a typed storage error.
///
/// SQLSTATE 23505 is authoritative; the message check covers proxies and older
/// gateways that drop the code.
pub fn classify_error(status: u16, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = match parsed.message.filter(|m| !m.is_empty()) {
        Some(m) => m,
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => body.trim().to_string(),
    };

    if parsed.code.as_deref() == Some(UNIQUE_VIOLATION_SQLSTATE) || mentions_uniqueness(&message) {
        return StoreError::UniqueViolation { message };
    }

    StoreError::Rejected {
        status,
        code: parsed.code,
        message,
    }
}

fn mentions_uniqueness(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("duplicate") || lower.contains("unique")
}
