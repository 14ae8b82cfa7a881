use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::Method;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::app::ports::{DeviceDirectory, SalesLedger};
use crate::app::tenant_resolution::resolve_tenant;
use crate::auth::SharedSecret;
use crate::config::WebhookConfig;
use crate::constants::{DEVICE_MATCH_LIMIT, MAX_BODY_BYTES};
use crate::domain::{NewSale, TenantId};
use crate::error::IngestError;
use crate::metrics::IngestMetrics;
use crate::payload::SalePayload;

/// One inbound webhook call, already stripped of transport details
pub struct WebhookRequest {
    pub method: Method,
    /// Raw `x-webhook-secret` header value, if present and valid UTF-8
    pub secret: Option<String>,
    pub body: Body,
}

/// Successful results. A duplicate txn is a success, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Inserted(Vec<Value>),
    Duplicate { txn: String },
}

/// Turns one webhook call into at most one new sale row
pub struct SaleIngestHandler {
    secret: SharedSecret,
    devices: Arc<dyn DeviceDirectory>,
    ledger: Arc<dyn SalesLedger>,
}

impl SaleIngestHandler {
    pub fn new(
        config: &WebhookConfig,
        devices: Arc<dyn DeviceDirectory>,
        ledger: Arc<dyn SalesLedger>,
    ) -> Self {
        Self {
            secret: SharedSecret::new(config.webhook_secret.clone()),
            devices,
            ledger,
        }
    }

    pub async fn handle(&self, request: WebhookRequest) -> Result<IngestOutcome, IngestError> {
        let result = self.process(request).await;
        match &result {
            Ok(IngestOutcome::Inserted(_)) => IngestMetrics::record_outcome("inserted"),
            Ok(IngestOutcome::Duplicate { .. }) => IngestMetrics::record_outcome("duplicate"),
            Err(e) => IngestMetrics::record_outcome(e.kind()),
        }
        result
    }

    async fn process(&self, request: WebhookRequest) -> Result<IngestOutcome, IngestError> {
        let received_at = Utc::now();

        if request.method != Method::POST {
            debug!(method = %request.method, "Rejecting non-POST request");
            return Err(IngestError::MethodNotAllowed);
        }

        if !self.secret.verify(request.secret.as_deref()) {
            warn!(
                header_present = request.secret.is_some(),
                "Rejecting request with bad or missing webhook secret"
            );
            return Err(IngestError::Unauthorized);
        }

        let body = to_bytes(request.body, MAX_BODY_BYTES).await.map_err(|e| {
            debug!("Failed to read request body: {}", e);
            IngestError::InvalidPayload
        })?;

        let payload = SalePayload::from_body(&body, received_at).map_err(|e| {
            debug!("Rejecting payload: {}", e);
            e
        })?;

        let identifier = match payload.device_identifier.clone() {
            Some(id) => id,
            None => {
                debug!(txn = %payload.txn, "No device identifier in payload");
                return Err(IngestError::UnknownDevice);
            }
        };

        let tenant_id = self.resolve(&identifier).await?;
        let sale = payload.into_sale(tenant_id, identifier);
        self.insert(sale).await
    }

    async fn resolve(&self, identifier: &str) -> Result<TenantId, IngestError> {
        let started = Instant::now();
        let lookup = self.devices.find_devices(identifier, DEVICE_MATCH_LIMIT).await;
        IngestMetrics::record_store_duration("lookup", started.elapsed().as_secs_f64());

        let entries = lookup.map_err(|e| {
            error!(identifier, "Device lookup error: {}", e);
            IngestMetrics::record_lookup_failure();
            IngestError::DeviceLookupFailed(e)
        })?;

        resolve_tenant(identifier, &entries).map_err(|e| {
            if matches!(e, IngestError::UnknownDevice) {
                info!(identifier, "Unknown device or missing tenant association");
            }
            e
        })
    }

    async fn insert(&self, sale: NewSale) -> Result<IngestOutcome, IngestError> {
        let started = Instant::now();
        let result = self.ledger.insert_sale(&sale).await;
        IngestMetrics::record_store_duration("insert", started.elapsed().as_secs_f64());

        match result {
            Ok(rows) => {
                info!(
                    tenant_id = %sale.tenant_id,
                    device = %sale.device,
                    txn = %sale.txn,
                    rows = rows.len(),
                    "Recorded sale"
                );
                Ok(IngestOutcome::Inserted(rows))
            }
            Err(e) if e.is_unique_violation() => {
                info!(tenant_id = %sale.tenant_id, txn = %sale.txn, "Duplicate txn ignored");
                IngestMetrics::record_duplicate();
                Ok(IngestOutcome::Duplicate { txn: sale.txn })
            }
            Err(e) => {
                error!(tenant_id = %sale.tenant_id, txn = %sale.txn, "Sale insert error: {}", e);
                IngestMetrics::record_insert_failure();
                Err(IngestError::InsertFailed(e))
            }
        }
    }
}
