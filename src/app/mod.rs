pub mod ingest_sale_use_case;
pub mod ports;
pub mod tenant_resolution;

pub use ingest_sale_use_case::{IngestOutcome, SaleIngestHandler, WebhookRequest};
pub use ports::{DeviceDirectory, SalesLedger};
