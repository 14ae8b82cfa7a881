/// Wire-level constants shared by the HTTP layer and the storage adapters

/// Header carrying the shared webhook secret. Header lookups are case-insensitive.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

// PostgREST table names
pub const DEVICE_REGISTRY_TABLE: &str = "device_registry";
pub const SALES_TABLE: &str = "sales";

/// Columns selected from the device registry
pub const DEVICE_REGISTRY_COLUMNS: &str = "tenant_id,device_key,device_name";

/// Rows fetched per device lookup. More than one is needed to notice ambiguous identifiers.
pub const DEVICE_MATCH_LIMIT: usize = 5;

/// Postgres SQLSTATE for unique_violation
pub const UNIQUE_VIOLATION_SQLSTATE: &str = "23505";

/// Largest webhook body read into memory, the same request cap as the serverless host
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

pub const DEFAULT_PORT: u16 = 8080;

// Environment variable names
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_PROJECT_REF: &str = "SUPABASE_PROJECT_REF";
pub const ENV_SUPABASE_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const ENV_SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_WEBHOOK_SECRET: &str = "WEBHOOK_SECRET";
