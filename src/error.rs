use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Failures reported by a storage adapter
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage is not configured: {0}")]
    Unconfigured(String),

    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The (tenant_id, txn) uniqueness constraint rejected the row
    #[error("{message}")]
    UniqueViolation { message: String },

    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("unexpected storage response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Every way a webhook call can end without recording a sale
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid JSON body")]
    InvalidPayload,

    #[error("Missing required fields: vendo, amount, txn")]
    MissingFields,

    #[error("Invalid field: {0}")]
    InvalidField(&'static str),

    #[error("Unknown device or missing tenant association")]
    UnknownDevice,

    #[error("Ambiguous device identifier")]
    AmbiguousDevice,

    #[error("Device lookup failed")]
    DeviceLookupFailed(#[source] StoreError),

    #[error("DB insert failed")]
    InsertFailed(#[source] StoreError),

    /// Detail is for the server log only
    #[error("Internal server error")]
    Internal(String),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            IngestError::Unauthorized => StatusCode::UNAUTHORIZED,
            IngestError::InvalidPayload
            | IngestError::MissingFields
            | IngestError::InvalidField(_)
            | IngestError::UnknownDevice => StatusCode::BAD_REQUEST,
            IngestError::AmbiguousDevice => StatusCode::CONFLICT,
            IngestError::DeviceLookupFailed(_) | IngestError::InsertFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            IngestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Storage message returned to the caller for infrastructure failures
    pub fn detail(&self) -> Option<String> {
        match self {
            IngestError::DeviceLookupFailed(e) | IngestError::InsertFailed(e) => Some(e.to_string()),
            _ => None,
        }
    }

    /// Stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MethodNotAllowed => "method_not_allowed",
            IngestError::Unauthorized => "unauthorized",
            IngestError::InvalidPayload => "invalid_payload",
            IngestError::MissingFields => "missing_fields",
            IngestError::InvalidField(_) => "invalid_field",
            IngestError::UnknownDevice => "unknown_device",
            IngestError::AmbiguousDevice => "ambiguous_device",
            IngestError::DeviceLookupFailed(_) => "device_lookup_failed",
            IngestError::InsertFailed(_) => "insert_failed",
            IngestError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let body = match self.detail() {
            Some(detail) => json!({ "error": self.to_string(), "detail": detail }),
            None => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}
