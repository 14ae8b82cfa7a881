use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::domain::{NewSale, TenantId};
use crate::error::IngestError;

/// A webhook body after validation and defaulting, before tenant resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SalePayload {
    /// `device_key` when present, otherwise the legacy `device` field
    pub device_identifier: Option<String>,
    pub vendo: String,
    pub amount: Number,
    pub txn: String,
    pub ts: String,
    pub metadata: Map<String, Value>,
}

impl SalePayload {
    /// Parse a raw request body. An empty body is an empty object.
    pub fn from_body(body: &[u8], received_at: DateTime<Utc>) -> Result<Self, IngestError> {
        let value: Value = if body.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body).map_err(|_| IngestError::InvalidPayload)?
        };
        Self::from_value(value, received_at)
    }

    pub fn from_value(value: Value, received_at: DateTime<Utc>) -> Result<Self, IngestError> {
        // Arrays and scalars carry none of the fields, same as `{}`
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        if is_falsy(fields.get("vendo"))
            || is_absent(fields.get("amount"))
            || is_falsy(fields.get("txn"))
        {
            return Err(IngestError::MissingFields);
        }

        let vendo = text_field(&fields, "vendo")?.ok_or(IngestError::MissingFields)?;
        let txn = text_field(&fields, "txn")?.ok_or(IngestError::MissingFields)?;
        let amount = amount_field(&fields)?;

        let device_identifier = match text_field(&fields, "device_key")? {
            Some(key) => Some(key),
            None => text_field(&fields, "device")?,
        };

        let ts = match fields.get("ts") {
            None | Some(Value::Null) => default_timestamp(received_at),
            Some(Value::String(s)) if s.is_empty() => default_timestamp(received_at),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(IngestError::InvalidField("ts")),
        };

        let metadata = match fields.get("metadata") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(m)) => m.clone(),
            Some(_) => return Err(IngestError::InvalidField("metadata")),
        };

        Ok(Self {
            device_identifier,
            vendo,
            amount,
            txn,
            ts,
            metadata,
        })
    }

    /// Attach the resolved tenant. `device` is the caller's identifier string.
    pub fn into_sale(self, tenant_id: TenantId, device: String) -> NewSale {
        NewSale {
            tenant_id,
            device,
            vendo: self.vendo,
            amount: self.amount,
            txn: self.txn,
            ts: self.ts,
            metadata: self.metadata,
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `at` rounded up to the next whole millisecond, so the default never precedes `at`
fn default_timestamp(at: DateTime<Utc>) -> String {
    let past_millis = at.timestamp_subsec_nanos() % 1_000_000;
    if past_millis == 0 {
        return iso_timestamp(at);
    }
    iso_timestamp(at + Duration::nanoseconds(i64::from(1_000_000 - past_millis)))
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Absent, null, `""`, `0` and `false` all count as not provided
fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Strings pass through, numbers are stringified, blanks are `None`.
fn text_field(fields: &Map<String, Value>, name: &'static str) -> Result<Option<String>, IngestError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(IngestError::InvalidField(name)),
    }
}

fn amount_field(fields: &Map<String, Value>) -> Result<Number, IngestError> {
    match fields.get("amount") {
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(Value::String(s)) => {
            serde_json::from_str::<Number>(s.trim()).map_err(|_| IngestError::InvalidField("amount"))
        }
        None | Some(Value::Null) => Err(IngestError::MissingFields),
        Some(_) => Err(IngestError::InvalidField("amount")),
    }
}
