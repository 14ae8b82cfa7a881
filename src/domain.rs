use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Opaque tenant identifier as stored in the device registry (uuid text or an integer key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Value);

impl TenantId {
    /// Null and empty-string tenants mean the device has no tenant association.
    pub fn is_missing(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Canonical text form, used for equality across string and numeric ids
    pub fn key(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<i64> for TenantId {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

/// One row of the device registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub device_key: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

impl DeviceEntry {
    pub fn new(tenant_id: impl Into<TenantId>, device_key: &str, device_name: &str) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            device_key: Some(device_key.to_string()),
            device_name: Some(device_name.to_string()),
        }
    }

    pub fn key_matches(&self, identifier: &str) -> bool {
        self.device_key.as_deref() == Some(identifier)
    }

    pub fn name_matches(&self, identifier: &str) -> bool {
        self.device_name.as_deref() == Some(identifier)
    }

    /// The owning tenant, if the row actually carries one
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref().filter(|t| !t.is_missing())
    }
}

/// A sale ready to be written to the `sales` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSale {
    pub tenant_id: TenantId,
    /// Identifier exactly as the caller sent it, not the registry's canonical key
    pub device: String,
    pub vendo: String,
    pub amount: Number,
    pub txn: String,
    pub ts: String,
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tenant_id_accepts_text_and_numbers() {
        let entry: DeviceEntry = serde_json::from_value(json!({
            "tenant_id": 42,
            "device_key": "vk-1",
            "device_name": "Lobby"
        }))
        .unwrap();
        assert_eq!(entry.tenant().unwrap().key(), "42");

        let entry: DeviceEntry = serde_json::from_value(json!({
            "tenant_id": "8d7e0a52-5a3c-4c7a-9d53-0f0b1b2a3c4d",
            "device_key": "vk-2"
        }))
        .unwrap();
        assert_eq!(
            entry.tenant().unwrap().to_string(),
            "8d7e0a52-5a3c-4c7a-9d53-0f0b1b2a3c4d"
        );
        assert_eq!(entry.device_name, None);
    }

    #[test]
    fn test_missing_tenant_is_not_an_association() {
        let entry: DeviceEntry = serde_json::from_value(json!({
            "tenant_id": null,
            "device_key": "vk-1",
            "device_name": "Lobby"
        }))
        .unwrap();
        assert!(entry.tenant().is_none());

        let entry = DeviceEntry::new("", "vk-1", "Lobby");
        assert!(entry.tenant().is_none());
    }

    #[test]
    fn test_matching_is_exact_and_case_sensitive() {
        let entry = DeviceEntry::new("t1", "VK-1", "Lobby Machine");
        assert!(entry.key_matches("VK-1"));
        assert!(!entry.key_matches("Lobby Machine"));
        assert!(entry.name_matches("Lobby Machine"));
        assert!(!entry.key_matches("vk-1"));
        assert!(!entry.name_matches("Lobby"));
    }

    #[test]
    fn test_new_sale_serializes_numeric_tenant_verbatim() {
        let sale = NewSale {
            tenant_id: TenantId::from(7),
            device: "VK-1".to_string(),
            vendo: "V-12".to_string(),
            amount: Number::from(0),
            txn: "T-1".to_string(),
            ts: "2024-01-01T00:00:00.000Z".to_string(),
            metadata: Map::new(),
        };
        let value = serde_json::to_value(&sale).unwrap();
        assert_eq!(value["tenant_id"], json!(7));
        assert_eq!(value["amount"], json!(0));
        assert_eq!(value["metadata"], json!({}));
    }
}
