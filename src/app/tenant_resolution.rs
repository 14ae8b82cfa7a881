use crate::domain::{DeviceEntry, TenantId};
use crate::error::IngestError;
use tracing::warn;

/// Pick the owning tenant from directory rows matching `identifier`.
///
/// Rows matching on `device_key` win; rows matching only on `device_name` are the fallback.
/// Within the chosen group, rows without a tenant are skipped, and more than one distinct
/// tenant is reported as ambiguous rather than resolved arbitrarily.
pub fn resolve_tenant(identifier: &str, entries: &[DeviceEntry]) -> Result<TenantId, IngestError> {
    let by_key: Vec<&DeviceEntry> = entries.iter().filter(|e| e.key_matches(identifier)).collect();
    let by_name: Vec<&DeviceEntry> = entries.iter().filter(|e| e.name_matches(identifier)).collect();

    for (column, group) in [("device_key", by_key), ("device_name", by_name)] {
        let mut tenants: Vec<&TenantId> = Vec::new();
        for tenant in group.iter().filter_map(|e| e.tenant()) {
            if !tenants.iter().any(|t| t.key() == tenant.key()) {
                tenants.push(tenant);
            }
        }

        match tenants.as_slice() {
            [] => continue,
            [tenant] => return Ok((*tenant).clone()),
            _ => {
                let ids: Vec<String> = tenants.iter().map(|t| t.key()).collect();
                warn!(
                    identifier,
                    column,
                    tenants = %ids.join(","),
                    "Device identifier maps to more than one tenant"
                );
                return Err(IngestError::AmbiguousDevice);
            }
        }
    }

    Err(IngestError::UnknownDevice)
}
