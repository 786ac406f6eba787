//! Maps tenant services onto appliance folder names and payloads.

use serde_json::{Value, json};

use crate::resource::TenantService;

/// Default prefix of tenant partition names.
pub const DEFAULT_FOLDER_PREFIX: &str = "Project_";

/// Partition holding appliance-wide objects such as traffic groups.
pub const COMMON_PARTITION: &str = "Common";

/// Converts tenant identity into device folder names and create payloads.
#[derive(Debug, Clone)]
pub struct ServiceAdapter {
    folder_prefix: String,
}

impl Default for ServiceAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDER_PREFIX)
    }
}

impl ServiceAdapter {
    pub fn new(folder_prefix: &str) -> Self {
        Self {
            folder_prefix: folder_prefix.to_string(),
        }
    }

    /// Partition name for a tenant. Deterministic.
    pub fn folder_name_for(&self, tenant_id: &str) -> String {
        format!("{}{}", self.folder_prefix, tenant_id)
    }

    /// Folder create payload, passed verbatim to the device client.
    pub fn folder_descriptor(&self, service: &TenantService, traffic_group: &str) -> Value {
        let name = self.folder_name_for(&service.tenant_id);
        json!({
            "name": name,
            "subPath": "/",
            "fullPath": format!("/{}", name),
            "hidden": false,
            "inheritedDevicegroup": "true",
            "trafficGroup": traffic_group,
            "inheritedTrafficGroup": "false",
        })
    }
}

/// Qualify a traffic group name with the common partition unless it already is.
pub fn qualify_traffic_group(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{}/{}", COMMON_PARTITION, name)
    }
}
