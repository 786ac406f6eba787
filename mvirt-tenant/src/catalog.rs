//! Resource catalog - uniform, typed reads of partition contents.

use std::sync::Arc;

use crate::clients::DeviceClient;
use crate::error::{Result, TenantError};
use crate::resource::{Appliance, ManagedResource, ResourceKind};

/// Lists partition resources by kind. Holds no state besides the client handle.
#[derive(Clone)]
pub struct ResourceCatalog {
    device: Arc<dyn DeviceClient>,
}

impl ResourceCatalog {
    pub fn new(device: Arc<dyn DeviceClient>) -> Self {
        Self { device }
    }

    /// All instances of `kind` in the partition, in device order.
    pub async fn list(
        &self,
        appliance: &Appliance,
        partition: &str,
        kind: ResourceKind,
    ) -> Result<Vec<ManagedResource>> {
        self.device
            .list(appliance, kind, partition)
            .await
            .map_err(|source| TenantError::Catalog {
                appliance: appliance.hostname.clone(),
                partition: partition.to_string(),
                kind,
                source,
            })
    }

    pub async fn route_domain_names(
        &self,
        appliance: &Appliance,
        partition: &str,
    ) -> Result<Vec<String>> {
        let domains = self
            .list(appliance, partition, ResourceKind::RouteDomain)
            .await?;
        Ok(domains.into_iter().map(|d| d.name).collect())
    }

    /// True iff the partition holds no virtual addresses and no nodes.
    ///
    /// Always reads live state; callers must not cache the answer across
    /// teardown attempts.
    pub async fn is_empty(&self, appliance: &Appliance, partition: &str) -> Result<bool> {
        for kind in ResourceKind::LOAD_BEARING {
            if !self.list(appliance, partition, kind).await?.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
