//! Clients for the appliance API and external bookkeeping services.
//!
//! - device: REST configuration API on each appliance
//! - plugin: port allocation bookkeeping (best-effort deallocation)
//! - fabric: network fabric VLAN cleanup (required)

pub mod fabric;
pub mod plugin;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CallbackError, DeviceError};
use crate::resource::{Appliance, ManagedResource, ResourceKind};

pub use fabric::{HttpFabricCleaner, UnconfiguredFabric};
pub use plugin::{NoopPortDeallocator, PluginPortDeallocator};
pub use rest::RestDeviceClient;

/// Typed access to an appliance's configuration API.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Check whether an object exists. `name` is the path below the collection,
    /// `partition~name` for partitioned objects and the bare partition for folders.
    async fn exists(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        name: &str,
    ) -> Result<bool, DeviceError>;

    /// Create an object from an opaque payload.
    async fn create(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        payload: Value,
    ) -> Result<ManagedResource, DeviceError>;

    /// List every object of `kind` in a partition. Empty partitions yield an empty list.
    async fn list(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        partition: &str,
    ) -> Result<Vec<ManagedResource>, DeviceError>;

    /// Delete one object.
    async fn delete(
        &self,
        appliance: &Appliance,
        resource: &ManagedResource,
    ) -> Result<(), DeviceError>;
}

/// Releases ports held by external allocation bookkeeping.
#[async_trait]
pub trait PortDeallocator: Send + Sync {
    async fn deallocate(&self, port_name: &str) -> Result<(), CallbackError>;
}

/// Releases network fabric state tied to a VLAN tag on an appliance.
#[async_trait]
pub trait FabricCleaner: Send + Sync {
    async fn cleanup_network(&self, hostname: &str, tag: u16) -> Result<(), CallbackError>;
}
