//! Error types for tenant partition management.

use thiserror::Error;

use crate::manager::CleanupReport;
use crate::resource::ResourceKind;

/// Classified failure reported by a device client.
///
/// The classification is the only contract the manager relies on:
/// `AuthExpired` is retried, `NotFound` counts as already deleted and
/// everything else is a hard failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The session on the appliance expired while the request was in flight.
    #[error("authentication expired on {appliance}: {message}")]
    AuthExpired { appliance: String, message: String },

    /// The addressed object does not exist on the appliance.
    #[error("{kind} '{name}' not found on {appliance}")]
    NotFound {
        appliance: String,
        kind: ResourceKind,
        name: String,
    },

    /// Any other device or transport failure.
    #[error("device error on {appliance}: {message}")]
    Other { appliance: String, message: String },
}

impl DeviceError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, DeviceError::AuthExpired { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DeviceError::NotFound { .. })
    }
}

/// Failure of an external side-effect callback (port deallocation, fabric cleanup).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A failure recorded for one appliance during best-effort cleanup.
#[derive(Debug)]
pub struct ApplianceFailure {
    pub appliance: String,
    pub error: TenantError,
}

/// Errors surfaced by [`crate::TenantManager`].
///
/// Every variant except `NoAppliances` leaves the partition in a state that
/// is safe to retry: already-deleted resources simply list empty next time.
#[derive(Debug, Error)]
pub enum TenantError {
    /// The tenant service has no target appliances.
    #[error("tenant {tenant_id} has no appliances")]
    NoAppliances { tenant_id: String },

    /// Partition creation failed.
    #[error("folder creation error for tenant {tenant_id} on {appliance}")]
    Provisioning {
        tenant_id: String,
        appliance: String,
        #[source]
        source: DeviceError,
    },

    /// Listing a resource type failed.
    #[error("failed to list {kind} in partition {partition} on {appliance}")]
    Catalog {
        appliance: String,
        partition: String,
        kind: ResourceKind,
        #[source]
        source: DeviceError,
    },

    /// Deleting a resource failed, possibly after retries.
    #[error("failed to delete {kind} '{name}' on {appliance} after {attempts} attempt(s)")]
    Deletion {
        appliance: String,
        kind: ResourceKind,
        name: String,
        attempts: u32,
        #[source]
        source: DeviceError,
    },

    /// The fabric side-channel refused to release a VLAN tag.
    #[error("fabric cleanup of tag {tag} for {appliance} failed")]
    FabricCleanup {
        appliance: String,
        tag: u16,
        #[source]
        source: CallbackError,
    },

    /// Route domain deletion failed. Manual intervention might be required.
    #[error(
        "failed to delete route domain '{name}' in partition {partition} on {appliance}; manual intervention might be required"
    )]
    RouteDomain {
        appliance: String,
        partition: String,
        name: String,
        #[source]
        source: DeviceError,
    },

    /// Folder deletion failed. Manual cleanup might be required.
    #[error(
        "folder deletion for partition {partition} on {appliance} failed; manual cleanup might be required"
    )]
    Folder {
        appliance: String,
        partition: String,
        #[source]
        source: DeviceError,
    },

    /// Shutdown was requested before teardown finished.
    #[error("teardown of partition {partition} on {appliance} cancelled")]
    Cancelled { appliance: String, partition: String },

    /// Best-effort cleanup finished with at least one failed appliance.
    /// `report` holds the outcomes of the appliances that did not fail.
    #[error("cleanup incomplete on {} appliance(s)", .failures.len())]
    Incomplete {
        failures: Vec<ApplianceFailure>,
        report: CleanupReport,
    },
}

/// Result type for tenant operations.
pub type Result<T> = std::result::Result<T, TenantError>;
