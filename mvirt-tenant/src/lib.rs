//! mvirt-tenant: tenant partition lifecycle on network appliances.
//!
//! A tenant's partition is created on every appliance backing the tenant
//! when its first workload is provisioned, and torn down again, in a fixed
//! and resumable order, once its last workload is removed.

pub mod adapter;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod deleter;
pub mod error;
pub mod manager;
pub mod resource;
pub mod shutdown;

pub use adapter::ServiceAdapter;
pub use catalog::ResourceCatalog;
pub use config::{ManagerConfig, RetryPolicy};
pub use deleter::RetryingDeleter;
pub use error::{CallbackError, DeviceError, Result, TenantError};
pub use manager::{CleanupPolicy, CleanupReport, Provisioned, TeardownOutcome, TenantManager};
pub use resource::{Appliance, ManagedResource, ResourceKind, TenantService};
pub use shutdown::Shutdown;
