//! Tenant manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default traffic group for new partitions.
pub const DEFAULT_TRAFFIC_GROUP: &str = "traffic-group-1";

/// Default number of delete attempts on expired authentication.
pub const DEFAULT_DELETE_ATTEMPTS: u32 = 3;

/// Default pause between delete attempts in milliseconds.
pub const DEFAULT_DELETE_INTERVAL_MS: u64 = 1000;

/// Fixed-interval retry policy for resource deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between two attempts. Not scaled between attempts.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_DELETE_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_DELETE_INTERVAL_MS),
        }
    }
}

/// Configuration of a [`crate::TenantManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Traffic group bound to new partitions unless the service pins one.
    pub default_traffic_group: String,
    pub retry: RetryPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_traffic_group: DEFAULT_TRAFFIC_GROUP.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}
