//! Resource deletion with bounded retry on expired device sessions.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::clients::DeviceClient;
use crate::config::RetryPolicy;
use crate::error::{Result, TenantError};
use crate::resource::{Appliance, ManagedResource};
use crate::shutdown::Shutdown;

/// Deletes single resources, retrying only when the device session expired.
///
/// Sessions on long-lived appliance connections expire independently of the
/// request in flight, so an `AuthExpired` answer is worth another attempt.
/// Every other failure is returned after the first attempt. `NotFound`
/// means the resource is already gone and counts as success.
#[derive(Clone)]
pub struct RetryingDeleter {
    device: Arc<dyn DeviceClient>,
    policy: RetryPolicy,
    shutdown: Shutdown,
}

impl RetryingDeleter {
    pub fn new(device: Arc<dyn DeviceClient>, policy: RetryPolicy, shutdown: Shutdown) -> Self {
        Self {
            device,
            policy,
            shutdown,
        }
    }

    pub async fn delete(&self, appliance: &Appliance, resource: &ManagedResource) -> Result<()> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.device.delete(appliance, resource).await {
                Ok(()) => {
                    debug!(
                        "Deleted {} {} on {}",
                        resource.kind, resource.name, appliance
                    );
                    return Ok(());
                }
                Err(e) if e.is_not_found() => {
                    debug!(
                        "{} {} already absent on {}",
                        resource.kind, resource.name, appliance
                    );
                    return Ok(());
                }
                Err(e) if e.is_auth_expired() && attempt < max_attempts => {
                    warn!("Attempt {}: {}", attempt, e);
                    if self.shutdown.pause(self.policy.interval).await {
                        return Err(TenantError::Cancelled {
                            appliance: appliance.hostname.clone(),
                            partition: resource.partition.clone(),
                        });
                    }
                }
                Err(source) => {
                    error!(
                        "Failed to delete {} {} on {}: {}",
                        resource.kind, resource.name, appliance, source
                    );
                    return Err(TenantError::Deletion {
                        appliance: appliance.hostname.clone(),
                        kind: resource.kind,
                        name: resource.name.clone(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}
