//! Tenant partition lifecycle manager.
//!
//! Creates a tenant's partition on every appliance backing the tenant and
//! tears it down again once the tenant's last workload is gone. Teardown per
//! appliance runs these phases, strictly in order:
//!
//! 1. list the partition's route domains (must succeed)
//! 2. check emptiness: any virtual address or node left makes it a no-op
//! 3. release external ports of SNAT translations and self IPs (best-effort)
//! 4. delete SNATs, SNAT pools, SNAT translations, self IPs and VLANs
//! 5. delete the route domains collected in 1
//! 6. delete the folder
//!
//! Every step tolerates resources that are already gone, so a teardown that
//! failed halfway can simply be invoked again.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::adapter::{ServiceAdapter, qualify_traffic_group};
use crate::catalog::ResourceCatalog;
use crate::clients::{DeviceClient, FabricCleaner, PortDeallocator};
use crate::config::ManagerConfig;
use crate::deleter::RetryingDeleter;
use crate::error::{ApplianceFailure, DeviceError, Result, TenantError};
use crate::resource::{Appliance, ManagedResource, ResourceKind, TenantService};
use crate::shutdown::Shutdown;

/// Result of [`TenantManager::assure_created`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub partition: String,
    /// Fully qualified traffic group the partition is bound to.
    pub traffic_group: String,
    /// Hostnames of appliances on which the partition was newly created.
    pub created: Vec<String>,
}

/// How failures on one appliance affect the others during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Process appliances one after another and stop at the first failure.
    #[default]
    AbortOnFirstFailure,
    /// Process every appliance, up to `max_parallel` at a time, and report
    /// all failures together.
    BestEffort { max_parallel: usize },
}

/// End state of one appliance after a teardown pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// The partition did not exist. Nothing was changed.
    Absent,
    /// Virtual addresses or nodes remain. Nothing was changed.
    NotEmpty,
    /// The partition and all its resources were deleted.
    Removed,
}

/// Per-appliance outcomes of [`TenantManager::assure_cleanup`], in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub outcomes: Vec<(String, TeardownOutcome)>,
}

impl CleanupReport {
    pub fn outcome(&self, hostname: &str) -> Option<TeardownOutcome> {
        self.outcomes
            .iter()
            .find(|(h, _)| h == hostname)
            .map(|(_, o)| *o)
    }
}

/// Creates and removes tenant partitions across the tenant's appliances.
pub struct TenantManager {
    device: Arc<dyn DeviceClient>,
    ports: Arc<dyn PortDeallocator>,
    fabric: Arc<dyn FabricCleaner>,
    adapter: ServiceAdapter,
    catalog: ResourceCatalog,
    deleter: RetryingDeleter,
    config: ManagerConfig,
    shutdown: Shutdown,
}

impl TenantManager {
    pub fn new(
        device: Arc<dyn DeviceClient>,
        ports: Arc<dyn PortDeallocator>,
        fabric: Arc<dyn FabricCleaner>,
        adapter: ServiceAdapter,
        config: ManagerConfig,
    ) -> Self {
        let shutdown = Shutdown::never();
        Self {
            catalog: ResourceCatalog::new(device.clone()),
            deleter: RetryingDeleter::new(device.clone(), config.retry, shutdown.clone()),
            device,
            ports,
            fabric,
            adapter,
            config,
            shutdown,
        }
    }

    /// Abort teardown at the next phase or retry boundary once `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.deleter = RetryingDeleter::new(self.device.clone(), self.config.retry, shutdown.clone());
        self.shutdown = shutdown;
        self
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Traffic group for a service: its pinned group or the configured default.
    pub fn traffic_group_for(&self, service: &TenantService) -> String {
        let name = service
            .traffic_group
            .as_deref()
            .unwrap_or(&self.config.default_traffic_group);
        qualify_traffic_group(name)
    }

    /// Make sure the tenant partition exists on every appliance of the service.
    ///
    /// Stops at the first appliance that fails. Nothing is retried here; the
    /// caller re-invokes, and appliances that already have the partition are
    /// skipped.
    pub async fn assure_created(&self, service: &TenantService) -> Result<Provisioned> {
        if service.appliances.is_empty() {
            return Err(TenantError::NoAppliances {
                tenant_id: service.tenant_id.clone(),
            });
        }

        let partition = self.adapter.folder_name_for(&service.tenant_id);
        let traffic_group = self.traffic_group_for(service);
        let mut created = Vec::new();

        debug!("Creating tenant folder {}", partition);
        for appliance in &service.appliances {
            let provisioning = |source: DeviceError| TenantError::Provisioning {
                tenant_id: service.tenant_id.clone(),
                appliance: appliance.hostname.clone(),
                source,
            };

            let exists = self
                .device
                .exists(appliance, ResourceKind::Folder, &partition)
                .await
                .map_err(provisioning)?;
            if exists {
                debug!("Folder {} already exists on {}", partition, appliance);
                continue;
            }

            let folder = self.adapter.folder_descriptor(service, &traffic_group);
            if let Err(e) = self
                .device
                .create(appliance, ResourceKind::Folder, folder)
                .await
            {
                error!(
                    "Error creating folder {} on {}: {}",
                    partition, appliance, e
                );
                return Err(provisioning(e));
            }

            info!(
                "Created folder {} on {} (traffic group {})",
                partition, appliance, traffic_group
            );
            created.push(appliance.hostname.clone());
        }

        Ok(Provisioned {
            partition,
            traffic_group,
            created,
        })
    }

    /// Tear the tenant partition down on every appliance of the service.
    ///
    /// An error means the teardown is incomplete. It is safe to call again
    /// later; if it keeps failing, manual intervention may be required.
    pub async fn assure_cleanup(
        &self,
        service: &TenantService,
        policy: CleanupPolicy,
    ) -> Result<CleanupReport> {
        let partition = self.adapter.folder_name_for(&service.tenant_id);
        let mut report = CleanupReport::default();

        match policy {
            CleanupPolicy::AbortOnFirstFailure => {
                for appliance in &service.appliances {
                    let outcome = self.cleanup_appliance(appliance, &partition).await?;
                    report.outcomes.push((appliance.hostname.clone(), outcome));
                }
            }
            CleanupPolicy::BestEffort { max_parallel } => {
                let partition = partition.as_str();
                let results: Vec<(String, Result<TeardownOutcome>)> =
                    stream::iter(&service.appliances)
                        .map(|appliance| async move {
                            let outcome = self.cleanup_appliance(appliance, partition).await;
                            (appliance.hostname.clone(), outcome)
                        })
                        .buffered(max_parallel.max(1))
                        .collect()
                        .await;

                let mut failures = Vec::new();
                for (hostname, result) in results {
                    match result {
                        Ok(outcome) => report.outcomes.push((hostname, outcome)),
                        Err(error) => {
                            warn!("Cleanup of {} on {} failed: {}", partition, hostname, error);
                            failures.push(ApplianceFailure {
                                appliance: hostname,
                                error,
                            });
                        }
                    }
                }
                if !failures.is_empty() {
                    return Err(TenantError::Incomplete { failures, report });
                }
            }
        }

        Ok(report)
    }

    /// Run the full teardown protocol against one appliance.
    async fn cleanup_appliance(
        &self,
        appliance: &Appliance,
        partition: &str,
    ) -> Result<TeardownOutcome> {
        let exists = self
            .device
            .exists(appliance, ResourceKind::Folder, partition)
            .await
            .map_err(|source| TenantError::Catalog {
                appliance: appliance.hostname.clone(),
                partition: partition.to_string(),
                kind: ResourceKind::Folder,
                source,
            })?;
        if !exists {
            debug!("Partition {} does not exist on {}", partition, appliance);
            return Ok(TeardownOutcome::Absent);
        }

        // Collected up front: route domains go last, after everything
        // referencing them has been removed.
        let domain_names = self.catalog.route_domain_names(appliance, partition).await?;

        if !self.catalog.is_empty(appliance, partition).await? {
            debug!(
                "Partition {} on {} still has virtual addresses or nodes",
                partition, appliance
            );
            return Ok(TeardownOutcome::NotEmpty);
        }

        self.checkpoint(appliance, partition)?;
        self.release_ports(appliance, partition).await;

        self.checkpoint(appliance, partition)?;
        self.delete_partition_resources(appliance, partition).await?;

        self.checkpoint(appliance, partition)?;
        info!("Deleting empty partition {} on {}", partition, appliance);
        self.delete_route_domains(appliance, partition, &domain_names)
            .await?;

        self.checkpoint(appliance, partition)?;
        self.delete_folder(appliance, partition).await?;

        info!("Partition {} removed from {}", partition, appliance);
        Ok(TeardownOutcome::Removed)
    }

    fn checkpoint(&self, appliance: &Appliance, partition: &str) -> Result<()> {
        if self.shutdown.is_requested() {
            warn!(
                "Shutdown requested, leaving partition {} on {} for the next pass",
                partition, appliance
            );
            return Err(TenantError::Cancelled {
                appliance: appliance.hostname.clone(),
                partition: partition.to_string(),
            });
        }
        Ok(())
    }

    /// Release externally allocated ports. Never fails: the device objects
    /// stay deletable whatever the bookkeeping says.
    async fn release_ports(&self, appliance: &Appliance, partition: &str) {
        for kind in ResourceKind::PORT_BOUND {
            let resources = match self.catalog.list(appliance, partition, kind).await {
                Ok(resources) => resources,
                Err(e) => {
                    debug!("Skipping port release for {}: {}", kind, e);
                    continue;
                }
            };

            for resource in resources {
                if let Err(e) = self.ports.deallocate(&resource.name).await {
                    debug!("Failed to delete port {}: {}", resource.name, e);
                }
            }
        }
    }

    /// Delete everything that may reference a route domain.
    async fn delete_partition_resources(&self, appliance: &Appliance, partition: &str) -> Result<()> {
        for kind in ResourceKind::TEARDOWN_ORDER {
            self.checkpoint(appliance, partition)?;

            for resource in self.catalog.list(appliance, partition, kind).await? {
                self.deleter.delete(appliance, &resource).await?;

                if let Some(tag) = resource.fabric_tag() {
                    self.fabric
                        .cleanup_network(&appliance.hostname, tag)
                        .await
                        .map_err(|source| {
                            error!(
                                "Fabric cleanup of tag {} for {} failed: {}",
                                tag, appliance, source
                            );
                            TenantError::FabricCleanup {
                                appliance: appliance.hostname.clone(),
                                tag,
                                source,
                            }
                        })?;
                }
            }
        }
        Ok(())
    }

    async fn delete_route_domains(
        &self,
        appliance: &Appliance,
        partition: &str,
        names: &[String],
    ) -> Result<()> {
        for name in names {
            let domain = ManagedResource::new(ResourceKind::RouteDomain, partition, name.as_str());
            match self.device.delete(appliance, &domain).await {
                Ok(()) => debug!("Deleted route domain {} on {}", name, appliance),
                Err(e) if e.is_not_found() => {}
                Err(source) => {
                    error!(
                        "Failed to delete route domain {} on {}: {}. Manual intervention might be required.",
                        name, appliance, source
                    );
                    return Err(TenantError::RouteDomain {
                        appliance: appliance.hostname.clone(),
                        partition: partition.to_string(),
                        name: name.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    async fn delete_folder(&self, appliance: &Appliance, partition: &str) -> Result<()> {
        let folder = ManagedResource::new(ResourceKind::Folder, partition, partition);
        match self.device.delete(appliance, &folder).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(source) => {
                error!(
                    "Folder deletion for partition {} on {} failed: {}. Manual cleanup might be required.",
                    partition, appliance, source
                );
                Err(TenantError::Folder {
                    appliance: appliance.hostname.clone(),
                    partition: partition.to_string(),
                    source,
                })
            }
        }
    }
}
