//! Shared fakes for mvirt-tenant integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mvirt_tenant::clients::{DeviceClient, FabricCleaner, PortDeallocator};
use mvirt_tenant::{
    Appliance, CallbackError, DeviceError, ManagedResource, ManagerConfig, ResourceKind,
    RetryPolicy, ServiceAdapter, TenantManager,
};
use serde_json::Value;

/// Every externally visible call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exists {
        host: String,
        kind: ResourceKind,
        name: String,
    },
    Create {
        host: String,
        kind: ResourceKind,
        payload: Value,
    },
    List {
        host: String,
        kind: ResourceKind,
        partition: String,
    },
    Delete {
        host: String,
        kind: ResourceKind,
        name: String,
    },
    Deallocate {
        port: String,
    },
    FabricCleanup {
        host: String,
        tag: u16,
    },
}

impl Call {
    /// Calls that change state on an appliance or an external service.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::Exists { .. } | Call::List { .. })
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            Call::Exists { host, .. }
            | Call::Create { host, .. }
            | Call::List { host, .. }
            | Call::Delete { host, .. }
            | Call::FabricCleanup { host, .. } => Some(host),
            Call::Deallocate { .. } => None,
        }
    }
}

pub type Journal = Arc<Mutex<Vec<Call>>>;

pub fn delete(host: &str, kind: ResourceKind, name: &str) -> Call {
    Call::Delete {
        host: host.to_string(),
        kind,
        name: name.to_string(),
    }
}

#[derive(Default)]
struct ApplianceState {
    folders: HashSet<String>,
    resources: Vec<ManagedResource>,
}

#[derive(Default)]
struct Faults {
    delete: HashMap<(String, ResourceKind, String), VecDeque<DeviceError>>,
    list: HashMap<(String, ResourceKind), DeviceError>,
    create: HashMap<String, DeviceError>,
}

/// In-memory appliance fleet.
pub struct FakeDevice {
    journal: Journal,
    state: Mutex<HashMap<String, ApplianceState>>,
    faults: Mutex<Faults>,
}

impl FakeDevice {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            state: Mutex::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
        })
    }

    pub fn add_folder(&self, host: &str, partition: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .entry(host.to_string())
            .or_default()
            .folders
            .insert(partition.to_string());
    }

    pub fn add(&self, host: &str, resource: ManagedResource) {
        let mut state = self.state.lock().unwrap();
        state
            .entry(host.to_string())
            .or_default()
            .resources
            .push(resource);
    }

    pub fn has_folder(&self, host: &str, partition: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .get(host)
            .is_some_and(|s| s.folders.contains(partition))
    }

    pub fn resources(&self, host: &str) -> Vec<ManagedResource> {
        let state = self.state.lock().unwrap();
        state
            .get(host)
            .map(|s| s.resources.clone())
            .unwrap_or_default()
    }

    /// Fail the next deletes of one object with the given errors, in order.
    pub fn fail_delete(&self, host: &str, kind: ResourceKind, name: &str, errors: Vec<DeviceError>) {
        let mut faults = self.faults.lock().unwrap();
        faults
            .delete
            .insert((host.to_string(), kind, name.to_string()), errors.into());
    }

    pub fn fail_list(&self, host: &str, kind: ResourceKind, error: DeviceError) {
        let mut faults = self.faults.lock().unwrap();
        faults.list.insert((host.to_string(), kind), error);
    }

    pub fn fail_create(&self, host: &str, error: DeviceError) {
        let mut faults = self.faults.lock().unwrap();
        faults.create.insert(host.to_string(), error);
    }

    pub fn clear_faults(&self) {
        *self.faults.lock().unwrap() = Faults::default();
    }

    fn record(&self, call: Call) {
        self.journal.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DeviceClient for FakeDevice {
    async fn exists(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        name: &str,
    ) -> Result<bool, DeviceError> {
        self.record(Call::Exists {
            host: appliance.hostname.clone(),
            kind,
            name: name.to_string(),
        });

        let state = self.state.lock().unwrap();
        let Some(s) = state.get(&appliance.hostname) else {
            return Ok(false);
        };
        Ok(match kind {
            ResourceKind::Folder => s.folders.contains(name),
            _ => s
                .resources
                .iter()
                .any(|r| r.kind == kind && format!("{}~{}", r.partition, r.name) == name),
        })
    }

    async fn create(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        payload: Value,
    ) -> Result<ManagedResource, DeviceError> {
        self.record(Call::Create {
            host: appliance.hostname.clone(),
            kind,
            payload: payload.clone(),
        });

        if let Some(e) = self.faults.lock().unwrap().create.get(&appliance.hostname) {
            return Err(e.clone());
        }

        let name = payload["name"].as_str().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        let s = state.entry(appliance.hostname.clone()).or_default();
        if kind == ResourceKind::Folder {
            s.folders.insert(name.clone());
            return Ok(ManagedResource::new(kind, name.clone(), name));
        }

        let partition = payload["partition"].as_str().unwrap_or_default();
        let resource = ManagedResource::new(kind, partition, name);
        s.resources.push(resource.clone());
        Ok(resource)
    }

    async fn list(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        partition: &str,
    ) -> Result<Vec<ManagedResource>, DeviceError> {
        self.record(Call::List {
            host: appliance.hostname.clone(),
            kind,
            partition: partition.to_string(),
        });

        let faults = self.faults.lock().unwrap();
        if let Some(e) = faults.list.get(&(appliance.hostname.clone(), kind)) {
            return Err(e.clone());
        }

        let state = self.state.lock().unwrap();
        Ok(state
            .get(&appliance.hostname)
            .map(|s| {
                s.resources
                    .iter()
                    .filter(|r| r.kind == kind && r.partition == partition)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(
        &self,
        appliance: &Appliance,
        resource: &ManagedResource,
    ) -> Result<(), DeviceError> {
        self.record(delete(&appliance.hostname, resource.kind, &resource.name));

        let key = (
            appliance.hostname.clone(),
            resource.kind,
            resource.name.clone(),
        );
        if let Some(e) = self
            .faults
            .lock()
            .unwrap()
            .delete
            .get_mut(&key)
            .and_then(|q| q.pop_front())
        {
            return Err(e);
        }

        let not_found = DeviceError::NotFound {
            appliance: appliance.hostname.clone(),
            kind: resource.kind,
            name: resource.name.clone(),
        };
        let mut state = self.state.lock().unwrap();
        let Some(s) = state.get_mut(&appliance.hostname) else {
            return Err(not_found);
        };

        if resource.kind == ResourceKind::Folder {
            return if s.folders.remove(&resource.name) {
                Ok(())
            } else {
                Err(not_found)
            };
        }

        let before = s.resources.len();
        s.resources.retain(|r| {
            !(r.kind == resource.kind
                && r.partition == resource.partition
                && r.name == resource.name)
        });
        if s.resources.len() == before {
            return Err(not_found);
        }
        Ok(())
    }
}

/// Port deallocator recording into the shared journal.
pub struct RecordingPorts {
    journal: Journal,
    failing: Mutex<HashSet<String>>,
}

impl RecordingPorts {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            failing: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail(&self, port: &str) {
        self.failing.lock().unwrap().insert(port.to_string());
    }
}

#[async_trait]
impl PortDeallocator for RecordingPorts {
    async fn deallocate(&self, port_name: &str) -> Result<(), CallbackError> {
        self.journal.lock().unwrap().push(Call::Deallocate {
            port: port_name.to_string(),
        });
        if self.failing.lock().unwrap().contains(port_name) {
            return Err(CallbackError::new(format!("port {} not found", port_name)));
        }
        Ok(())
    }
}

/// Fabric cleaner recording into the shared journal.
pub struct RecordingFabric {
    journal: Journal,
    failing: Mutex<HashSet<u16>>,
}

impl RecordingFabric {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            failing: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail(&self, tag: u16) {
        self.failing.lock().unwrap().insert(tag);
    }
}

#[async_trait]
impl FabricCleaner for RecordingFabric {
    async fn cleanup_network(&self, hostname: &str, tag: u16) -> Result<(), CallbackError> {
        self.journal.lock().unwrap().push(Call::FabricCleanup {
            host: hostname.to_string(),
            tag,
        });
        if self.failing.lock().unwrap().contains(&tag) {
            return Err(CallbackError::new("fabric controller unavailable"));
        }
        Ok(())
    }
}

/// A manager wired to fakes. Partitions are named after the bare tenant id.
pub struct Harness {
    pub journal: Journal,
    pub device: Arc<FakeDevice>,
    pub ports: Arc<RecordingPorts>,
    pub fabric: Arc<RecordingFabric>,
    pub manager: TenantManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                interval: Duration::from_millis(10),
            },
            ..ManagerConfig::default()
        })
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let device = FakeDevice::new(journal.clone());
        let ports = RecordingPorts::new(journal.clone());
        let fabric = RecordingFabric::new(journal.clone());
        let manager = TenantManager::new(
            device.clone(),
            ports.clone(),
            fabric.clone(),
            ServiceAdapter::new(""),
            config,
        );
        Self {
            journal,
            device,
            ports,
            fabric,
            manager,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn reset_journal(&self) {
        self.journal.lock().unwrap().clear();
    }
}
