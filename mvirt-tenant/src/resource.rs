//! Appliance, tenant and partition resource types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Typed objects that can live inside a tenant partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// The partition folder itself.
    Folder,
    VirtualAddress,
    Node,
    Snat,
    #[serde(rename = "snatpool")]
    SnatPool,
    SnatTranslation,
    SelfIp,
    /// Network tap. Carries a fabric tag.
    Vlan,
    RouteDomain,
}

impl ResourceKind {
    /// Resources carrying live traffic. Their presence blocks teardown.
    pub const LOAD_BEARING: [ResourceKind; 2] = [ResourceKind::VirtualAddress, ResourceKind::Node];

    /// Resources backed by an externally allocated port.
    pub const PORT_BOUND: [ResourceKind; 2] = [ResourceKind::SnatTranslation, ResourceKind::SelfIp];

    /// Deletion order for the required teardown phase. Everything here may
    /// reference a route domain, so all of it goes before route domains.
    pub const TEARDOWN_ORDER: [ResourceKind; 5] = [
        ResourceKind::Snat,
        ResourceKind::SnatPool,
        ResourceKind::SnatTranslation,
        ResourceKind::SelfIp,
        ResourceKind::Vlan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Folder => "folder",
            ResourceKind::VirtualAddress => "virtual-address",
            ResourceKind::Node => "node",
            ResourceKind::Snat => "snat",
            ResourceKind::SnatPool => "snatpool",
            ResourceKind::SnatTranslation => "snat-translation",
            ResourceKind::SelfIp => "self-ip",
            ResourceKind::Vlan => "vlan",
            ResourceKind::RouteDomain => "route-domain",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote appliance exposing the device configuration API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Appliance {
    pub hostname: String,
}

impl Appliance {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hostname)
    }
}

/// A typed object living inside a partition on one appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub partition: String,
    /// VLAN tag, only set for [`ResourceKind::Vlan`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<u16>,
}

impl ManagedResource {
    pub fn new(kind: ResourceKind, partition: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            partition: partition.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: u16) -> Self {
        self.tag = Some(tag);
        self
    }

    /// The tag requiring fabric cleanup, if any. Zero means untagged.
    pub fn fabric_tag(&self) -> Option<u16> {
        match (self.kind, self.tag) {
            (ResourceKind::Vlan, Some(tag)) if tag != 0 => Some(tag),
            _ => None,
        }
    }
}

/// Tenant service descriptor handed in by the service layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantService {
    pub tenant_id: String,
    /// Traffic group pinned by the caller. The manager default is used when unset.
    #[serde(default)]
    pub traffic_group: Option<String>,
    pub appliances: Vec<Appliance>,
}

impl TenantService {
    pub fn new(tenant_id: impl Into<String>, appliances: Vec<Appliance>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            traffic_group: None,
            appliances,
        }
    }
}
