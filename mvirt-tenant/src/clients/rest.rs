//! REST client for the appliance configuration API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::DeviceClient;
use crate::error::DeviceError;
use crate::resource::{Appliance, ManagedResource, ResourceKind};

/// Collection path of a resource kind below `/mgmt/tm/`.
fn collection(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Folder => "sys/folder",
        ResourceKind::VirtualAddress => "ltm/virtual-address",
        ResourceKind::Node => "ltm/node",
        ResourceKind::Snat => "ltm/snat",
        ResourceKind::SnatPool => "ltm/snatpool",
        ResourceKind::SnatTranslation => "ltm/snat-translation",
        ResourceKind::SelfIp => "net/self",
        ResourceKind::Vlan => "net/vlan",
        ResourceKind::RouteDomain => "net/route-domain",
    }
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    #[serde(default)]
    partition: Option<String>,
    #[serde(default)]
    tag: Option<u16>,
}

/// Client for the appliance REST API using basic authentication.
#[derive(Clone)]
pub struct RestDeviceClient {
    http: Client,
    scheme: String,
    username: String,
    password: String,
}

impl RestDeviceClient {
    pub fn new(http: Client, scheme: &str, username: &str, password: &str) -> Self {
        Self {
            http,
            scheme: scheme.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn base_url(&self, appliance: &Appliance) -> String {
        format!("{}://{}/mgmt/tm", self.scheme, appliance.hostname)
    }

    fn collection_url(&self, appliance: &Appliance, kind: ResourceKind) -> String {
        format!("{}/{}", self.base_url(appliance), collection(kind))
    }

    /// Object URL. Folders are addressed by name, everything else by partition and name.
    fn object_url(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        partition: &str,
        name: &str,
    ) -> String {
        let collection = self.collection_url(appliance, kind);
        match kind {
            ResourceKind::Folder => format!("{}/~{}", collection, name),
            _ => format!("{}/~{}~{}", collection, partition, name),
        }
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    async fn send(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        name: &str,
        request: RequestBuilder,
    ) -> Result<Response, DeviceError> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| DeviceError::Other {
                appliance: appliance.hostname.clone(),
                message: e.to_string(),
            })?;

        classify(appliance, kind, name, response).await
    }
}

/// Map an HTTP response onto the device error classes.
async fn classify(
    appliance: &Appliance,
    kind: ResourceKind,
    name: &str,
    response: Response,
) -> Result<Response, DeviceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => Err(DeviceError::AuthExpired {
            appliance: appliance.hostname.clone(),
            message: body,
        }),
        StatusCode::NOT_FOUND => Err(DeviceError::NotFound {
            appliance: appliance.hostname.clone(),
            kind,
            name: name.to_string(),
        }),
        _ => Err(DeviceError::Other {
            appliance: appliance.hostname.clone(),
            message: format!("{} {}: {}", kind, status, body),
        }),
    }
}

fn decode_error(appliance: &Appliance, e: reqwest::Error) -> DeviceError {
    DeviceError::Other {
        appliance: appliance.hostname.clone(),
        message: format!("invalid response body: {}", e),
    }
}

#[async_trait]
impl DeviceClient for RestDeviceClient {
    async fn exists(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        name: &str,
    ) -> Result<bool, DeviceError> {
        let url = format!("{}/~{}", self.collection_url(appliance, kind), name);
        debug!("GET {}", url);
        match self.send(appliance, kind, name, self.http.get(&url)).await {
            Ok(_) => Ok(true),
            Err(DeviceError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        payload: Value,
    ) -> Result<ManagedResource, DeviceError> {
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let url = self.collection_url(appliance, kind);
        debug!("POST {} ({})", url, name);

        let response = self
            .send(appliance, kind, &name, self.http.post(&url).json(&payload))
            .await?;
        let item: Item = response
            .json()
            .await
            .map_err(|e| decode_error(appliance, e))?;

        let partition = item.partition.unwrap_or_else(|| item.name.clone());
        Ok(ManagedResource {
            kind,
            name: item.name,
            partition,
            tag: item.tag,
        })
    }

    async fn list(
        &self,
        appliance: &Appliance,
        kind: ResourceKind,
        partition: &str,
    ) -> Result<Vec<ManagedResource>, DeviceError> {
        let url = self.collection_url(appliance, kind);
        let filter = format!("partition eq {}", partition);
        debug!("GET {} ({})", url, filter);

        let request = self.http.get(&url).query(&[("$filter", filter.as_str())]);
        let response = self.send(appliance, kind, partition, request).await?;
        let collection: Collection = response
            .json()
            .await
            .map_err(|e| decode_error(appliance, e))?;

        Ok(collection
            .items
            .into_iter()
            .map(|item| ManagedResource {
                kind,
                name: item.name,
                partition: item.partition.unwrap_or_else(|| partition.to_string()),
                tag: item.tag,
            })
            .collect())
    }

    async fn delete(
        &self,
        appliance: &Appliance,
        resource: &ManagedResource,
    ) -> Result<(), DeviceError> {
        let url = self.object_url(appliance, resource.kind, &resource.partition, &resource.name);
        debug!("DELETE {}", url);
        self.send(
            appliance,
            resource.kind,
            &resource.name,
            self.http.delete(&url),
        )
        .await?;
        Ok(())
    }
}
