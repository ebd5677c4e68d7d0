//! Read-only directory backed by a Netbox inventory.
//!
//! Devices are eligible when their `Netconfig` custom field is set to
//! `Yes`. The OS family lives on the device type, in the `Netconfig_OS`
//! custom field, so every device needs a second lookup by device-type id.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::audit::AuditSink;
use crate::error::{ConfigError, DirectoryError, Result};
use crate::host::{DeviceType, DirectorySource, HostId, HostRecord, IosType};

/// Custom field flagging devices managed by netconfig.
pub const ELIGIBILITY_FIELD: &str = "Netconfig";

/// Custom field on device types holding the OS label.
pub const OS_FIELD: &str = "Netconfig_OS";

const ELIGIBLE_LABEL: &str = "Yes";

const DEVICES_PATH: &str = "/api/dcim/devices/";
const DEVICE_TYPES_PATH: &str = "/api/dcim/device-types/";

#[derive(Debug, Deserialize)]
struct DeviceList {
    results: Vec<NetboxDevice>,
}

/// The parts of a Netbox device netconfig reads.
#[derive(Debug, Clone, Deserialize)]
pub struct NetboxDevice {
    pub id: u64,
    pub name: Option<String>,
    pub device_type: Option<NestedId>,
    /// Netbox < 3.6.
    pub device_role: Option<NestedName>,
    pub role: Option<NestedName>,
    pub primary_ip4: Option<NestedAddress>,
    pub primary_ip: Option<NestedAddress>,
    pub custom_fields: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedId {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedName {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedAddress {
    /// CIDR notation, e.g. `10.0.0.1/24`.
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetboxDeviceType {
    pub id: u64,
    pub custom_fields: Option<Map<String, Value>>,
}

impl NetboxDevice {
    fn custom_field(&self, name: &str) -> Option<&Value> {
        self.custom_fields.as_ref()?.get(name)
    }

    /// Whether the eligibility field is set. Accepts a selection field
    /// (`{"label": "Yes"}`), a text field, or a boolean.
    pub fn is_managed(&self) -> bool {
        match self.custom_field(ELIGIBILITY_FIELD) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text == ELIGIBLE_LABEL,
            Some(Value::Object(choice)) => {
                choice.get("label").and_then(Value::as_str) == Some(ELIGIBLE_LABEL)
            }
            _ => false,
        }
    }

    /// Primary IPv4 address without the prefix length.
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        let cidr = &self.primary_ip4.as_ref().or(self.primary_ip.as_ref())?.address;
        cidr.split('/').next()?.trim().parse().ok()
    }

    /// Device type from the role name, when it is one netconfig knows.
    pub fn role_device_type(&self) -> Option<DeviceType> {
        let role = self.role.as_ref().or(self.device_role.as_ref())?;
        role.name.parse().ok()
    }
}

impl NetboxDeviceType {
    /// OS label from a selection or text custom field.
    pub fn os_label(&self) -> Option<&str> {
        match self.custom_fields.as_ref()?.get(OS_FIELD)? {
            Value::String(label) => Some(label),
            Value::Object(choice) => choice.get("label").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// HTTP client for the Netbox REST API.
#[derive(Debug, Clone)]
pub struct NetboxClient {
    http: reqwest::Client,
    base_url: String,
}

/// Builder for [`NetboxClient`].
pub struct NetboxClientBuilder {
    base_url: String,
    timeout: Duration,
    token: Option<SecretString>,
}

impl NetboxClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API token, sent as `Authorization: Token <token>`.
    pub fn token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn build(self) -> Result<NetboxClient> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
                .map_err(|_| ConfigError::Invalid {
                    message: "Netbox token contains invalid characters".to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(NetboxClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl NetboxClient {
    pub fn builder(base_url: impl Into<String>) -> NetboxClientBuilder {
        NetboxClientBuilder {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn unavailable(&self, reason: impl Into<String>) -> DirectoryError {
        DirectoryError::Unavailable {
            url: self.base_url.clone(),
            reason: reason.into(),
        }
    }

    /// GET `path`. `Ok(None)` on 404; any other non-success status and
    /// every transport failure is `Unavailable`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> std::result::Result<Option<T>, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.unavailable(format!("GET {path} returned {status}")));
        }
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| self.unavailable(format!("GET {path}: invalid body: {e}")))
    }

    /// Every device, unpaginated.
    pub async fn devices(&self) -> std::result::Result<Vec<NetboxDevice>, DirectoryError> {
        let path = format!("{DEVICES_PATH}?limit=0");
        match self.fetch::<DeviceList>(&path).await? {
            Some(list) => Ok(list.results),
            None => Err(self.unavailable(format!("GET {path} returned 404"))),
        }
    }

    pub async fn device(&self, id: u64) -> std::result::Result<Option<NetboxDevice>, DirectoryError> {
        self.fetch(&format!("{DEVICES_PATH}{id}")).await
    }

    pub async fn device_type(
        &self,
        id: u64,
    ) -> std::result::Result<Option<NetboxDeviceType>, DirectoryError> {
        self.fetch(&format!("{DEVICE_TYPES_PATH}{id}")).await
    }
}

/// Remote directory. Writes are refused.
#[derive(Clone)]
pub struct NetboxDirectory {
    client: NetboxClient,
    audit: Arc<dyn AuditSink>,
}

impl NetboxDirectory {
    pub fn new(client: NetboxClient, audit: Arc<dyn AuditSink>) -> Self {
        Self { client, audit }
    }

    pub fn client(&self) -> &NetboxClient {
        &self.client
    }

    fn note_failure(&self, err: &DirectoryError) {
        if matches!(err, DirectoryError::Unavailable { .. }) {
            warn!("{}", err);
            self.audit.record(
                &format!("Connection error trying to connect to {}", self.client.base_url()),
                None,
            );
        }
    }

    /// Look up one device by id, managed or not.
    pub async fn get(&self, id: HostId) -> Result<HostRecord> {
        let device = match self.client.device(id.0).await {
            Ok(Some(device)) => device,
            Ok(None) => return Err(DirectoryError::NotFound { id }.into()),
            Err(e) => {
                self.note_failure(&e);
                return Err(e.into());
            }
        };
        let mut os_cache = HashMap::new();
        self.to_record(&device, &mut os_cache).await
    }

    /// Managed devices. Devices without a usable name or primary IPv4
    /// address are skipped.
    pub async fn list(&self) -> Result<Vec<HostRecord>> {
        let devices = self.client.devices().await.inspect_err(|e| self.note_failure(e))?;

        let mut os_cache = HashMap::new();
        let mut hosts = Vec::new();
        for device in devices.iter().filter(|d| d.is_managed()) {
            match self.to_record(device, &mut os_cache).await {
                Ok(host) => hosts.push(host),
                Err(e) => warn!("skipping Netbox device {}: {}", device.id, e),
            }
        }
        hosts.sort_by_key(|h| h.hostname.to_lowercase());
        Ok(hosts)
    }

    /// OS key of a device type. Every failure resolves to `Unknown`.
    pub async fn resolve_os_type(&self, device_type_id: u64) -> IosType {
        match self.client.device_type(device_type_id).await {
            Ok(Some(device_type)) => device_type
                .os_label()
                .map(IosType::from_inventory_label)
                .unwrap_or(IosType::Unknown),
            Ok(None) => IosType::Unknown,
            Err(e) => {
                self.note_failure(&e);
                IosType::Unknown
            }
        }
    }

    async fn to_record(
        &self,
        device: &NetboxDevice,
        os_cache: &mut HashMap<u64, IosType>,
    ) -> Result<HostRecord> {
        let id = HostId(device.id);
        let hostname = device
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(DirectoryError::IncompleteRecord { id, field: "name" })?;
        let ipv4_addr = device
            .primary_ipv4()
            .ok_or(DirectoryError::IncompleteRecord {
                id,
                field: "primary IPv4 address",
            })?;

        let ios_type = match &device.device_type {
            Some(device_type) => match os_cache.get(&device_type.id) {
                Some(ios_type) => *ios_type,
                None => {
                    let ios_type = self.resolve_os_type(device_type.id).await;
                    os_cache.insert(device_type.id, ios_type);
                    ios_type
                }
            },
            None => IosType::Unknown,
        };

        Ok(HostRecord {
            id,
            hostname: hostname.to_string(),
            ipv4_addr,
            device_type: device.role_device_type(),
            ios_type,
            local_creds: false,
            source: DirectorySource::Netbox,
        })
    }
}
