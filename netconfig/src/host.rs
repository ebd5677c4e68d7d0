//! Canonical host records shared by every directory source.
//!
//! A [`HostRecord`] is what the directory hands to the device layer: the
//! same shape whether it came from the local store or the remote inventory.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Opaque host identifier, assigned by the owning directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub u64);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(HostId)
    }
}

/// Kind of network device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Switch,
    Router,
    Firewall,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Switch => "Switch",
            DeviceType::Router => "Router",
            DeviceType::Firewall => "Firewall",
        }
    }
}

impl FromStr for DeviceType {
    type Err = ValidationError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "switch" => Ok(DeviceType::Switch),
            "router" => Ok(DeviceType::Router),
            "firewall" => Ok(DeviceType::Firewall),
            _ => Err(ValidationError::InvalidDeviceType),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS family of a device. Selects the command set and output normalizer.
///
/// `Unknown` is an explicit outcome of failed resolution; it is never
/// accepted for storage in the local directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IosType {
    CiscoIos,
    CiscoXe,
    CiscoNxos,
    CiscoAsa,
    Unknown,
}

impl IosType {
    /// All families that have a command set.
    pub const KNOWN: [IosType; 4] = [
        IosType::CiscoIos,
        IosType::CiscoXe,
        IosType::CiscoNxos,
        IosType::CiscoAsa,
    ];

    /// Canonical key, also the command set registry name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IosType::CiscoIos => "cisco_ios",
            IosType::CiscoXe => "cisco_xe",
            IosType::CiscoNxos => "cisco_nxos",
            IosType::CiscoAsa => "cisco_asa",
            IosType::Unknown => "unknown",
        }
    }

    /// Map a user-facing OS name (`ios`, `ios-xe`, `nx-os`, `asa`, any case)
    /// to its key. Anything else is `Unknown`.
    pub fn from_os_name(name: &str) -> IosType {
        match name.trim().to_ascii_lowercase().as_str() {
            "ios" => IosType::CiscoIos,
            "ios-xe" => IosType::CiscoXe,
            "nx-os" => IosType::CiscoNxos,
            "asa" => IosType::CiscoAsa,
            _ => IosType::Unknown,
        }
    }

    /// Map an inventory OS label. Labels are matched exactly
    /// (`IOS`, `IOS-XE`, `NX-OS`, `ASA`).
    pub fn from_inventory_label(label: &str) -> IosType {
        match label.trim() {
            "IOS" => IosType::CiscoIos,
            "IOS-XE" => IosType::CiscoXe,
            "NX-OS" => IosType::CiscoNxos,
            "ASA" => IosType::CiscoAsa,
            _ => IosType::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != IosType::Unknown
    }
}

impl FromStr for IosType {
    type Err = ValidationError;

    /// Accepts canonical keys (`cisco_nxos`) as well as OS names (`nx-os`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if let Some(found) = IosType::KNOWN.iter().find(|t| t.as_str() == key) {
            return Ok(*found);
        }
        match IosType::from_os_name(&key) {
            IosType::Unknown => Err(ValidationError::InvalidOsType),
            known => Ok(known),
        }
    }
}

impl fmt::Display for IosType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySource {
    Local,
    Netbox,
}

impl DirectorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectorySource::Local => "local",
            DirectorySource::Netbox => "netbox",
        }
    }
}

impl fmt::Display for DirectorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical host record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: HostId,
    pub hostname: String,
    pub ipv4_addr: Ipv4Addr,
    /// `None` when the remote inventory does not classify the device.
    pub device_type: Option<DeviceType>,
    pub ios_type: IosType,
    /// Use device-specific stored credentials instead of the shared ones.
    pub local_creds: bool,
    pub source: DirectorySource,
}

/// A host that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHost {
    pub hostname: String,
    pub ipv4_addr: Ipv4Addr,
    pub device_type: DeviceType,
    pub ios_type: IosType,
    pub local_creds: bool,
}

impl NewHost {
    pub fn new(
        hostname: impl Into<String>,
        ipv4_addr: Ipv4Addr,
        device_type: DeviceType,
        ios_type: IosType,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            ipv4_addr,
            device_type,
            ios_type,
            local_creds: false,
        }
    }

    pub fn with_local_creds(mut self, local_creds: bool) -> Self {
        self.local_creds = local_creds;
        self
    }

    /// Checks that the record may be persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hostname.trim().is_empty() {
            return Err(ValidationError::EmptyHostname);
        }
        if !self.ios_type.is_known() {
            return Err(ValidationError::InvalidOsType);
        }
        Ok(())
    }

    pub(crate) fn into_record(self, id: HostId) -> HostRecord {
        HostRecord {
            id,
            hostname: self.hostname.trim().to_string(),
            ipv4_addr: self.ipv4_addr,
            device_type: Some(self.device_type),
            ios_type: self.ios_type,
            local_creds: self.local_creds,
            source: DirectorySource::Local,
        }
    }
}

/// Partial update for a local host. Only fields that are `Some` change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostPatch {
    pub hostname: Option<String>,
    pub ipv4_addr: Option<Ipv4Addr>,
    pub device_type: Option<DeviceType>,
    pub ios_type: Option<IosType>,
    pub local_creds: Option<bool>,
}

impl HostPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn ipv4_addr(mut self, addr: Ipv4Addr) -> Self {
        self.ipv4_addr = Some(addr);
        self
    }

    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    pub fn ios_type(mut self, ios_type: IosType) -> Self {
        self.ios_type = Some(ios_type);
        self
    }

    pub fn local_creds(mut self, local_creds: bool) -> Self {
        self.local_creds = Some(local_creds);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == HostPatch::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(hostname) = &self.hostname {
            if hostname.trim().is_empty() {
                return Err(ValidationError::EmptyHostname);
            }
        }
        if let Some(ios_type) = self.ios_type {
            if !ios_type.is_known() {
                return Err(ValidationError::InvalidOsType);
            }
        }
        Ok(())
    }

    /// Apply the present fields to `host`.
    pub fn apply_to(&self, host: &mut HostRecord) {
        if let Some(hostname) = &self.hostname {
            host.hostname = hostname.trim().to_string();
        }
        if let Some(addr) = self.ipv4_addr {
            host.ipv4_addr = addr;
        }
        if let Some(device_type) = self.device_type {
            host.device_type = Some(device_type);
        }
        if let Some(ios_type) = self.ios_type {
            host.ios_type = ios_type;
        }
        if let Some(local_creds) = self.local_creds {
            host.local_creds = local_creds;
        }
    }
}
