//! Host directory: local store or Netbox inventory behind one interface.
//!
//! Callers never branch on the source. Remote-only details (nested JSON,
//! custom-field indirection, CIDR addresses) stay in [`netbox`]; the local
//! store owns uniqueness and ids.

mod local;
pub mod netbox;
mod store;

pub use local::LocalDirectory;
pub use netbox::{NetboxClient, NetboxDirectory};
pub use store::{HostStore, MemoryStore, RowResult};

use std::net::Ipv4Addr;

use crate::device::DeviceHandler;
use crate::error::{DirectoryError, Result};
use crate::host::{DirectorySource, HostId, HostPatch, HostRecord, IosType, NewHost};
use crate::import::{ImportOptions, ImportOutcome};

/// The configured host directory.
#[derive(Clone)]
pub enum HostDirectory {
    Local(LocalDirectory),
    Netbox(NetboxDirectory),
}

impl HostDirectory {
    pub fn source(&self) -> DirectorySource {
        match self {
            HostDirectory::Local(_) => DirectorySource::Local,
            HostDirectory::Netbox(_) => DirectorySource::Netbox,
        }
    }

    fn read_only(&self, operation: &'static str) -> DirectoryError {
        DirectoryError::UnsupportedOperation {
            operation,
            directory: self.source().as_str(),
        }
    }

    pub async fn get(&self, id: HostId) -> Result<HostRecord> {
        match self {
            HostDirectory::Local(local) => local.get(id),
            HostDirectory::Netbox(netbox) => netbox.get(id).await,
        }
    }

    /// Local: every host by hostname. Netbox: managed devices only.
    pub async fn list(&self) -> Result<Vec<HostRecord>> {
        match self {
            HostDirectory::Local(local) => local.list(),
            HostDirectory::Netbox(netbox) => netbox.list().await,
        }
    }

    /// Resolve a raw OS identifier: an OS name for the local source, a
    /// device-type id for Netbox. Never fails; unresolvable is `Unknown`.
    pub async fn resolve_os_type(&self, raw: &str) -> IosType {
        match self {
            HostDirectory::Local(local) => local.resolve_os_type(raw),
            HostDirectory::Netbox(netbox) => match raw.trim().parse::<u64>() {
                Ok(device_type_id) => netbox.resolve_os_type(device_type_id).await,
                Err(_) => IosType::Unknown,
            },
        }
    }

    pub async fn find_by_hostname(&self, hostname: &str) -> Result<Option<HostRecord>> {
        match self {
            HostDirectory::Local(local) => local.find_by_hostname(hostname),
            HostDirectory::Netbox(netbox) => Ok(netbox
                .list()
                .await?
                .into_iter()
                .find(|h| h.hostname.eq_ignore_ascii_case(hostname.trim()))),
        }
    }

    pub async fn find_by_address(&self, addr: Ipv4Addr) -> Result<Option<HostRecord>> {
        match self {
            HostDirectory::Local(local) => local.find_by_address(addr),
            HostDirectory::Netbox(netbox) => Ok(netbox
                .list()
                .await?
                .into_iter()
                .find(|h| h.ipv4_addr == addr)),
        }
    }

    pub async fn list_by_ios_type(&self, ios_type: IosType) -> Result<Vec<HostRecord>> {
        match self {
            HostDirectory::Local(local) => local.list_by_ios_type(ios_type),
            HostDirectory::Netbox(netbox) => Ok(netbox
                .list()
                .await?
                .into_iter()
                .filter(|h| h.ios_type == ios_type)
                .collect()),
        }
    }

    pub fn add(&self, host: NewHost, actor: Option<&str>) -> Result<HostId> {
        match self {
            HostDirectory::Local(local) => local.add(host, actor),
            HostDirectory::Netbox(_) => Err(self.read_only("add").into()),
        }
    }

    pub fn edit(&self, id: HostId, patch: &HostPatch, actor: Option<&str>) -> Result<HostRecord> {
        match self {
            HostDirectory::Local(local) => local.edit(id, patch, actor),
            HostDirectory::Netbox(_) => Err(self.read_only("edit").into()),
        }
    }

    pub fn remove(&self, id: HostId, actor: Option<&str>) -> Result<()> {
        match self {
            HostDirectory::Local(local) => local.remove(id, actor),
            HostDirectory::Netbox(_) => Err(self.read_only("remove").into()),
        }
    }

    pub fn import_batch(
        &self,
        input: &str,
        options: ImportOptions,
        actor: Option<&str>,
    ) -> Result<ImportOutcome> {
        match self {
            HostDirectory::Local(local) => local.import_batch(input, options, actor),
            HostDirectory::Netbox(_) => Err(self.read_only("import").into()),
        }
    }

    /// Fetch a host and bind it to its command set.
    pub async fn handler(&self, id: HostId) -> Result<DeviceHandler> {
        DeviceHandler::new(self.get(id).await?)
    }
}
