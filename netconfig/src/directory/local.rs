//! Authoritative local directory.

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::debug;

use super::store::HostStore;
use crate::audit::AuditSink;
use crate::error::{DirectoryError, Result};
use crate::host::{HostId, HostPatch, HostRecord, IosType, NewHost};
use crate::import::{self, ImportOptions, ImportOutcome};

/// Local directory: a [`HostStore`] plus the audit trail for its writes.
#[derive(Clone)]
pub struct LocalDirectory {
    store: Arc<dyn HostStore>,
    audit: Arc<dyn AuditSink>,
}

impl LocalDirectory {
    pub fn new(store: Arc<dyn HostStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &dyn HostStore {
        self.store.as_ref()
    }

    pub fn get(&self, id: HostId) -> Result<HostRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| DirectoryError::NotFound { id }.into())
    }

    pub fn list(&self) -> Result<Vec<HostRecord>> {
        self.store.list()
    }

    pub fn find_by_hostname(&self, hostname: &str) -> Result<Option<HostRecord>> {
        self.store.find_by_hostname(hostname)
    }

    pub fn find_by_address(&self, addr: Ipv4Addr) -> Result<Option<HostRecord>> {
        self.store.find_by_address(addr)
    }

    pub fn list_by_ios_type(&self, ios_type: IosType) -> Result<Vec<HostRecord>> {
        self.store.list_by_ios_type(ios_type)
    }

    /// Map an OS name (`ios`, `ios-xe`, `nx-os`, `asa`) to its key.
    pub fn resolve_os_type(&self, os_name: &str) -> IosType {
        IosType::from_os_name(os_name)
    }

    /// Insert a host and return its id.
    pub fn add(&self, host: NewHost, actor: Option<&str>) -> Result<HostId> {
        let hostname = host.hostname.trim().to_string();
        match self.store.insert(host) {
            Ok(record) => {
                self.audit.record(
                    &format!("Added new host {} to database", record.hostname),
                    actor,
                );
                Ok(record.id)
            }
            Err(e) => {
                self.audit.record(
                    &format!("Unable to add host {} to database: {}", hostname, e),
                    actor,
                );
                Err(e)
            }
        }
    }

    /// Apply the fields present in `patch`.
    pub fn edit(&self, id: HostId, patch: &HostPatch, actor: Option<&str>) -> Result<HostRecord> {
        if patch.is_empty() {
            debug!("empty patch for host {}", id);
            return self.get(id);
        }
        let record = self.store.update(id, patch)?;
        self.audit.record(
            &format!("Edited host {} in database", record.hostname),
            actor,
        );
        Ok(record)
    }

    /// Delete a host. Success and failure are both audited.
    pub fn remove(&self, id: HostId, actor: Option<&str>) -> Result<()> {
        match self.store.delete(id) {
            Ok(record) => {
                self.audit.record(
                    &format!("Deleted host {} in database", record.hostname),
                    actor,
                );
                Ok(())
            }
            Err(e) => {
                self.audit
                    .record(&format!("Unable to delete host {} in database: {}", id, e), actor);
                Err(e)
            }
        }
    }

    /// Validate and insert rows of `hostname,address,type,os[,local_creds]`.
    pub fn import_batch(
        &self,
        input: &str,
        options: ImportOptions,
        actor: Option<&str>,
    ) -> Result<ImportOutcome> {
        let outcome = import::import_batch(self.store.as_ref(), input, options)?;
        self.audit.record(&outcome.summary(), actor);
        Ok(outcome)
    }
}
