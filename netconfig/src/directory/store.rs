//! Local host storage.
//!
//! Uniqueness of hostname (case-insensitive) and address is checked under
//! the same write lock that applies the change, so concurrent writers
//! cannot both pass the check.

use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};
use crate::host::{HostId, HostPatch, HostRecord, IosType, NewHost};

/// Outcome of one row in [`HostStore::insert_batch`].
pub type RowResult = std::result::Result<HostRecord, DirectoryError>;

/// Backing store for the local directory.
pub trait HostStore: Send + Sync {
    fn get(&self, id: HostId) -> Result<Option<HostRecord>>;

    /// All hosts ordered by hostname, case-insensitively.
    fn list(&self) -> Result<Vec<HostRecord>>;

    /// Case-insensitive hostname lookup.
    fn find_by_hostname(&self, hostname: &str) -> Result<Option<HostRecord>>;

    fn find_by_address(&self, addr: Ipv4Addr) -> Result<Option<HostRecord>>;

    fn insert(&self, host: NewHost) -> Result<HostRecord>;

    /// Insert rows one by one and commit once. A row that fails is left
    /// out without affecting the others; if the commit fails nothing is
    /// applied and the error is returned.
    fn insert_batch(&self, hosts: Vec<NewHost>) -> Result<Vec<RowResult>>;

    /// Apply `patch`, keeping both uniqueness constraints.
    fn update(&self, id: HostId, patch: &HostPatch) -> Result<HostRecord>;

    /// Remove a host, returning the removed record.
    fn delete(&self, id: HostId) -> Result<HostRecord>;

    fn list_by_ios_type(&self, ios_type: IosType) -> Result<Vec<HostRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|host| host.ios_type == ios_type)
            .collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    last_id: u64,
    hosts: BTreeMap<HostId, HostRecord>,
}

impl StoreState {
    fn check_unique(
        &self,
        hostname: &str,
        addr: Ipv4Addr,
        skip: Option<HostId>,
    ) -> std::result::Result<(), DirectoryError> {
        for host in self.hosts.values().filter(|h| Some(h.id) != skip) {
            if host.hostname.eq_ignore_ascii_case(hostname.trim()) {
                return Err(DirectoryError::DuplicateHostname {
                    hostname: hostname.trim().to_string(),
                });
            }
            if host.ipv4_addr == addr {
                return Err(DirectoryError::DuplicateAddress { address: addr });
            }
        }
        Ok(())
    }

    fn insert(&mut self, host: NewHost) -> RowResult {
        host.validate()?;
        self.check_unique(&host.hostname, host.ipv4_addr, None)?;
        self.last_id += 1;
        let record = host.into_record(HostId(self.last_id));
        self.hosts.insert(record.id, record.clone());
        Ok(record)
    }
}

/// In-memory store with an optional JSON snapshot file.
///
/// With a snapshot, every write is serialized to disk before it becomes
/// visible; a failed write leaves the store unchanged.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    /// Empty store, nothing persisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a snapshot file, loaded if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| store_error(&path, e))?;
            serde_json::from_str(&text).map_err(|e| store_error(&path, e))?
        } else {
            StoreState::default()
        };
        debug!("host store {} holds {} hosts", path.display(), state.hosts.len());
        Ok(Self {
            state: RwLock::new(state),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(f(&state))
    }

    /// Apply `f` to a copy of the state, persist it, then publish it.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> std::result::Result<T, DirectoryError>,
    ) -> Result<T> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let mut next = state.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(out)
    }

    fn persist(&self, state: &StoreState) -> std::result::Result<(), DirectoryError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(state).map_err(|e| store_error(path, e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| store_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| store_error(path, e))?;
        Ok(())
    }
}

impl HostStore for MemoryStore {
    fn get(&self, id: HostId) -> Result<Option<HostRecord>> {
        self.read(|state| state.hosts.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<HostRecord>> {
        let mut hosts = self.read(|state| state.hosts.values().cloned().collect::<Vec<_>>())?;
        hosts.sort_by(|a, b| {
            a.hostname
                .to_lowercase()
                .cmp(&b.hostname.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(hosts)
    }

    fn find_by_hostname(&self, hostname: &str) -> Result<Option<HostRecord>> {
        let hostname = hostname.trim();
        self.read(|state| {
            state
                .hosts
                .values()
                .find(|h| h.hostname.eq_ignore_ascii_case(hostname))
                .cloned()
        })
    }

    fn find_by_address(&self, addr: Ipv4Addr) -> Result<Option<HostRecord>> {
        self.read(|state| state.hosts.values().find(|h| h.ipv4_addr == addr).cloned())
    }

    fn insert(&self, host: NewHost) -> Result<HostRecord> {
        self.write(|state| state.insert(host))
    }

    fn insert_batch(&self, hosts: Vec<NewHost>) -> Result<Vec<RowResult>> {
        self.write(|state| Ok(hosts.into_iter().map(|host| state.insert(host)).collect()))
    }

    fn update(&self, id: HostId, patch: &HostPatch) -> Result<HostRecord> {
        patch.validate().map_err(DirectoryError::from)?;
        self.write(|state| {
            let mut updated = state
                .hosts
                .get(&id)
                .cloned()
                .ok_or(DirectoryError::NotFound { id })?;
            patch.apply_to(&mut updated);
            state.check_unique(&updated.hostname, updated.ipv4_addr, Some(id))?;
            state.hosts.insert(id, updated.clone());
            Ok(updated)
        })
    }

    fn delete(&self, id: HostId) -> Result<HostRecord> {
        self.write(|state| state.hosts.remove(&id).ok_or(DirectoryError::NotFound { id }))
    }
}

fn poisoned() -> DirectoryError {
    DirectoryError::Store("host store lock poisoned".to_string())
}

fn store_error(path: &Path, err: impl std::fmt::Display) -> DirectoryError {
    DirectoryError::Store(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValidationError};
    use crate::host::DeviceType;

    fn new_host(hostname: &str, last_octet: u8) -> NewHost {
        NewHost::new(
            hostname,
            Ipv4Addr::new(10, 0, 0, last_octet),
            DeviceType::Switch,
            IosType::CiscoIos,
        )
    }

    #[test]
    fn test_insert_assigns_stable_ids() {
        let store = MemoryStore::new();
        let a = store.insert(new_host("sw1", 1)).unwrap();
        let b = store.insert(new_host("sw2", 2)).unwrap();
        assert_eq!(a.id, HostId(1));
        assert_eq!(b.id, HostId(2));

        store.delete(a.id).unwrap();
        let c = store.insert(new_host("sw3", 3)).unwrap();
        assert_eq!(c.id, HostId(3));
        assert_eq!(store.get(b.id).unwrap().unwrap().hostname, "sw2");
    }

    #[test]
    fn test_uniqueness_is_case_insensitive() {
        let store = MemoryStore::new();
        store.insert(new_host("core-sw1", 1)).unwrap();

        let err = store.insert(new_host("CORE-SW1", 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::Directory(DirectoryError::DuplicateHostname { .. })
        ));
        let err = store.insert(new_host("core-sw2", 1)).unwrap_err();
        assert!(matches!(
            err,
            Error::Directory(DirectoryError::DuplicateAddress { .. })
        ));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_os_type_never_stored() {
        let store = MemoryStore::new();
        let mut host = new_host("sw1", 1);
        host.ios_type = IosType::Unknown;
        assert!(matches!(
            store.insert(host),
            Err(Error::Directory(DirectoryError::Validation(
                ValidationError::InvalidOsType
            )))
        ));
    }

    #[test]
    fn test_list_ordered_by_hostname() {
        let store = MemoryStore::new();
        store.insert(new_host("dist1", 1)).unwrap();
        store.insert(new_host("Access2", 2)).unwrap();
        store.insert(new_host("access1", 3)).unwrap();

        let names: Vec<String> = store.list().unwrap().into_iter().map(|h| h.hostname).collect();
        assert_eq!(names, vec!["access1", "Access2", "dist1"]);
    }

    #[test]
    fn test_find() {
        let store = MemoryStore::new();
        store.insert(new_host("Access1", 7)).unwrap();
        assert!(store.find_by_hostname("access1").unwrap().is_some());
        assert!(store.find_by_hostname("access2").unwrap().is_none());
        assert!(
            store
                .find_by_address(Ipv4Addr::new(10, 0, 0, 7))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_update_patch_semantics() {
        let store = MemoryStore::new();
        let host = store.insert(new_host("sw1", 1)).unwrap();

        let updated = store
            .update(host.id, &HostPatch::new().ios_type(IosType::CiscoNxos))
            .unwrap();
        assert_eq!(updated.hostname, "sw1");
        assert_eq!(updated.ipv4_addr, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(updated.ios_type, IosType::CiscoNxos);

        // Renaming to itself in a different case is not a conflict.
        let updated = store
            .update(host.id, &HostPatch::new().hostname("SW1"))
            .unwrap();
        assert_eq!(updated.hostname, "SW1");
    }

    #[test]
    fn test_update_conflict_and_missing() {
        let store = MemoryStore::new();
        let a = store.insert(new_host("sw1", 1)).unwrap();
        store.insert(new_host("sw2", 2)).unwrap();

        let err = store
            .update(a.id, &HostPatch::new().ipv4_addr(Ipv4Addr::new(10, 0, 0, 2)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Directory(DirectoryError::DuplicateAddress { .. })
        ));
        assert_eq!(
            store.get(a.id).unwrap().unwrap().ipv4_addr,
            Ipv4Addr::new(10, 0, 0, 1)
        );

        assert!(matches!(
            store.update(HostId(99), &HostPatch::new().local_creds(true)),
            Err(Error::Directory(DirectoryError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_insert_batch_drops_failed_rows() {
        let store = MemoryStore::new();
        let results = store
            .insert_batch(vec![new_host("sw1", 1), new_host("SW1", 2), new_host("sw3", 3)])
            .unwrap();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(DirectoryError::DuplicateHostname { .. })
        ));
        assert!(results[2].is_ok());
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.json");

        let store = MemoryStore::open(&path).unwrap();
        store.insert(new_host("sw1", 1)).unwrap();
        store.insert(new_host("sw2", 2)).unwrap();
        drop(store);

        let store = MemoryStore::open(&path).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(store.insert(new_host("sw3", 3)).unwrap().id, HostId(3));
    }

    #[test]
    fn test_failed_snapshot_write_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("missing").join("hosts.json")).unwrap();

        let err = store.insert_batch(vec![new_host("sw1", 1)]).unwrap_err();
        assert!(matches!(err, Error::Directory(DirectoryError::Store(_))));
        assert!(store.list().unwrap().is_empty());
    }
}
