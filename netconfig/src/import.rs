//! Batch host import.
//!
//! Input is one host per line:
//!
//! ```text
//! hostname,ipv4_address,device_type,os[,local_creds]
//! sw1,10.0.0.1,switch,ios
//! fw1,10.0.0.254,firewall,asa,true
//! ```
//!
//! Each row is validated on its own; a bad row is reported and skipped,
//! never aborting the batch. Rows that pass are inserted with a single
//! commit at the end.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use log::{debug, warn};

use crate::directory::HostStore;
use crate::error::{DirectoryError, Result, ValidationError};
use crate::host::{DeviceType, HostId, IosType, NewHost};

/// Field delimiter of import rows.
pub const FIELD_DELIMITER: char = ',';

/// Which hosts a row is checked against for duplicates before insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateScope {
    /// The store and every earlier row of the same batch. A repeated
    /// hostname or address is rejected with the duplicate reason.
    #[default]
    StoreAndBatch,

    /// The store only. Repeats inside the batch pass validation and are
    /// dropped when the store refuses the insert.
    StoreOnly,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub duplicate_scope: DuplicateScope,
}

/// An inserted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedHost {
    pub id: HostId,
    pub hostname: String,
    pub ipv4_addr: Ipv4Addr,
}

/// A row that was not inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub hostname: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub accepted: Vec<ImportedHost>,
    pub rejected: Vec<RejectedRow>,
    /// False when the final commit failed and nothing was inserted.
    pub committed: bool,
}

impl ImportOutcome {
    /// One-line description for the audit trail.
    pub fn summary(&self) -> String {
        if self.committed {
            format!(
                "Imported {} hosts into database ({} rejected)",
                self.accepted.len(),
                self.rejected.len()
            )
        } else {
            format!(
                "Host import rolled back ({} rows rejected)",
                self.rejected.len()
            )
        }
    }
}

/// Validate one row: field count, address, device type, OS, and the
/// optional local credentials flag, in that order.
pub fn parse_row(line: &str) -> std::result::Result<NewHost, ValidationError> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();
    if fields.len() < 4 {
        return Err(ValidationError::FieldCount);
    }

    let addr: Ipv4Addr = fields[1]
        .parse()
        .map_err(|_| ValidationError::InvalidAddress)?;
    let device_type: DeviceType = fields[2].parse()?;
    let ios_type = IosType::from_os_name(fields[3]);
    if !ios_type.is_known() {
        return Err(ValidationError::InvalidOsType);
    }
    let local_creds = fields
        .get(4)
        .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));

    let host = NewHost::new(fields[0], addr, device_type, ios_type).with_local_creds(local_creds);
    host.validate()?;
    Ok(host)
}

fn row_hostname(line: &str) -> String {
    line.split(FIELD_DELIMITER)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Validate every row of `input` and insert the valid ones.
///
/// Store lookups that fail (as opposed to rows that fail validation) abort
/// the import with an error.
pub fn import_batch(
    store: &dyn HostStore,
    input: &str,
    options: ImportOptions,
) -> Result<ImportOutcome> {
    let mut outcome = ImportOutcome::default();
    // Rejections carry their row index so they are reported in input order.
    let mut rejected: Vec<(usize, RejectedRow)> = Vec::new();
    let mut staged: Vec<NewHost> = Vec::new();
    let mut staged_rows: Vec<(usize, String)> = Vec::new();
    let mut staged_names: HashSet<String> = HashSet::new();
    let mut staged_addrs: HashSet<Ipv4Addr> = HashSet::new();
    let check_batch = options.duplicate_scope == DuplicateScope::StoreAndBatch;

    let rows = input.trim().lines().filter(|l| !l.trim().is_empty());
    for (row, line) in rows.enumerate() {
        let hostname = row_hostname(line);
        let reject = |reason: ValidationError| {
            (
                row,
                RejectedRow {
                    hostname: hostname.clone(),
                    reason: reason.to_string(),
                },
            )
        };

        let host = match parse_row(line) {
            Ok(host) => host,
            Err(reason) => {
                rejected.push(reject(reason));
                continue;
            }
        };

        let name_key = host.hostname.trim().to_lowercase();
        if store.find_by_hostname(&host.hostname)?.is_some()
            || (check_batch && staged_names.contains(&name_key))
        {
            rejected.push(reject(ValidationError::DuplicateHostname));
            continue;
        }
        if store.find_by_address(host.ipv4_addr)?.is_some()
            || (check_batch && staged_addrs.contains(&host.ipv4_addr))
        {
            rejected.push(reject(ValidationError::DuplicateAddress));
            continue;
        }

        staged_names.insert(name_key);
        staged_addrs.insert(host.ipv4_addr);
        staged_rows.push((row, host.hostname.trim().to_string()));
        staged.push(host);
    }

    debug!(
        "import staged {} rows, rejected {}",
        staged.len(),
        rejected.len()
    );

    match store.insert_batch(staged) {
        Ok(results) => {
            for ((row, hostname), result) in staged_rows.into_iter().zip(results) {
                match result {
                    Ok(record) => outcome.accepted.push(ImportedHost {
                        id: record.id,
                        hostname: record.hostname,
                        ipv4_addr: record.ipv4_addr,
                    }),
                    Err(e) => rejected.push((
                        row,
                        RejectedRow {
                            hostname,
                            reason: insert_failure_reason(&e),
                        },
                    )),
                }
            }
            outcome.committed = true;
        }
        Err(e) => {
            warn!("host import commit failed: {}", e);
            rejected.extend(staged_rows.into_iter().map(|(row, hostname)| {
                (
                    row,
                    RejectedRow {
                        hostname,
                        reason: format!("Batch commit failed: {e}"),
                    },
                )
            }));
        }
    }

    rejected.sort_by_key(|(row, _)| *row);
    outcome.rejected = rejected.into_iter().map(|(_, r)| r).collect();
    Ok(outcome)
}

fn insert_failure_reason(err: &DirectoryError) -> String {
    format!("Insert failed: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryStore;

    fn reasons(outcome: &ImportOutcome) -> Vec<(&str, &str)> {
        outcome
            .rejected
            .iter()
            .map(|r| (r.hostname.as_str(), r.reason.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_row_validation_order() {
        assert_eq!(
            parse_row("sw1,10.0.0.1,switch"),
            Err(ValidationError::FieldCount)
        );
        assert_eq!(
            parse_row("sw1,10.0.0.300,bogus,bogus"),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(
            parse_row("sw1,10.0.0.1,hub,bogus"),
            Err(ValidationError::InvalidDeviceType)
        );
        assert_eq!(
            parse_row("sw1,10.0.0.1, Switch ,junos"),
            Err(ValidationError::InvalidOsType)
        );
    }

    #[test]
    fn test_parse_row_fields() {
        let host = parse_row(" sw1 , 10.0.0.1 ,SWITCH,IOS-XE").unwrap();
        assert_eq!(host.hostname, "sw1");
        assert_eq!(host.device_type, DeviceType::Switch);
        assert_eq!(host.ios_type, IosType::CiscoXe);
        assert!(!host.local_creds);

        assert!(parse_row("fw1,10.0.0.254,firewall,asa,TRUE").unwrap().local_creds);
        assert!(!parse_row("fw1,10.0.0.254,firewall,asa,yes").unwrap().local_creds);
    }

    #[test]
    fn test_import_reports_every_row() {
        let store = MemoryStore::new();
        let input = "\
sw1,10.0.0.1,switch,ios
sw2,10.0.0.2,switch
sw3,not-an-ip,switch,ios

rtr1,10.0.0.3,router,ios-xe,true
fw1,10.0.0.4,firewall,asa";

        let outcome = import_batch(&store, input, ImportOptions::default()).unwrap();
        assert!(outcome.committed);
        let accepted: Vec<&str> = outcome.accepted.iter().map(|h| h.hostname.as_str()).collect();
        assert_eq!(accepted, vec!["sw1", "rtr1", "fw1"]);
        assert_eq!(
            reasons(&outcome),
            vec![
                ("sw2", "Invalid number of fields in entry"),
                ("sw3", "Invalid IP address"),
            ]
        );
        assert!(store.find_by_hostname("rtr1").unwrap().unwrap().local_creds);
    }

    #[test]
    fn test_import_duplicates_against_store() {
        let store = MemoryStore::new();
        import_batch(&store, "sw1,10.0.0.1,switch,ios", ImportOptions::default()).unwrap();

        let outcome = import_batch(
            &store,
            "SW1,10.0.0.9,switch,ios\nsw2,10.0.0.1,switch,ios",
            ImportOptions::default(),
        )
        .unwrap();
        assert!(outcome.accepted.is_empty());
        assert_eq!(
            reasons(&outcome),
            vec![
                ("SW1", "Duplicate hostname in database"),
                ("sw2", "Duplicate IPv4 address in database"),
            ]
        );
    }

    #[test]
    fn test_duplicate_within_batch_checked_against_staged_rows() {
        let store = MemoryStore::new();
        let outcome = import_batch(
            &store,
            "sw1,10.0.0.1,switch,ios\nsw1,10.0.0.2,switch,ios",
            ImportOptions {
                duplicate_scope: DuplicateScope::StoreAndBatch,
            },
        )
        .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].ipv4_addr, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(reasons(&outcome), vec![("sw1", "Duplicate hostname in database")]);
    }

    #[test]
    fn test_duplicate_within_batch_checked_against_store_only() {
        let store = MemoryStore::new();
        let outcome = import_batch(
            &store,
            "sw1,10.0.0.1,switch,ios\nsw1,10.0.0.2,switch,ios",
            ImportOptions {
                duplicate_scope: DuplicateScope::StoreOnly,
            },
        )
        .unwrap();

        // Both rows pass validation; the store keeps hostnames unique.
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].hostname, "sw1");
        assert!(outcome.rejected[0].reason.starts_with("Insert failed: Duplicate hostname"));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_rejections_follow_input_order() {
        let store = MemoryStore::new();
        let outcome = import_batch(
            &store,
            "sw1,10.0.0.1,switch,ios\nsw1,10.0.0.2,switch,ios\nsw3,10.0.0.3,hub,ios",
            ImportOptions {
                duplicate_scope: DuplicateScope::StoreOnly,
            },
        )
        .unwrap();

        let rows = reasons(&outcome);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "sw1");
        assert!(rows[0].1.starts_with("Insert failed"));
        assert_eq!(rows[1], ("sw3", "Invalid device type"));
    }

    #[test]
    fn test_failed_commit_rolls_back_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("missing").join("hosts.json")).unwrap();

        let outcome = import_batch(
            &store,
            "sw1,10.0.0.1,switch,ios\nsw2,10.0.0.2,switch,nx-os\nbad",
            ImportOptions::default(),
        )
        .unwrap();

        assert!(!outcome.committed);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected.len(), 3);
        assert!(outcome.rejected[0].reason.starts_with("Batch commit failed"));
        assert!(outcome.rejected[1].reason.starts_with("Batch commit failed"));
        assert_eq!(outcome.rejected[2].reason, "Invalid number of fields in entry");
        assert!(store.list().unwrap().is_empty());
        assert_eq!(outcome.summary(), "Host import rolled back (3 rows rejected)");
    }
}
