//! Vendor-neutral operations on one host.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use super::commands::{self, InterfaceEdit};
use crate::driver::DeviceSession;
use crate::error::{DeviceError, Error, PlatformError, Result, SessionError};
use crate::host::HostRecord;
use crate::platform::{DeviceCommandSet, PlatformDefinition, command_set_for};

/// A host bound to the command set of its OS family.
///
/// The handler never opens or closes sessions. Callers hold one session
/// exclusively for the duration of each call.
#[derive(Clone)]
pub struct DeviceHandler {
    host: HostRecord,
    commands: Arc<dyn DeviceCommandSet>,
}

impl DeviceHandler {
    /// Select the registered command set for the host's OS type.
    pub fn new(host: HostRecord) -> Result<Self> {
        match command_set_for(host.ios_type) {
            Ok(commands) => Ok(Self { host, commands }),
            Err(Error::Platform(PlatformError::UnknownPlatform { .. })) => {
                Err(DeviceError::UnsupportedPlatform {
                    hostname: host.hostname.clone(),
                    ios_type: host.ios_type.to_string(),
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }

    /// Bind an explicit command set, bypassing the registry.
    pub fn with_command_set(host: HostRecord, commands: Arc<dyn DeviceCommandSet>) -> Self {
        Self { host, commands }
    }

    pub fn host(&self) -> &HostRecord {
        &self.host
    }

    pub fn command_set(&self) -> &dyn DeviceCommandSet {
        self.commands.as_ref()
    }

    /// Prompt layout for opening a session to this host.
    pub fn platform(&self) -> PlatformDefinition {
        self.commands.platform()
    }

    pub async fn enable_interface<S: DeviceSession>(
        &self,
        session: &mut S,
        interface: &str,
    ) -> Result<()> {
        let lines = commands::interface_state_sequence(self.command_set(), interface, true)?;
        self.configure(session, &lines).await?;
        info!("{}: enabled {}", self.host.hostname, interface.trim());
        Ok(())
    }

    pub async fn disable_interface<S: DeviceSession>(
        &self,
        session: &mut S,
        interface: &str,
    ) -> Result<()> {
        let lines = commands::interface_state_sequence(self.command_set(), interface, false)?;
        self.configure(session, &lines).await?;
        info!("{}: disabled {}", self.host.hostname, interface.trim());
        Ok(())
    }

    /// Apply VLAN changes and extra lines to one interface.
    pub async fn edit_interface<S: DeviceSession>(
        &self,
        session: &mut S,
        edit: &InterfaceEdit,
    ) -> Result<()> {
        let lines = commands::edit_interface_sequence(self.command_set(), edit)?;
        self.configure(session, &lines).await?;
        info!(
            "{}: edited {} ({} lines)",
            self.host.hostname,
            edit.interface.trim(),
            lines.len()
        );
        Ok(())
    }

    /// Copy the running configuration to startup.
    pub async fn save_configuration<S: DeviceSession>(&self, session: &mut S) -> Result<()> {
        let command = self.commands.save_configuration();
        self.show(session, command).await?;
        info!("{}: configuration saved", self.host.hostname);
        Ok(())
    }

    /// `show inventory`, one line per record, unparsed.
    pub async fn pull_inventory<S: DeviceSession>(&self, session: &mut S) -> Result<Vec<String>> {
        self.show(session, self.commands.show_inventory()).await
    }

    /// `show version`, one line per record, unparsed.
    pub async fn pull_version<S: DeviceSession>(&self, session: &mut S) -> Result<Vec<String>> {
        self.show(session, self.commands.show_version()).await
    }

    /// Interface status table, normalized, without the header row.
    pub async fn pull_interface_status<S: DeviceSession>(
        &self,
        session: &mut S,
    ) -> Result<Vec<String>> {
        let raw = self
            .show(session, self.commands.show_interface_status())
            .await?;
        Ok(self
            .normalize_interface_status(&raw.join("\n"))
            .into_iter()
            .filter(|record| !is_table_chrome(record))
            .collect())
    }

    /// Run an arbitrary read-only `show` command.
    pub async fn run_show<S: DeviceSession>(
        &self,
        session: &mut S,
        command: &str,
    ) -> Result<Vec<String>> {
        let command = command.trim();
        let is_show = command
            .split_whitespace()
            .next()
            .is_some_and(|verb| verb.eq_ignore_ascii_case("show"));
        if !is_show || command.chars().any(char::is_control) {
            return Err(DeviceError::CommandNotAllowed {
                command: command.to_string(),
            }
            .into());
        }
        self.show(session, command).await
    }

    /// Family-specific cleanup of raw interface status output.
    pub fn normalize_interface_status(&self, raw: &str) -> Vec<String> {
        self.commands.normalize_interface_status(raw)
    }

    async fn configure<S: DeviceSession>(&self, session: &mut S, lines: &[String]) -> Result<()> {
        ensure_alive(session)?;
        debug!("{}: config sequence {:?}", self.host.hostname, lines);
        let output = session.run_config_sequence(lines).await?;
        match commands::find_rejection(&output, lines, self.commands.rejection_marker()) {
            Some(rejection) => Err(rejection.into()),
            None => Ok(()),
        }
    }

    async fn show<S: DeviceSession>(&self, session: &mut S, command: &str) -> Result<Vec<String>> {
        ensure_alive(session)?;
        debug!("{}: {}", self.host.hostname, command);
        let output = session.run_command(command).await?;
        let issued = [command.to_string()];
        match commands::find_rejection(&output, &issued, self.commands.rejection_marker()) {
            Some(rejection) => Err(rejection.into()),
            None => Ok(output),
        }
    }
}

impl fmt::Debug for DeviceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandler")
            .field("host", &self.host)
            .field("commands", &self.commands.name())
            .finish()
    }
}

fn ensure_alive<S: DeviceSession>(session: &S) -> Result<()> {
    if session.is_alive() {
        Ok(())
    } else {
        Err(SessionError::NotConnected.into())
    }
}

/// Header and separator rows of a normalized status table.
fn is_table_chrome(record: &str) -> bool {
    let first = record
        .split([',', ' '])
        .next()
        .unwrap_or_default();
    first == "Interface" || first == "Port" || record.chars().all(|c| c == '-' || c == ',' || c == ' ')
}
