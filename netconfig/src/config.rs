//! Settings file.
//!
//! ```toml
//! [directory]
//! source = "local"            # or "netbox"
//! path = "/var/lib/netconfig/hosts.json"
//! netbox_url = "https://netbox.example.net"
//! timeout_secs = 10
//!
//! [ssh]
//! port = 22
//! timeout_secs = 30
//! host_key_verification = "accept-new"
//!
//! [credentials]
//! username = "netops"
//! password = "shared-secret"
//! enable_secret = "enable-secret"
//!
//! [credentials.hosts.core-sw1]
//! username = "core-admin"
//! password = "device-secret"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::audit::AuditSink;
use crate::directory::{HostDirectory, LocalDirectory, MemoryStore, NetboxClient, NetboxDirectory};
use crate::error::{ConfigError, Result};
use crate::host::{DirectorySource, HostRecord};
use crate::transport::HostKeyVerification;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub directory: DirectorySettings,
    pub ssh: SshSettings,
    pub credentials: CredentialSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectorySettings {
    pub source: DirectorySource,

    /// JSON snapshot of the local store. In-memory only when unset.
    pub path: Option<PathBuf>,

    pub netbox_url: Option<String>,

    pub netbox_token: Option<SecretString>,

    /// Netbox request timeout.
    pub timeout_secs: u64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            source: DirectorySource::Local,
            path: None,
            netbox_url: None,
            netbox_token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshSettings {
    pub port: u16,
    pub timeout_secs: u64,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            port: 22,
            timeout_secs: 30,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

impl SshSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Shared login plus per-device overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialSettings {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub enable_secret: Option<SecretString>,

    /// Keyed by hostname; used for hosts with `local_creds` set.
    pub hosts: HashMap<String, HostCredentials>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostCredentials {
    /// Falls back to the shared username.
    pub username: Option<String>,
    pub password: SecretString,
    pub enable_secret: Option<SecretString>,
}

/// Login for one device.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub enable_secret: Option<SecretString>,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(ConfigError::from)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        debug!("loaded settings from {}", path.display());
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.directory.source == DirectorySource::Netbox && self.directory.netbox_url.is_none()
        {
            return Err(invalid("directory.netbox_url is required for the netbox source"));
        }
        if self.directory.timeout_secs == 0 {
            return Err(invalid("directory.timeout_secs must be positive"));
        }
        if self.ssh.timeout_secs == 0 {
            return Err(invalid("ssh.timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Build the configured directory.
    pub fn directory(&self, audit: Arc<dyn AuditSink>) -> Result<HostDirectory> {
        let settings = &self.directory;
        match settings.source {
            DirectorySource::Local => {
                let store = match &settings.path {
                    Some(path) => MemoryStore::open(path)?,
                    None => MemoryStore::new(),
                };
                Ok(HostDirectory::Local(LocalDirectory::new(
                    Arc::new(store),
                    audit,
                )))
            }
            DirectorySource::Netbox => {
                let url = settings
                    .netbox_url
                    .as_deref()
                    .ok_or_else(|| invalid("directory.netbox_url is required for the netbox source"))?;
                let mut builder = NetboxClient::builder(url)
                    .timeout(Duration::from_secs(settings.timeout_secs));
                if let Some(token) = &settings.netbox_token {
                    builder = builder.token(copy_secret(token));
                }
                Ok(HostDirectory::Netbox(NetboxDirectory::new(
                    builder.build()?,
                    audit,
                )))
            }
        }
    }

    /// Device-specific credentials for `local_creds` hosts, shared ones
    /// otherwise.
    pub fn credentials_for(&self, host: &HostRecord) -> Result<Credentials> {
        let creds = &self.credentials;
        let missing = || ConfigError::MissingCredentials {
            hostname: host.hostname.clone(),
        };

        if host.local_creds {
            let entry = creds
                .hosts
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&host.hostname))
                .map(|(_, entry)| entry)
                .ok_or_else(missing)?;
            let username = entry
                .username
                .as_ref()
                .or(creds.username.as_ref())
                .ok_or_else(missing)?;
            return Ok(Credentials {
                username: username.clone(),
                password: copy_secret(&entry.password),
                enable_secret: entry
                    .enable_secret
                    .as_ref()
                    .or(creds.enable_secret.as_ref())
                    .map(copy_secret),
            });
        }

        match (&creds.username, &creds.password) {
            (Some(username), Some(password)) => Ok(Credentials {
                username: username.clone(),
                password: copy_secret(password),
                enable_secret: creds.enable_secret.as_ref().map(copy_secret),
            }),
            _ => Err(missing().into()),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_string(),
    }
}

/// `SecretString` is not `Clone`.
pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}
