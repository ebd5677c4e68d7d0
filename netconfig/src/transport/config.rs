//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Learn unknown keys, reject changed keys.
    #[default]
    AcceptNew,

    /// Accept every key. Lab use only.
    Disabled,
}

/// SSH connection configuration for one device.
#[derive(Debug)]
pub struct SshConfig {
    /// Device address.
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    pub username: String,

    pub auth: AuthMethod,

    /// Connect, inactivity, and per-command prompt timeout.
    pub timeout: Duration,

    pub terminal_width: u32,

    pub terminal_height: u32,

    pub host_key_verification: HostKeyVerification,

    /// known_hosts file; the user's default when `None`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// `host:port` for log messages.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug)]
pub enum AuthMethod {
    Password(SecretString),

    PrivateKey {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
}
