//! Error types for netconfig.

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

use crate::host::HostId;

/// Main error type for netconfig operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Device session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Command set registry errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Device-side command errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Host directory errors
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Settings errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// True when the device session can no longer be used and must be
    /// re-established before retrying.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Channel(_) | Error::Session(_)
        )
    }

    /// True for failures a caller may retry as-is (after reconnecting, for
    /// session failures).
    pub fn is_retryable(&self) -> bool {
        self.is_session_failure()
            || matches!(self, Error::Directory(DirectoryError::Unavailable { .. }))
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// The server presented a key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Strict verification and the host is not in known_hosts
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Prompt not found within {0:?}")]
    PatternTimeout(std::time::Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session layer errors (connection state, privilege navigation).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not connected
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Invalid session configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Unknown privilege level detected
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Command set registry errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No command set registered under this name
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A command set with this name already exists
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Registry lock poisoned
    #[error("Platform registry unavailable")]
    RegistryPoisoned,
}

/// Errors raised while running operations against a device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device answered with its invalid-input marker.
    #[error("Device rejected '{command}': {message}")]
    Rejected { command: String, message: String },

    /// The host's OS type has no command set.
    #[error("No command set for OS type '{ios_type}' (host '{hostname}')")]
    UnsupportedPlatform { hostname: String, ios_type: String },

    /// Command refused before it reached the device.
    #[error("Command not allowed: '{command}'")]
    CommandNotAllowed { command: String },

    /// Empty or multi-line operation argument.
    #[error("Invalid {field}: '{value}'")]
    InvalidArgument { field: &'static str, value: String },
}

/// Errors from the host directory (local store or remote inventory).
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Host {id} not found")]
    NotFound { id: HostId },

    #[error("Duplicate hostname '{hostname}'")]
    DuplicateHostname { hostname: String },

    #[error("Duplicate IPv4 address {address}")]
    DuplicateAddress { address: Ipv4Addr },

    /// Remote inventory could not be reached or answered with an error status.
    #[error("Inventory at {url} unavailable: {reason}")]
    Unavailable { url: String, reason: String },

    /// Write attempted against a read-only source.
    #[error("'{operation}' is not supported by the {directory} directory")]
    UnsupportedOperation {
        operation: &'static str,
        directory: &'static str,
    },

    /// Remote record is missing a field the canonical host requires.
    #[error("Inventory device {id} has no {field}")]
    IncompleteRecord { id: HostId, field: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backing store failure (snapshot I/O, corrupt data).
    #[error("Host store error: {0}")]
    Store(String),
}

/// Host record validation failures. The messages are the per-row reasons
/// reported by batch import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid number of fields in entry")]
    FieldCount,

    #[error("Invalid IP address")]
    InvalidAddress,

    #[error("Invalid device type")]
    InvalidDeviceType,

    #[error("Invalid OS type")]
    InvalidOsType,

    #[error("Duplicate hostname in database")]
    DuplicateHostname,

    #[error("Duplicate IPv4 address in database")]
    DuplicateAddress,

    #[error("Hostname must not be empty")]
    EmptyHostname,
}

/// Settings loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {message}")]
    Invalid { message: String },

    #[error("No credentials configured for host '{hostname}'")]
    MissingCredentials { hostname: String },
}

/// Result type alias using netconfig's Error.
pub type Result<T> = std::result::Result<T, Error>;
