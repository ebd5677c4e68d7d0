//! Builder for device sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::session::SshSession;
use crate::config::{Credentials, SshSettings, copy_secret};
use crate::device::DeviceHandler;
use crate::error::{DeviceError, Result, SessionError};
use crate::host::HostRecord;
use crate::platform::{DeviceCommandSet, PlatformDefinition, command_set_for};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for [`SshSession`].
///
/// # Example
///
/// ```rust,no_run
/// use netconfig::driver::SessionBuilder;
/// use netconfig::platform::{DeviceCommandSet, vendors::cisco_ios::CiscoIos};
///
/// # async fn example() -> Result<(), netconfig::Error> {
/// let mut session = SessionBuilder::new("192.0.2.10")
///     .username("netops")
///     .password("secret")
///     .enable_secret("enable-secret")
///     .command_set(&CiscoIos)
///     .connect()
///     .await?;
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    enable_secret: Option<SecretString>,
    platform: Option<PlatformDefinition>,
    timeout: Duration,
    terminal_size: Option<(u32, u32)>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            enable_secret: None,
            platform: None,
            timeout: Duration::from_secs(30),
            terminal_size: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Target a directory record, with prompts from its OS type's command set.
    pub fn for_host(host: &HostRecord) -> Result<Self> {
        let set = command_set_for(host.ios_type).map_err(|_| DeviceError::UnsupportedPlatform {
            hostname: host.hostname.clone(),
            ios_type: host.ios_type.to_string(),
        })?;
        Ok(Self::new(host.ipv4_addr.to_string()).command_set(set.as_ref()))
    }

    /// Target the handler's host address with its command set's prompts.
    pub fn for_handler(handler: &DeviceHandler) -> Self {
        Self::new(handler.host().ipv4_addr.to_string()).platform(handler.platform())
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        });
        self
    }

    /// Secret sent when `enable` asks for a password. Falls back to the
    /// login password when unset.
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Username, password, and enable secret from settings.
    pub fn credentials(mut self, credentials: &Credentials) -> Self {
        self.username = Some(credentials.username.clone());
        self.auth = Some(AuthMethod::Password(copy_secret(&credentials.password)));
        self.enable_secret = credentials.enable_secret.as_ref().map(copy_secret);
        self
    }

    /// Port, timeout, and host key policy from settings.
    pub fn ssh_settings(mut self, settings: &SshSettings) -> Self {
        self.port = settings.port;
        self.timeout = settings.timeout();
        self.host_key_verification = settings.host_key_verification.clone();
        self.known_hosts_path = settings.known_hosts_path.clone();
        self
    }

    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use the prompt layout of a command set.
    pub fn command_set(self, set: &dyn DeviceCommandSet) -> Self {
        self.platform(set.platform())
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the platform's terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_size = Some((width, height));
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the session without connecting.
    pub fn build(self) -> Result<SshSession> {
        let username = self.username.ok_or_else(|| invalid("username is required"))?;
        let auth = self
            .auth
            .ok_or_else(|| invalid("a password or private key is required"))?;
        let platform = self
            .platform
            .ok_or_else(|| invalid("a platform or command set is required"))?;

        let (terminal_width, terminal_height) = self
            .terminal_size
            .unwrap_or((platform.terminal_width, platform.terminal_height));

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth,
            timeout: self.timeout,
            terminal_width,
            terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        SshSession::new(ssh_config, platform, self.enable_secret)
    }

    /// Build and open the session.
    pub async fn connect(self) -> Result<SshSession> {
        let mut session = self.build()?;
        session.open().await?;
        Ok(session)
    }
}

fn invalid(message: &str) -> SessionError {
    SessionError::InvalidConfig {
        message: message.to_string(),
    }
}
