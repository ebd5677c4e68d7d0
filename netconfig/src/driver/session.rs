//! Interactive SSH session to one network device.

use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::DeviceSession;
use super::privilege::{PrivilegeManager, Transition};
use super::response::Response;
use crate::error::{Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::{AuthMethod, SshConfig, SshTransport};

/// Shell session that tracks the prompt and privilege level.
///
/// Created by [`SessionBuilder`](super::SessionBuilder); call
/// [`open`](Self::open) before running commands and
/// [`close`](Self::close) when done.
pub struct SshSession {
    ssh_config: SshConfig,
    enable_secret: Option<SecretString>,
    platform: PlatformDefinition,
    transport: Option<SshTransport>,
    privileges: PrivilegeManager,
    timeout: Duration,

    /// Alternation of every level's prompt pattern.
    prompt_pattern: Regex,
}

impl SshSession {
    pub fn new(
        ssh_config: SshConfig,
        platform: PlatformDefinition,
        enable_secret: Option<SecretString>,
    ) -> Result<Self> {
        let prompt_pattern = combined_prompt_pattern(&platform)?;
        Ok(Self {
            timeout: ssh_config.timeout,
            privileges: PrivilegeManager::new(platform.privilege_levels.clone()),
            ssh_config,
            enable_secret,
            platform,
            transport: None,
            prompt_pattern,
        })
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn current_privilege(&self) -> Option<&str> {
        self.privileges.current_name()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Connect, wait for the first prompt, reach the default privilege
    /// level, and run the platform's session setup commands.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(SessionError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        self.transport = Some(transport);

        let prompt = self.read_until_prompt().await?;
        let level = self.privileges.observe_prompt(&prompt)?;
        info!(
            "session open to {} at '{}' ({})",
            self.ssh_config.socket_addr(),
            prompt,
            level
        );

        let default = self.platform.default_privilege.clone();
        self.acquire_privilege(&default).await?;

        for command in self.platform.on_open_commands.clone() {
            let response = self.send_command(&command).await?;
            if let Some(failure) = &response.failure_message {
                warn!("setup command '{}' failed: {}", command, failure);
            }
        }
        Ok(())
    }

    /// Run the platform's teardown commands and disconnect.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };
        for command in &self.platform.on_close_commands {
            transport.send(command).await?;
        }
        self.privileges.reset();
        debug!("closing session to {}", transport.peer());
        transport.close().await
    }

    async fn read_until_prompt(&mut self) -> Result<String> {
        let transport = self.transport.as_mut().ok_or(SessionError::NotConnected)?;
        let data = transport
            .read_until_pattern(&self.prompt_pattern, self.timeout)
            .await?;
        Ok(last_line(&String::from_utf8_lossy(&data)).to_string())
    }

    /// Send one command and wait for the next prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let transport = self.transport.as_mut().ok_or(SessionError::NotConnected)?;

        let start = Instant::now();
        transport.send(command).await?;
        let data = transport
            .read_until_pattern(&self.prompt_pattern, self.timeout)
            .await?;

        let response = Response::from_raw(
            command,
            &String::from_utf8_lossy(&data),
            start.elapsed(),
            &self.platform.failed_when_contains,
        );
        trace!("{:?} -> {:?}", command, response.raw_result);

        if let Err(e) = self.privileges.observe_prompt(&response.prompt) {
            debug!("prompt after '{}' not recognized: {}", command, e);
        }
        Ok(response)
    }

    /// Move to `target`, sending the enable secret if the device asks.
    pub async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        if self.privileges.current_name() == Some(target) {
            return Ok(());
        }

        for transition in self.privileges.plan(target)? {
            debug!("'{}' -> {}", transition.command, transition.target);
            let prompt = match self.perform_transition(&transition).await? {
                Some(prompt) => prompt,
                None => self.read_until_prompt().await?,
            };

            let reached = self.privileges.observe_prompt(&prompt)?;
            if reached != transition.target {
                return Err(SessionError::PrivilegeAcquisitionFailed {
                    target: transition.target,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Send the transition command and answer a password prompt if one
    /// appears. Returns the prompt when the device skipped the password.
    async fn perform_transition(&mut self, transition: &Transition) -> Result<Option<String>> {
        let transport = self.transport.as_mut().ok_or(SessionError::NotConnected)?;
        transport.send(&transition.command).await?;

        let Some(auth_prompt) = &transition.auth_prompt else {
            return Ok(None);
        };

        let either = Regex::new(&format!(
            "(?:{})|(?:{})",
            auth_prompt.as_str(),
            self.prompt_pattern.as_str()
        ))
        .map_err(|e| SessionError::InvalidConfig {
            message: e.to_string(),
        })?;
        let data = transport.read_until_pattern(&either, self.timeout).await?;

        if !auth_prompt.is_match(&data) {
            return Ok(Some(last_line(&String::from_utf8_lossy(&data)).to_string()));
        }

        let secret = self
            .enable_secret
            .as_ref()
            .or(match &self.ssh_config.auth {
                AuthMethod::Password(password) => Some(password),
                AuthMethod::PrivateKey { .. } => None,
            })
            .ok_or_else(|| SessionError::PrivilegeAcquisitionFailed {
                target: transition.target.clone(),
            })?;
        transport.send(secret.expose_secret()).await?;
        Ok(None)
    }
}

impl DeviceSession for SshSession {
    async fn run_command(&mut self, command: &str) -> Result<Vec<String>> {
        let default = self.platform.default_privilege.clone();
        self.acquire_privilege(&default).await?;

        let response = self.send_command(command).await?;
        if let Some(failure) = &response.failure_message {
            debug!("'{}' reported failure: {}", command, failure);
        }
        Ok(response.lines().map(str::to_string).collect())
    }

    async fn run_config_sequence(&mut self, lines: &[String]) -> Result<Vec<String>> {
        let configuration = self.platform.configuration_privilege.clone();
        self.acquire_privilege(&configuration).await?;

        let mut output = Vec::new();
        for line in lines {
            let response = self.send_command(line).await?;
            if let Some(failure) = &response.failure_message {
                warn!("'{}' reported failure: {}", line, failure);
            }
            output.extend(response.raw_lines().map(str::to_string));
        }
        Ok(output)
    }

    fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(SshTransport::is_alive)
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!(
                "session to {} dropped without close(); connection will be torn down",
                self.ssh_config.socket_addr()
            );
        }
    }
}

/// Regex matching any of the platform's prompts.
fn combined_prompt_pattern(platform: &PlatformDefinition) -> Result<Regex> {
    if platform.privilege_levels.is_empty() {
        return Err(SessionError::InvalidConfig {
            message: format!("platform '{}' defines no privilege levels", platform.name),
        }
        .into());
    }

    let alternation = platform
        .privilege_levels
        .values()
        .map(|level| format!("(?:{})", level.pattern.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).map_err(|e| {
        SessionError::InvalidConfig {
            message: e.to_string(),
        }
        .into()
    })
}

/// Last non-blank line, trimmed.
fn last_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DeviceCommandSet;
    use crate::platform::vendors::cisco_asa::CiscoAsa;
    use crate::platform::vendors::cisco_ios::CiscoIos;

    #[test]
    fn test_combined_prompt_pattern() {
        let pattern = combined_prompt_pattern(&CiscoIos.platform()).unwrap();
        assert!(pattern.is_match(b"banner\r\nsw1>"));
        assert!(pattern.is_match(b"sw1#"));
        assert!(pattern.is_match(b"sw1(config-if)#"));
        assert!(!pattern.is_match(b"Building configuration..."));

        let pattern = combined_prompt_pattern(&CiscoAsa.platform()).unwrap();
        assert!(pattern.is_match(b"fw1/pri/act#"));
    }

    #[test]
    fn test_combined_prompt_pattern_requires_levels() {
        let platform = PlatformDefinition::new("empty");
        assert!(combined_prompt_pattern(&platform).is_err());
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("terminal length 0\r\nsw1#"), "sw1#");
        assert_eq!(last_line("output\r\nsw1# \r\n\r\n"), "sw1#");
        assert_eq!(last_line(""), "");
    }

    #[test]
    fn test_new_session_is_closed() {
        let config = SshConfig {
            host: "192.0.2.10".to_string(),
            port: 22,
            username: "netops".to_string(),
            auth: AuthMethod::Password(SecretString::from("secret".to_string())),
            timeout: Duration::from_secs(5),
            terminal_width: 512,
            terminal_height: 24,
            host_key_verification: Default::default(),
            known_hosts_path: None,
        };
        let session = SshSession::new(config, CiscoIos.platform(), None).unwrap();
        assert!(!session.is_open());
        assert!(!session.is_alive());
        assert_eq!(session.current_privilege(), None);
    }
}
