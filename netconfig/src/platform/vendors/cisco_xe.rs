//! Cisco IOS-XE.
//!
//! Same CLI grammar and prompts as classic IOS. Kept as its own family so
//! the registry key matches the stored OS type and XE-only behaviour has a
//! place to live.

use super::cisco_ios::PROMPTS;
use super::cisco_platform;
use crate::platform::{DeviceCommandSet, PlatformDefinition};

pub const PLATFORM_NAME: &str = "cisco_xe";

/// IOS-XE (Catalyst 9k, ISR/ASR).
#[derive(Debug, Clone, Copy, Default)]
pub struct CiscoXe;

impl DeviceCommandSet for CiscoXe {
    fn name(&self) -> &str {
        PLATFORM_NAME
    }

    fn platform(&self) -> PlatformDefinition {
        cisco_platform(
            PLATFORM_NAME,
            &PROMPTS,
            self.enter_configuration_mode(),
            self.exit_configuration_mode(),
        )
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 512")
        .with_terminal_size(512, 24)
    }
}
