//! Cisco ASA firewalls.
//!
//! ASA pages with `terminal pager 0` and lists interfaces with
//! `show interface ip brief`, which shares the IOS column layout.

use super::{CiscoPrompts, cisco_platform};
use crate::platform::{DeviceCommandSet, PlatformDefinition};

pub const PLATFORM_NAME: &str = "cisco_asa";

const PROMPTS: CiscoPrompts = CiscoPrompts {
    exec: r"(?im)^[\w.\-@/:]{1,63}>\s?$",
    privilege_exec: r"(?im)^[\w.\-@/:]{1,63}#\s?$",
    configuration: r"(?im)^[\w.\-@/:]{1,63}\(config[\w.\-@/:+]{0,32}\)#\s?$",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CiscoAsa;

impl DeviceCommandSet for CiscoAsa {
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
        .with_failure_pattern("ERROR: % Incomplete command")
        .with_failure_pattern("ERROR: % Ambiguous command")
        .with_on_open_command("terminal pager 0")
        .with_terminal_size(511, 24)
    }

    fn show_interface_status(&self) -> &str {
        "show interface ip brief"
    }
}
