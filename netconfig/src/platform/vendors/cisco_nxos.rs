//! Cisco NX-OS.
//!
//! NX-OS saves with `copy running-config startup-config` and prints
//! interface status as `show interface status`, whose status column is
//! normalized by token substitution.
//!
//! ```text
//! leaf1#                    # privilege_exec (logins usually land here)
//! leaf1(config)#            # configuration
//! leaf1(config-if)#         # interface sub-mode
//! ```

use super::{CiscoPrompts, cisco_platform};
use crate::platform::{DeviceCommandSet, PlatformDefinition, normalize};

pub const PLATFORM_NAME: &str = "cisco_nxos";

const PROMPTS: CiscoPrompts = CiscoPrompts {
    exec: r"(?im)^[\w.\-]{1,63}>\s?$",
    privilege_exec: r"(?im)^[\w.\-]{1,63}(?:\(maint-mode\))?#\s?$",
    configuration: r"(?im)^[\w.\-]{1,63}\(config[\w.\-@/:+]{0,32}\)#\s?$",
};

/// Nexus switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct CiscoNxos;

impl DeviceCommandSet for CiscoNxos {
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
        .with_failure_pattern("% Invalid command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
    }

    fn save_configuration(&self) -> &str {
        "copy running-config startup-config"
    }

    fn show_interface_status(&self) -> &str {
        "show interface status"
    }

    fn normalize_interface_status(&self, raw: &str) -> Vec<String> {
        normalize::nxos_interface_status(raw)
    }
}
