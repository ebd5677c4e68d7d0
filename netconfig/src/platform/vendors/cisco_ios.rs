//! Cisco IOS.
//!
//! ```text
//! access1>                  # exec
//! access1#                  # privilege_exec
//! access1(config)#          # configuration
//! access1(config-if)#       # interface sub-mode
//! ```

use super::{CiscoPrompts, cisco_platform};
use crate::platform::{DeviceCommandSet, PlatformDefinition};

pub const PLATFORM_NAME: &str = "cisco_ios";

pub(crate) const PROMPTS: CiscoPrompts = CiscoPrompts {
    exec: r"(?im)^[\w.\-@/:]{1,63}>\s?$",
    privilege_exec: r"(?im)^[\w.\-@/:]{1,63}#\s?$",
    configuration: r"(?im)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,32}\)#\s?$",
};

/// Classic IOS switches and routers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CiscoIos;

impl DeviceCommandSet for CiscoIos {
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
