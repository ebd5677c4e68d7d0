//! Built-in OS families.
//!
//! All Cisco families share the same three-level prompt layout:
//!
//! ```text
//! ┌──────┐  enable   ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├───────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │  disable  │       #        │         end          │  (config*)#   │
//! └──────┘◄──────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```
//!
//! Only the prompt character classes, failure strings, and session setup
//! commands differ between families.

pub mod cisco_asa;
pub mod cisco_ios;
pub mod cisco_nxos;
pub mod cisco_xe;

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Prompt patterns for one Cisco family.
pub(crate) struct CiscoPrompts {
    pub exec: &'static str,
    pub privilege_exec: &'static str,
    pub configuration: &'static str,
}

/// Password prompt shown by `enable`.
const ENABLE_PASSWORD_PROMPT: &str = r"(?im)^(?:enable\s)?password:\s?$";

/// Build the shared exec → privilege_exec → configuration layout.
///
/// The patterns are compile-time constants covered by each family's tests.
pub(crate) fn cisco_platform(
    name: &str,
    prompts: &CiscoPrompts,
    enter_config: &str,
    exit_config: &str,
) -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", prompts.exec).unwrap();

    let privilege_exec = PrivilegeLevel::new("privilege_exec", prompts.privilege_exec)
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(ENABLE_PASSWORD_PROMPT)
        .unwrap()
        .with_not_contains("(config");

    let configuration = PrivilegeLevel::new("configuration", prompts.configuration)
        .unwrap()
        .with_parent("privilege_exec")
        .with_escalate(enter_config)
        .with_deescalate(exit_config);

    PlatformDefinition::new(name)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_configuration_privilege("configuration")
}
