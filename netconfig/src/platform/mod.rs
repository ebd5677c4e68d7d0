//! Per-OS command catalogs and prompt definitions.
//!
//! Every supported OS family implements [`DeviceCommandSet`]: the exact
//! command text for each logical operation, the interface status
//! normalizer, and the prompt layout the SSH session needs. Families are
//! looked up by name in the [`CommandSetRegistry`], so adding a vendor is a
//! new implementation plus one `register` call.

mod definition;
pub mod normalize;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
pub use registry::{CommandSetRegistry, command_set_for};

/// Command catalog and output normalizer for one OS family.
///
/// Defaults are the classic Cisco IOS commands; families override only
/// what differs.
pub trait DeviceCommandSet: Send + Sync {
    /// Registry name, equal to the `IosType` key (`cisco_ios`, ...).
    fn name(&self) -> &str;

    /// Prompt and privilege layout for the SSH session.
    fn platform(&self) -> PlatformDefinition;

    fn enter_configuration_mode(&self) -> &str {
        "configure terminal"
    }

    fn exit_configuration_mode(&self) -> &str {
        "end"
    }

    fn interface_context(&self, interface: &str) -> String {
        format!("interface {interface}")
    }

    fn enable_interface(&self) -> &str {
        "no shutdown"
    }

    fn disable_interface(&self) -> &str {
        "shutdown"
    }

    fn access_vlan(&self, vlan: &str) -> String {
        format!("switchport access vlan {vlan}")
    }

    fn voice_vlan(&self, vlan: &str) -> String {
        format!("switchport voice vlan {vlan}")
    }

    fn save_configuration(&self) -> &str {
        "write memory"
    }

    fn show_inventory(&self) -> &str {
        "show inventory"
    }

    fn show_version(&self) -> &str {
        "show version"
    }

    fn show_interface_status(&self) -> &str {
        "show ip interface brief"
    }

    /// Marker the device prints when it rejects a command. Only this marker
    /// turns into `DeviceError::Rejected`; the wider failure strings of
    /// [`PlatformDefinition`] are reported by the SSH session as log
    /// warnings.
    fn rejection_marker(&self) -> &str {
        "Invalid input detected"
    }

    /// Convert raw interface status output into comma-delimited records.
    fn normalize_interface_status(&self, raw: &str) -> Vec<String> {
        normalize::ios_interface_status(raw)
    }
}
