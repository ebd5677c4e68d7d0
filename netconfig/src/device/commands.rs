//! Command sequences for interface operations.
//!
//! Builders here are pure: they only turn a request into the ordered lines
//! sent in configuration mode. The session supplies `configure terminal`.

use crate::error::DeviceError;
use crate::platform::DeviceCommandSet;

/// VLAN value meaning "leave unchanged".
pub const NO_VLAN: &str = "0";

/// Stands for a space inside encoded extra lines.
pub const SPACE_PLACEHOLDER: char = '+';

/// Separates lines inside encoded extra lines.
pub const LINE_BREAK_PLACEHOLDER: char = '&';

/// Requested changes to one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEdit {
    pub interface: String,
    pub data_vlan: String,
    pub voice_vlan: String,
    /// Extra configuration lines, encoded with [`SPACE_PLACEHOLDER`] and
    /// [`LINE_BREAK_PLACEHOLDER`].
    pub extra_lines: String,
}

impl InterfaceEdit {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            data_vlan: NO_VLAN.to_string(),
            voice_vlan: NO_VLAN.to_string(),
            extra_lines: String::new(),
        }
    }

    pub fn data_vlan(mut self, vlan: impl Into<String>) -> Self {
        self.data_vlan = vlan.into();
        self
    }

    pub fn voice_vlan(mut self, vlan: impl Into<String>) -> Self {
        self.voice_vlan = vlan.into();
        self
    }

    pub fn extra_lines(mut self, encoded: impl Into<String>) -> Self {
        self.extra_lines = encoded.into();
        self
    }
}

/// Decode an extra-lines block. Empty input and `"0"` mean no lines.
pub fn decode_extra_lines(encoded: &str) -> Vec<String> {
    let encoded = encoded.trim();
    if encoded.is_empty() || encoded == NO_VLAN {
        return Vec::new();
    }
    encoded
        .split(LINE_BREAK_PLACEHOLDER)
        .map(|line| line.replace(SPACE_PLACEHOLDER, " "))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// `interface X`, `no shutdown` or `shutdown`, exit.
pub fn interface_state_sequence(
    commands: &dyn DeviceCommandSet,
    interface: &str,
    enable: bool,
) -> Result<Vec<String>, DeviceError> {
    let interface = checked_value("interface", interface)?;
    let state = if enable {
        commands.enable_interface()
    } else {
        commands.disable_interface()
    };
    Ok(vec![
        commands.interface_context(interface),
        state.to_string(),
        commands.exit_configuration_mode().to_string(),
    ])
}

/// Interface context, optional VLAN lines, decoded extra lines, exit.
pub fn edit_interface_sequence(
    commands: &dyn DeviceCommandSet,
    edit: &InterfaceEdit,
) -> Result<Vec<String>, DeviceError> {
    let interface = checked_value("interface", &edit.interface)?;
    let data_vlan = checked_value("data VLAN", &edit.data_vlan)?;
    let voice_vlan = checked_value("voice VLAN", &edit.voice_vlan)?;

    let mut lines = vec![commands.interface_context(interface)];
    if data_vlan != NO_VLAN {
        lines.push(commands.access_vlan(data_vlan));
    }
    if voice_vlan != NO_VLAN {
        lines.push(commands.voice_vlan(voice_vlan));
    }
    lines.extend(decode_extra_lines(&edit.extra_lines));
    lines.push(commands.exit_configuration_mode().to_string());
    Ok(lines)
}

/// Trimmed single-line argument, or an error naming the field.
fn checked_value<'a>(field: &'static str, value: &'a str) -> Result<&'a str, DeviceError> {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_control) {
        return Err(DeviceError::InvalidArgument {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Find the first output line carrying `marker` and attribute it to the
/// last issued command echoed before it.
pub fn find_rejection(output: &[String], issued: &[String], marker: &str) -> Option<DeviceError> {
    let mut last_echoed: Option<&str> = None;
    for line in output {
        let line = line.trim();
        if let Some(command) = issued
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty() && is_echo_of(line, c))
        {
            last_echoed = Some(command);
            continue;
        }
        if line.contains(marker) {
            let command = last_echoed
                .map(str::to_string)
                .unwrap_or_else(|| issued.join("; "));
            return Some(DeviceError::Rejected {
                command,
                message: line.to_string(),
            });
        }
    }
    None
}

/// The line is the command itself, possibly behind a prompt.
fn is_echo_of(line: &str, command: &str) -> bool {
    line == command
        || line
            .strip_suffix(command)
            .map(str::trim_end)
            .is_some_and(|prefix| prefix.ends_with('#') || prefix.ends_with('>'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::IosType;
    use crate::platform::command_set_for;
    use crate::platform::vendors::cisco_ios::CiscoIos;

    #[test]
    fn test_decode_extra_lines() {
        assert_eq!(
            decode_extra_lines("description+Uplink&spanning-tree+portfast"),
            vec!["description Uplink", "spanning-tree portfast"]
        );
        assert!(decode_extra_lines("").is_empty());
        assert!(decode_extra_lines("0").is_empty());
        assert_eq!(decode_extra_lines("a&&b"), vec!["a", "b"]);
    }

    #[test]
    fn test_state_sequence() {
        let lines = interface_state_sequence(&CiscoIos, "Gi1/0/1", true).unwrap();
        assert_eq!(lines, vec!["interface Gi1/0/1", "no shutdown", "end"]);
        let lines = interface_state_sequence(&CiscoIos, " Gi1/0/1 ", false).unwrap();
        assert_eq!(lines, vec!["interface Gi1/0/1", "shutdown", "end"]);
    }

    #[test]
    fn test_rejects_multiline_argument() {
        assert!(matches!(
            interface_state_sequence(&CiscoIos, "Gi1/0/1\nreload", true),
            Err(DeviceError::InvalidArgument { field: "interface", .. })
        ));
        assert!(interface_state_sequence(&CiscoIos, "  ", true).is_err());
    }

    #[test]
    fn test_edit_sequence_vlan_lines_for_every_family() {
        for ios_type in IosType::KNOWN {
            let commands = command_set_for(ios_type).unwrap();
            for (data, voice) in [("0", "0"), ("10", "0"), ("0", "20"), ("10", "20")] {
                let edit = InterfaceEdit::new("Gi1/0/5").data_vlan(data).voice_vlan(voice);
                let lines = edit_interface_sequence(commands.as_ref(), &edit).unwrap();

                assert_eq!(lines.first().map(String::as_str), Some("interface Gi1/0/5"));
                assert_eq!(lines.last().map(String::as_str), Some("end"));
                assert_eq!(
                    lines.iter().any(|l| l.starts_with("switchport access vlan")),
                    data != "0"
                );
                assert_eq!(
                    lines.iter().any(|l| l.starts_with("switchport voice vlan")),
                    voice != "0"
                );
            }
        }
    }

    #[test]
    fn test_edit_sequence_extra_lines_in_order() {
        let edit = InterfaceEdit::new("Gi1/0/5")
            .data_vlan("10")
            .extra_lines("description+Desk+12&spanning-tree+portfast");
        let lines = edit_interface_sequence(&CiscoIos, &edit).unwrap();
        assert_eq!(
            lines,
            vec![
                "interface Gi1/0/5",
                "switchport access vlan 10",
                "description Desk 12",
                "spanning-tree portfast",
                "end",
            ]
        );
    }

    #[test]
    fn test_find_rejection_attributes_command() {
        let issued: Vec<String> = ["interface Gi1/0/5", "switchport voice vlan abc", "end"]
            .map(String::from)
            .to_vec();
        let output: Vec<String> = [
            "interface Gi1/0/5",
            "sw1(config-if)#",
            "switchport voice vlan abc",
            "                      ^",
            "% Invalid input detected at '^' marker.",
            "sw1(config-if)#",
            "end",
            "sw1#",
        ]
        .map(String::from)
        .to_vec();

        match find_rejection(&output, &issued, "Invalid input detected") {
            Some(DeviceError::Rejected { command, message }) => {
                assert_eq!(command, "switchport voice vlan abc");
                assert_eq!(message, "% Invalid input detected at '^' marker.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_find_rejection_without_echo() {
        let issued = vec!["write memory".to_string()];
        let output = vec!["% Invalid input detected at '^' marker.".to_string()];
        match find_rejection(&output, &issued, "Invalid input detected") {
            Some(DeviceError::Rejected { command, .. }) => assert_eq!(command, "write memory"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_find_rejection_clean_output() {
        let issued = vec!["interface Gi1/0/5".to_string(), "end".to_string()];
        let output = vec!["interface Gi1/0/5".to_string(), "sw1#".to_string()];
        assert!(find_rejection(&output, &issued, "Invalid input detected").is_none());
    }
}
