//! Vendor-neutral device operations.
//!
//! A [`DeviceHandler`] binds a [`HostRecord`](crate::host::HostRecord) to
//! the command set of its OS family and runs operations over any
//! [`DeviceSession`](crate::driver::DeviceSession). Every configuration
//! change is one sequence; if it fails midway it is retried from the start,
//! never resumed.

pub mod commands;
mod handler;

pub use commands::{InterfaceEdit, decode_extra_lines};
pub use handler::DeviceHandler;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    use super::*;
    use crate::driver::DeviceSession;
    use crate::error::{DeviceError, Error, Result, SessionError};
    use crate::host::{DeviceType, HostId, HostRecord, IosType, NewHost};

    const MARKER_LINE: &str = "% Invalid input detected at '^' marker.";

    /// Session fake that records what it is asked to send.
    #[derive(Default)]
    struct RecordingSession {
        dead: bool,
        commands: Vec<String>,
        sequences: Vec<Vec<String>>,
        outputs: HashMap<String, Vec<String>>,
        reject: Option<String>,
    }

    impl RecordingSession {
        fn with_output(mut self, command: &str, output: &str) -> Self {
            self.outputs.insert(
                command.to_string(),
                output.lines().map(str::to_string).collect(),
            );
            self
        }

        fn rejecting(mut self, line: &str) -> Self {
            self.reject = Some(line.to_string());
            self
        }
    }

    impl DeviceSession for RecordingSession {
        async fn run_command(&mut self, command: &str) -> Result<Vec<String>> {
            self.commands.push(command.to_string());
            if self.reject.as_deref() == Some(command) {
                return Ok(vec![MARKER_LINE.to_string()]);
            }
            Ok(self.outputs.get(command).cloned().unwrap_or_default())
        }

        async fn run_config_sequence(&mut self, lines: &[String]) -> Result<Vec<String>> {
            self.sequences.push(lines.to_vec());
            let mut output = Vec::new();
            for line in lines {
                output.push(line.clone());
                if self.reject.as_deref() == Some(line.as_str()) {
                    output.push("    ^".to_string());
                    output.push(MARKER_LINE.to_string());
                }
                output.push("sw1(config-if)#".to_string());
            }
            Ok(output)
        }

        fn is_alive(&self) -> bool {
            !self.dead
        }
    }

    fn host(ios_type: IosType) -> HostRecord {
        NewHost::new(
            "sw1",
            Ipv4Addr::new(10, 0, 0, 1),
            DeviceType::Switch,
            ios_type,
        )
        .into_record(HostId(1))
    }

    fn handler(ios_type: IosType) -> DeviceHandler {
        DeviceHandler::new(host(ios_type)).unwrap()
    }

    #[test]
    fn test_unknown_os_type_is_unsupported() {
        let mut record = host(IosType::CiscoIos);
        record.ios_type = IosType::Unknown;
        assert!(matches!(
            DeviceHandler::new(record),
            Err(Error::Device(DeviceError::UnsupportedPlatform { .. }))
        ));
    }

    #[tokio::test]
    async fn test_save_configuration_per_family() {
        for ios_type in IosType::KNOWN {
            let mut session = RecordingSession::default();
            handler(ios_type)
                .save_configuration(&mut session)
                .await
                .unwrap();

            let expected = if ios_type == IosType::CiscoNxos {
                "copy running-config startup-config"
            } else {
                "write memory"
            };
            assert_eq!(session.commands, vec![expected], "{ios_type}");
        }
    }

    #[tokio::test]
    async fn test_enable_and_disable_interface() {
        let handler = handler(IosType::CiscoXe);
        let mut session = RecordingSession::default();

        handler
            .enable_interface(&mut session, "Gi1/0/3")
            .await
            .unwrap();
        handler
            .disable_interface(&mut session, "Gi1/0/3")
            .await
            .unwrap();

        assert_eq!(
            session.sequences,
            vec![
                vec!["interface Gi1/0/3", "no shutdown", "end"],
                vec!["interface Gi1/0/3", "shutdown", "end"],
            ]
        );
    }

    #[tokio::test]
    async fn test_edit_interface_rejected_line() {
        let handler = handler(IosType::CiscoIos);
        let mut session = RecordingSession::default().rejecting("switchport voice vlan abc");
        let edit = InterfaceEdit::new("Gi1/0/3")
            .data_vlan("10")
            .voice_vlan("abc");

        let err = handler.edit_interface(&mut session, &edit).await.unwrap_err();
        match err {
            Error::Device(DeviceError::Rejected { command, message }) => {
                assert_eq!(command, "switchport voice vlan abc");
                assert_eq!(message, MARKER_LINE);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.sequences[0].len(), 4);
    }

    #[tokio::test]
    async fn test_dead_session_is_session_error() {
        let handler = handler(IosType::CiscoAsa);
        let mut session = RecordingSession {
            dead: true,
            ..Default::default()
        };

        let err = handler
            .enable_interface(&mut session, "Gi0/1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotConnected)));
        assert!(err.is_session_failure());
        assert!(session.sequences.is_empty());
    }

    #[tokio::test]
    async fn test_pull_inventory_is_unparsed() {
        let raw = "NAME: \"1\", DESCR: \"WS-C3850-48P\"\nPID: WS-C3850-48P  , VID: V02  , SN: FOC1234X0AB";
        let handler = handler(IosType::CiscoIos);
        let mut session = RecordingSession::default().with_output("show inventory", raw);

        let lines = handler.pull_inventory(&mut session).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "PID: WS-C3850-48P  , VID: V02  , SN: FOC1234X0AB");
    }

    #[tokio::test]
    async fn test_pull_version() {
        let handler = handler(IosType::CiscoNxos);
        let mut session = RecordingSession::default()
            .with_output("show version", "Cisco Nexus Operating System (NX-OS) Software");
        let lines = handler.pull_version(&mut session).await.unwrap();
        assert_eq!(lines, vec!["Cisco Nexus Operating System (NX-OS) Software"]);
    }

    #[tokio::test]
    async fn test_pull_interface_status_ios() {
        let raw = "\
Interface              IP-Address      OK? Method Status                Protocol
Vlan1                  10.1.1.2        YES NVRAM  up                    up
GigabitEthernet0/1     unassigned      YES unset  administratively down down";
        let handler = handler(IosType::CiscoIos);
        let mut session = RecordingSession::default().with_output("show ip interface brief", raw);

        let records = handler.pull_interface_status(&mut session).await.unwrap();
        assert_eq!(
            records,
            vec![
                "Vlan1,10.1.1.2,up,up",
                "GigabitEthernet0/1,unassigned,administratively down,down",
            ]
        );
    }

    #[tokio::test]
    async fn test_pull_interface_status_nxos() {
        let raw = "\
--------------------------------------------------------------------------------
Port          Name               Status    Vlan      Duplex  Speed   Type
--------------------------------------------------------------------------------
Eth1/1 connected 1 full  10 SFP-1000BaseT
Port-channel1 connected trunk full 10G --";
        let handler = handler(IosType::CiscoNxos);
        let mut session = RecordingSession::default().with_output("show interface status", raw);

        let records = handler.pull_interface_status(&mut session).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], "Eth1/1,connected,1 full  10 SFP-1000BaseT");
        assert!(records[1].starts_with("Port-channel1,connected,"));
    }

    #[tokio::test]
    async fn test_run_show_only_allows_show() {
        let handler = handler(IosType::CiscoIos);
        let mut session = RecordingSession::default().with_output("show clock", "10:00:00 UTC");

        assert_eq!(
            handler.run_show(&mut session, "show clock").await.unwrap(),
            vec!["10:00:00 UTC"]
        );
        for command in ["reload", "configure terminal", "show clock\nreload", ""] {
            let err = handler.run_show(&mut session, command).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Device(DeviceError::CommandNotAllowed { .. })
            ));
        }
        assert_eq!(session.commands, vec!["show clock"]);
    }

    #[tokio::test]
    async fn test_show_rejection() {
        let handler = handler(IosType::CiscoIos);
        let mut session = RecordingSession::default().rejecting("write memory");
        let err = handler.save_configuration(&mut session).await.unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::Rejected { .. })));
    }
}
