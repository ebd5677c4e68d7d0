//! Device sessions.
//!
//! [`DeviceSession`] is the seam between device operations and the wire:
//! [`SshSession`] drives a real shell, tests substitute a recording fake.

mod builder;
mod privilege;
mod response;
mod session;

pub use builder::SessionBuilder;
pub use privilege::{PrivilegeManager, Transition};
pub use response::Response;
pub use session::SshSession;

use std::future::Future;

use crate::error::Result;

/// An open command channel to one device.
pub trait DeviceSession: Send {
    /// Run a read-only command at the default privilege level and return
    /// its output lines, echo and prompt removed.
    fn run_command(&mut self, command: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Enter configuration mode and send `lines` in order. Returns every
    /// raw output line, including the echoed commands, so callers can tell
    /// which line the device rejected.
    fn run_config_sequence(
        &mut self,
        lines: &[String],
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Whether the connection is still usable.
    fn is_alive(&self) -> bool;
}
