//! # netconfig
//!
//! Host directory and vendor-neutral command layer for Cisco network
//! devices.
//!
//! Hosts come from one of two directories: a local store with validation
//! and batch import, or a read-only Netbox inventory. A [`DeviceHandler`]
//! binds a host to the command set of its OS family (IOS, IOS-XE, NX-OS,
//! ASA) and runs operations over an SSH [`DeviceSession`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use netconfig::audit::LogAuditSink;
//! use netconfig::config::Settings;
//! use netconfig::host::HostId;
//! use netconfig::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netconfig::Error> {
//!     let settings = Settings::load("netconfig.toml")?;
//!     let directory = settings.directory(Arc::new(LogAuditSink))?;
//!
//!     let handler = directory.handler(HostId(4)).await?;
//!     let credentials = settings.credentials_for(handler.host())?;
//!     let mut session = SessionBuilder::for_handler(&handler)
//!         .ssh_settings(&settings.ssh)
//!         .credentials(&credentials)
//!         .connect()
//!         .await?;
//!
//!     handler.disable_interface(&mut session, "GigabitEthernet1/0/12").await?;
//!     for line in handler.pull_interface_status(&mut session).await? {
//!         println!("{line}");
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod channel;
pub mod config;
pub mod device;
pub mod directory;
pub mod driver;
pub mod error;
pub mod host;
pub mod import;
pub mod platform;
pub mod transport;

pub use device::DeviceHandler;
pub use directory::HostDirectory;
pub use driver::{DeviceSession, SessionBuilder, SshSession};
pub use error::{Error, Result};
pub use host::{DeviceType, HostId, HostRecord, IosType};
pub use platform::{DeviceCommandSet, PlatformDefinition, PrivilegeLevel};
