//! Command-line front end for the host directory and device operations.
//!
//! ```text
//! netconfig --config netconfig.toml hosts list
//! netconfig hosts import hosts.csv
//! netconfig device 4 edit Gi1/0/12 --data-vlan 20 --voice-vlan 120
//! netconfig device 4 status
//! ```

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::error;

use netconfig::audit::LogAuditSink;
use netconfig::config::Settings;
use netconfig::device::InterfaceEdit;
use netconfig::host::{DeviceType, HostId, HostPatch, HostRecord, IosType, NewHost};
use netconfig::import::{DuplicateScope, ImportOptions};
use netconfig::{DeviceHandler, HostDirectory, SessionBuilder};

#[derive(Parser, Debug)]
#[command(name = "netconfig", version, about = "Manage network hosts and their configuration")]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, default_value = "netconfig.toml")]
    config: PathBuf,

    /// Name recorded in the audit log
    #[arg(long)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host directory operations
    Hosts {
        #[command(subcommand)]
        action: HostsAction,
    },

    /// Operations against one device
    Device {
        /// Host id in the directory
        id: HostId,

        #[command(subcommand)]
        action: DeviceAction,
    },
}

#[derive(Subcommand, Debug)]
enum HostsAction {
    /// List all hosts
    List {
        /// Only hosts of this OS type (ios, ios-xe, nx-os, asa)
        #[arg(long)]
        os: Option<IosType>,
    },

    /// Show one host
    Show { id: HostId },

    /// Add a host
    Add {
        hostname: String,
        ipv4_addr: Ipv4Addr,
        /// switch, router, or firewall
        device_type: DeviceType,
        /// ios, ios-xe, nx-os, or asa
        os: IosType,
        /// Use device-specific credentials
        #[arg(long)]
        local_creds: bool,
    },

    /// Change fields of a host
    Edit {
        id: HostId,
        #[arg(long)]
        hostname: Option<String>,
        #[arg(long)]
        ipv4_addr: Option<Ipv4Addr>,
        #[arg(long)]
        device_type: Option<DeviceType>,
        #[arg(long)]
        os: Option<IosType>,
        #[arg(long)]
        local_creds: Option<bool>,
    },

    /// Remove a host
    Remove { id: HostId },

    /// Import hosts from a CSV file (hostname,ipv4,type,os[,local_creds])
    Import {
        file: PathBuf,
        /// Only reject duplicates already in the directory
        #[arg(long)]
        store_only_duplicates: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DeviceAction {
    /// Bring an interface up
    Enable { interface: String },

    /// Shut an interface down
    Disable { interface: String },

    /// Change interface VLANs and add raw config lines
    Edit {
        interface: String,
        /// Access VLAN, 0 leaves it unchanged
        #[arg(long, default_value = "0")]
        data_vlan: String,
        /// Voice VLAN, 0 leaves it unchanged
        #[arg(long, default_value = "0")]
        voice_vlan: String,
        /// Extra lines, '&' separates lines and '+' stands for a space
        #[arg(long, default_value = "")]
        extra: String,
    },

    /// Save the running configuration
    Save,

    /// Hardware inventory
    Inventory,

    /// Software version
    Version,

    /// Interface status table
    Status,

    /// Run a show command
    Show { command: Vec<String> },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> netconfig::Result<()> {
    let settings = Settings::load(&cli.config)?;
    let directory = settings.directory(Arc::new(LogAuditSink))?;
    let actor = cli.actor.as_deref();

    match cli.command {
        Command::Hosts { action } => hosts(&directory, action, actor).await,
        Command::Device { id, action } => {
            let handler = directory.handler(id).await?;
            device(&settings, &handler, action).await
        }
    }
}

async fn hosts(
    directory: &HostDirectory,
    action: HostsAction,
    actor: Option<&str>,
) -> netconfig::Result<()> {
    match action {
        HostsAction::List { os } => {
            let hosts = match os {
                Some(ios_type) => directory.list_by_ios_type(ios_type).await?,
                None => directory.list().await?,
            };
            for host in &hosts {
                print_host(host);
            }
        }
        HostsAction::Show { id } => print_host(&directory.get(id).await?),
        HostsAction::Add {
            hostname,
            ipv4_addr,
            device_type,
            os,
            local_creds,
        } => {
            let host = NewHost::new(hostname, ipv4_addr, device_type, os).with_local_creds(local_creds);
            let id = directory.add(host, actor)?;
            println!("{id}");
        }
        HostsAction::Edit {
            id,
            hostname,
            ipv4_addr,
            device_type,
            os,
            local_creds,
        } => {
            let mut patch = HostPatch::new();
            if let Some(hostname) = hostname {
                patch = patch.hostname(hostname);
            }
            if let Some(addr) = ipv4_addr {
                patch = patch.ipv4_addr(addr);
            }
            if let Some(device_type) = device_type {
                patch = patch.device_type(device_type);
            }
            if let Some(os) = os {
                patch = patch.ios_type(os);
            }
            if let Some(local_creds) = local_creds {
                patch = patch.local_creds(local_creds);
            }
            print_host(&directory.edit(id, &patch, actor)?);
        }
        HostsAction::Remove { id } => directory.remove(id, actor)?,
        HostsAction::Import {
            file,
            store_only_duplicates,
        } => {
            let input = std::fs::read_to_string(&file).map_err(|source| {
                netconfig::error::ConfigError::Read {
                    path: file.display().to_string(),
                    source,
                }
            })?;
            let options = ImportOptions {
                duplicate_scope: if store_only_duplicates {
                    DuplicateScope::StoreOnly
                } else {
                    DuplicateScope::StoreAndBatch
                },
            };
            let outcome = directory.import_batch(&input, options, actor)?;
            for row in &outcome.rejected {
                println!("rejected {}: {}", row.hostname, row.reason);
            }
            println!("{}", outcome.summary());
        }
    }
    Ok(())
}

async fn device(
    settings: &Settings,
    handler: &DeviceHandler,
    action: DeviceAction,
) -> netconfig::Result<()> {
    let credentials = settings.credentials_for(handler.host())?;
    let mut session = SessionBuilder::for_handler(handler)
        .ssh_settings(&settings.ssh)
        .credentials(&credentials)
        .connect()
        .await?;

    let result = run_device_action(handler, &mut session, action).await;
    let closed = session.close().await;
    result.and(closed)
}

async fn run_device_action(
    handler: &DeviceHandler,
    session: &mut netconfig::driver::SshSession,
    action: DeviceAction,
) -> netconfig::Result<()> {
    let lines = match action {
        DeviceAction::Enable { interface } => {
            handler.enable_interface(session, &interface).await?;
            Vec::new()
        }
        DeviceAction::Disable { interface } => {
            handler.disable_interface(session, &interface).await?;
            Vec::new()
        }
        DeviceAction::Edit {
            interface,
            data_vlan,
            voice_vlan,
            extra,
        } => {
            let edit = InterfaceEdit::new(interface)
                .data_vlan(data_vlan)
                .voice_vlan(voice_vlan)
                .extra_lines(extra);
            handler.edit_interface(session, &edit).await?;
            Vec::new()
        }
        DeviceAction::Save => {
            handler.save_configuration(session).await?;
            Vec::new()
        }
        DeviceAction::Inventory => handler.pull_inventory(session).await?,
        DeviceAction::Version => handler.pull_version(session).await?,
        DeviceAction::Status => handler.pull_interface_status(session).await?,
        DeviceAction::Show { command } => handler.run_show(session, &command.join(" ")).await?,
    };
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn print_host(host: &HostRecord) {
    println!(
        "{:>5}  {:<24} {:<15} {:<8} {:<10} {}",
        host.id,
        host.hostname,
        host.ipv4_addr,
        host.device_type.map(|t| t.as_str()).unwrap_or("-"),
        host.ios_type,
        if host.local_creds { "local" } else { "shared" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_filter(args: &[&str]) -> Result<Option<IosType>, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Command::Hosts {
                action: HostsAction::List { os },
            } => Ok(os),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_os_filter_parses_os_names() {
        assert_eq!(
            list_filter(&["netconfig", "hosts", "list", "--os", "nx-os"]).unwrap(),
            Some(IosType::CiscoNxos)
        );
        assert_eq!(
            list_filter(&["netconfig", "hosts", "list", "--os", "cisco_ios"]).unwrap(),
            Some(IosType::CiscoIos)
        );
        assert_eq!(list_filter(&["netconfig", "hosts", "list"]).unwrap(), None);
    }

    #[test]
    fn test_list_os_filter_rejects_unknown_os() {
        assert!(list_filter(&["netconfig", "hosts", "list", "--os", "junos"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
