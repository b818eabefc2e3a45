// SPDX-License-Identifier: GPL-3.0-only

//! automountd - USB mass-storage/MTP automount daemon
//!
//! Wires the automount core to the real system surfaces (sysfs gadget
//! state, the property store, procfs) and keeps it running until a
//! shutdown signal arrives.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use automount_contracts::{MtpBridge, MtpServer, MtpStorage, UsbGadget, VolumeDirectory};
use automount_service::{Automounter, Collaborators, StaticDirectory};
use automount_sys::{ProcScanner, PropertyDir, PropertySettings, SysfsUsb, volume_config};
use automount_types::{AutomountMode, Volume};

#[derive(Parser)]
#[command(name = "automountd", about = "USB mass-storage/MTP automount daemon")]
struct Args {
    /// Filesystem root holding the sysfs USB gadget interface.
    #[arg(long, default_value = "/")]
    sysfs_root: PathBuf,

    /// Directory backing the property store.
    #[arg(long, default_value = "/data/property")]
    property_dir: PathBuf,

    /// Static volume configuration file.
    #[arg(long, default_value = "/system/etc/volume.cfg")]
    volume_config: PathBuf,

    /// Initial automount mode.
    #[arg(long, default_value = "disable")]
    mode: AutomountMode,

    /// Poll interval for cable state changes, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    cable_poll_ms: u64,
}

// Placeholder until the platform MTP transport is wired in: storages are
// tracked and logged, no protocol traffic happens.
struct LogMtpBridge;

struct LogMtpServer;

struct LogMtpStorage {
    volume: String,
}

impl MtpBridge for LogMtpBridge {
    fn start(&self) -> Box<dyn MtpServer> {
        tracing::info!("mtp server started");
        Box::new(LogMtpServer)
    }
}

impl MtpServer for LogMtpServer {
    fn attach_storage(&self, volume: &Volume) -> Box<dyn MtpStorage> {
        tracing::info!("mtp storage attached for {}", volume.name());
        Box::new(LogMtpStorage {
            volume: volume.name().to_string(),
        })
    }
}

impl Drop for LogMtpServer {
    fn drop(&mut self) {
        tracing::info!("mtp server stopped");
    }
}

impl MtpStorage for LogMtpStorage {}

impl Drop for LogMtpStorage {
    fn drop(&mut self) {
        tracing::info!("mtp storage detached for {}", self.volume);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("automountd=info,automount_service=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("starting automountd v{}", env!("CARGO_PKG_VERSION"));

    if unsafe { libc::geteuid() } != 0 {
        // Open-file scanning can only see our own processes without root;
        // everything else still works, which is enough for development
        // against a scratch sysfs root.
        tracing::warn!("not running as root; open-file detection will be incomplete");
    }

    let props = PropertyDir::new(&args.property_dir);
    let usb = SysfsUsb::new(&args.sysfs_root, props.clone());

    let directory = StaticDirectory::new();
    match volume_config::load(&args.volume_config) {
        Ok(entries) => {
            for entry in entries {
                directory.register_volume(&entry.name, &entry.mount_point);
            }
        }
        Err(e) => tracing::info!("no volume configuration loaded: {e}"),
    }

    let (mounter, task) = Automounter::spawn(Collaborators {
        usb: Box::new(usb),
        volumes: Box::new(directory),
        mtp: Box::new(LogMtpBridge),
        scanner: Box::new(ProcScanner::new()),
        settings: Box::new(PropertySettings::new(props.clone())),
    });

    mounter.volume_manager_ready();
    mounter.set_mode(args.mode);
    tracing::info!("automounter running in mode '{}'", args.mode);

    // Cable uevents normally arrive over netlink; polling the sysfs state
    // covers hosts without a uevent listener.
    let cable_usb = SysfsUsb::new(&args.sysfs_root, props);
    let cable_mounter = mounter.clone();
    let poll_interval = Duration::from_millis(args.cable_poll_ms.max(100));
    let cable_task = tokio::spawn(async move {
        let mut plugged = cable_usb.cable_plugged();
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            let now = cable_usb.cable_plugged();
            if now != plugged {
                tracing::info!("usb cable {}", if now { "plugged" } else { "unplugged" });
                plugged = now;
                cable_mounter.usb_cable_event();
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal");

    cable_task.abort();
    mounter.shutdown();
    let _ = task.await;

    tracing::info!("automountd shut down");
    Ok(())
}
