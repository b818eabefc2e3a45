// SPDX-License-Identifier: GPL-3.0-only

//! Sysfs USB gadget inspector.
//!
//! Two hardware generations are supported. Newer kernels expose the gadget
//! under `sys/devices/virtual/android_usb/android0/`:
//!
//! - `state` — `DISCONNECTED`, `CONNECTED` or `CONFIGURED`
//! - `functions` — comma-separated active function list
//! - `f_<name>` — one marker directory per compiled-in function
//!
//! Older kernels only provide a single-bit switch at
//! `sys/devices/virtual/switch/usb_configuration/state`, which is used as a
//! fallback for both the plugged and the configured checks.

use std::path::PathBuf;

use automount_contracts::UsbGadget;
use automount_types::UsbFunction;

use crate::props::PropertyDir;
use crate::sysfs;

/// Desired USB function configuration property.
pub const SYS_USB_CONFIG: &str = "sys.usb.config";
/// Persisted default USB function configuration property.
pub const PERSIST_SYS_USB_CONFIG: &str = "persist.sys.usb.config";

const GADGET_DIR: &str = "sys/devices/virtual/android_usb/android0";
const LEGACY_CONFIGURED: &str = "sys/devices/virtual/switch/usb_configuration/state";

const STATE_CONNECTED: &str = "CONNECTED";
const STATE_CONFIGURED: &str = "CONFIGURED";

/// `UsbGadget` backed by sysfs and the property store.
pub struct SysfsUsb {
    root: PathBuf,
    props: PropertyDir,
}

impl SysfsUsb {
    /// `root` is the filesystem root (`/` on a device; a scratch directory
    /// in tests).
    pub fn new(root: impl Into<PathBuf>, props: PropertyDir) -> Self {
        Self {
            root: root.into(),
            props,
        }
    }

    fn state_path(&self) -> PathBuf {
        self.root.join(GADGET_DIR).join("state")
    }

    fn functions_path(&self) -> PathBuf {
        self.root.join(GADGET_DIR).join("functions")
    }

    fn function_dir(&self, func: UsbFunction) -> PathBuf {
        self.root.join(GADGET_DIR).join(format!("f_{}", func.as_str()))
    }

    fn legacy_path(&self) -> PathBuf {
        self.root.join(LEGACY_CONFIGURED)
    }

    fn legacy_configured(&self) -> bool {
        let path = self.legacy_path();
        match sysfs::read_flag(&path) {
            Ok(flag) => flag,
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        }
    }

    /// Read the link state file and test it against the accepted values,
    /// falling back to the legacy switch when the file does not exist.
    fn state_matches(&self, accepted: &[&str]) -> bool {
        let path = self.state_path();
        if path.exists() {
            return match sysfs::read_trimmed(&path) {
                Ok(state) => accepted.contains(&state.as_str()),
                Err(e) => {
                    tracing::error!("{e}");
                    false
                }
            };
        }
        self.legacy_configured()
    }
}

impl UsbGadget for SysfsUsb {
    fn cable_plugged(&self) -> bool {
        self.state_matches(&[STATE_CONFIGURED, STATE_CONNECTED])
    }

    fn configured(&self) -> bool {
        self.state_matches(&[STATE_CONFIGURED])
    }

    fn active_functions(&self) -> Option<String> {
        let path = self.functions_path();
        if !path.exists() {
            return None;
        }
        match sysfs::read_trimmed(&path) {
            Ok(functions) => Some(functions),
            Err(e) => {
                tracing::error!("{e}");
                Some(String::new())
            }
        }
    }

    fn function_available(&self, func: UsbFunction) -> bool {
        self.function_dir(func).is_dir()
    }

    fn desired_config(&self) -> String {
        self.props.get(SYS_USB_CONFIG)
    }

    fn set_desired_config(&self, config: &str) {
        if let Err(e) = self.props.set(SYS_USB_CONFIG, config) {
            tracing::error!("failed to set {SYS_USB_CONFIG}: {e}");
        }
    }

    fn persisted_config(&self) -> String {
        self.props.get(PERSIST_SYS_USB_CONFIG)
    }
}
