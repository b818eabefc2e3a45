// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// A USB gadget function (a device-side personality advertised to the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsbFunction {
    /// The debug bridge. Never selected by the automounter, but its
    /// presence in the function list must be preserved across rewrites.
    Adb,
    /// Media Transfer Protocol.
    Mtp,
    /// USB mass storage.
    MassStorage,
}

impl UsbFunction {
    /// The kernel's name for the function, as it appears in the
    /// comma-separated function list and in the `f_<name>` sysfs directory.
    pub fn as_str(self) -> &'static str {
        match self {
            UsbFunction::Adb => "adb",
            UsbFunction::Mtp => "mtp",
            UsbFunction::MassStorage => "mass_storage",
        }
    }

    /// Whether a comma-separated function list names this function.
    pub fn in_list(self, list: &str) -> bool {
        list.split(',').any(|token| token.trim() == self.as_str())
    }
}

impl fmt::Display for UsbFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
