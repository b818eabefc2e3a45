// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-wide automount policy, set by the user or system settings.
///
/// The state machine reads the mode and may coerce it: a Disable request
/// while UMS is active and the cable is plugged in becomes
/// `DisableWhenUnplugged`, because forcing an unshare on a live USB link is
/// unreliable on real hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomountMode {
    /// Nothing is shared and no USB personality is requested.
    Disable,
    /// Expose volumes as USB mass storage.
    EnableUms,
    /// Keep the current personality until the cable is unplugged, then
    /// disable.
    DisableWhenUnplugged,
    /// Run the MTP server.
    EnableMtp,
}

impl AutomountMode {
    /// Whether the mode actively requests a USB personality.
    pub fn is_enabled(self) -> bool {
        matches!(self, AutomountMode::EnableUms | AutomountMode::EnableMtp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AutomountMode::Disable => "disable",
            AutomountMode::EnableUms => "enable-ums",
            AutomountMode::DisableWhenUnplugged => "disable-when-unplugged",
            AutomountMode::EnableMtp => "enable-mtp",
        }
    }
}

impl fmt::Display for AutomountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown automount mode: {0}")]
pub struct ModeParseError(String);

impl FromStr for AutomountMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(AutomountMode::Disable),
            "enable-ums" => Ok(AutomountMode::EnableUms),
            "disable-when-unplugged" => Ok(AutomountMode::DisableWhenUnplugged),
            "enable-mtp" => Ok(AutomountMode::EnableMtp),
            other => Err(ModeParseError(other.to_string())),
        }
    }
}
