// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregate automounter status published for UI consumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomountStatus {
    /// No USB personality is enabled.
    #[default]
    Disabled,
    /// A personality is enabled (shared or serving, or waiting for the
    /// cable).
    Enabled,
    /// Sharing is pending because open file handles block an unmount.
    FilesOpen,
}

impl AutomountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AutomountStatus::Disabled => "disabled",
            AutomountStatus::Enabled => "enabled",
            AutomountStatus::FilesOpen => "files-open",
        }
    }
}

impl fmt::Display for AutomountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
