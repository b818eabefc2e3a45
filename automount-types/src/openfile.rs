// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An open file handle found under a mount point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFileEntry {
    /// Process holding the file open.
    pub pid: i32,
    /// Path of the open file.
    pub path: PathBuf,
    /// Short command name of the process.
    pub command: String,
    /// Resolved executable path, when readable.
    pub exe: Option<PathBuf>,
}
