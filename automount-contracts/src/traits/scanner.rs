// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use automount_types::OpenFileEntry;

/// Finds open file handles under a mount point before an unmount is
/// attempted.
pub trait OpenFileScanner: Send {
    /// All open file handles whose path is under `mount_point`. An empty
    /// result means the unmount can proceed.
    fn open_files_under(&self, mount_point: &Path) -> Vec<OpenFileEntry>;
}
