// SPDX-License-Identifier: GPL-3.0-only

//! Parser for the static volume configuration file.
//!
//! The file adds volumes to the volume manager on devices that have no
//! physical card slot or dedicated partition. Format, one directive per
//! line:
//!
//! ```text
//! # comment
//! create <volume-name> <mount-point>
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Malformed lines
//! are logged and skipped; they never fail the whole file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SysError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConfigEntry {
    pub name: String,
    pub mount_point: PathBuf,
}

/// Parse volume configuration text.
pub fn parse(input: &str) -> Vec<VolumeConfigEntry> {
    let mut entries = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let directive = fields.next().expect("non-empty line has a first field");
        if directive != "create" {
            tracing::error!("volume config line {line_no}: unrecognized directive '{directive}'");
            continue;
        }

        let Some(name) = fields.next() else {
            tracing::error!("volume config line {line_no}: missing volume name");
            continue;
        };
        let Some(mount_point) = fields.next() else {
            tracing::error!("volume config line {line_no}: missing mount point for '{name}'");
            continue;
        };

        entries.push(VolumeConfigEntry {
            name: name.to_string(),
            mount_point: PathBuf::from(mount_point),
        });
    }

    entries
}

/// Load and parse a volume configuration file.
pub fn load(path: &Path) -> Result<Vec<VolumeConfigEntry>> {
    let input = fs::read_to_string(path).map_err(|source| SysError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&input))
}
