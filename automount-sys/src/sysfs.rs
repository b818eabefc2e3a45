// SPDX-License-Identifier: GPL-3.0-only

//! Small sysfs read helpers. Sysfs attribute files hold a single value
//! followed by a newline.

use std::fs;
use std::path::Path;

use crate::error::{Result, SysError};

/// Read a sysfs attribute as a trimmed string.
pub fn read_trimmed(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).map_err(|source| SysError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw.trim().to_string())
}

/// Read a single-bit sysfs flag. Any value other than `0` counts as set.
pub fn read_flag(path: &Path) -> Result<bool> {
    let value = read_trimmed(path)?;
    Ok(!matches!(value.as_str(), "" | "0"))
}
