// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::PathBuf;

use crate::error::{Result, SysError};

/// File-per-key property store.
///
/// Each property lives in a file named after its key under one directory,
/// mirroring the platform property service surface. Reads of a missing key
/// return the empty string, like the platform `property_get` with an empty
/// default.
#[derive(Debug, Clone)]
pub struct PropertyDir {
    dir: PathBuf,
}

impl PropertyDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read a property, returning `""` when it is unset. Read failures
    /// other than absence are logged and reported as unset.
    pub fn get(&self, key: &str) -> String {
        let path = self.dir.join(key);
        match fs::read_to_string(&path) {
            Ok(raw) => raw.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                tracing::error!("failed to read property {key} from {}: {e}", path.display());
                String::new()
            }
        }
    }

    /// Write a property, creating the store directory if needed.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Err(source) = fs::create_dir_all(&self.dir) {
            return Err(SysError::Write {
                path: self.dir.clone(),
                source,
            });
        }
        let path = self.dir.join(key);
        fs::write(&path, value).map_err(|source| SysError::Write { path, source })
    }
}
