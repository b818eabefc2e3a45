// SPDX-License-Identifier: GPL-3.0-only

use automount_contracts::{MtpBridge, MtpServer, MtpStorage};
use automount_types::Volume;

/// A running MTP server plus its per-volume storage adapters.
///
/// Dropping the session detaches every storage and then releases the
/// server; field order matters for that.
pub(crate) struct MtpSession {
    storages: Vec<Box<dyn MtpStorage>>,
    _server: Box<dyn MtpServer>,
}

impl MtpSession {
    pub fn start(bridge: &dyn MtpBridge, volumes: &[Volume]) -> Self {
        tracing::info!("starting mtp server with {} storages", volumes.len());
        let server = bridge.start();
        let storages = volumes
            .iter()
            .map(|volume| server.attach_storage(volume))
            .collect();
        Self {
            storages,
            _server: server,
        }
    }

    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }
}
