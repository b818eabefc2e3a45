// SPDX-License-Identifier: GPL-3.0-only

use automount_types::Volume;

/// Factory for MTP protocol server instances.
pub trait MtpBridge: Send {
    /// Start a server. The returned handle keeps it running; dropping the
    /// handle stops it.
    fn start(&self) -> Box<dyn MtpServer>;
}

/// A running MTP server.
pub trait MtpServer: Send {
    /// Expose a volume to the server as one storage. The storage is
    /// removed when the returned adapter is dropped.
    fn attach_storage(&self, volume: &Volume) -> Box<dyn MtpStorage>;
}

/// A storage adapter bound to a running server. Detaches on drop.
pub trait MtpStorage: Send {}
