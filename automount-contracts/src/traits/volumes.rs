// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use automount_types::Volume;

use crate::command::{CommandReply, VolumeOp};

/// The volume manager as seen by the automount core.
///
/// Implementations own the volume lifecycle and execute the low-level
/// mount/unmount/share/unshare/format commands. State transitions driven by
/// a command must be reflected on the `Volume` handle before the reply is
/// delivered; implementations also clear the is-sharing/is-formatting
/// intent flags when the corresponding transition completes.
pub trait VolumeDirectory: Send {
    /// Whether the manager has finished enumerating volumes. Before this
    /// returns true the core does nothing.
    fn is_ready(&self) -> bool;

    /// All known volumes, in a stable iteration order.
    fn volumes(&self) -> Vec<Volume>;

    /// Look up a volume by name.
    fn find(&self, name: &str) -> Option<Volume>;

    /// Execute a command against a volume. The reply must be delivered
    /// exactly once. Only one command is ever in flight; the core
    /// guarantees it does not issue a second before the reply arrives.
    fn issue(&self, volume: &Volume, op: VolumeOp, reply: CommandReply);

    /// Register a statically configured volume (from `volume.cfg`),
    /// reported as already mounted.
    fn register_volume(&self, name: &str, mount_point: &Path);
}
