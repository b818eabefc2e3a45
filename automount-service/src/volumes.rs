// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;
use std::sync::Mutex;

use automount_contracts::{CommandOutcome, CommandReply, VolumeDirectory, VolumeOp};
use automount_types::{MountState, Volume};

/// Volume directory for statically configured volumes.
///
/// Used on devices whose volumes come from `volume.cfg` rather than a
/// volume daemon: registered volumes are reported as already mounted, and
/// commands complete immediately and successfully, with the state
/// transition applied to the volume handle before the reply is delivered
/// (the same ordering the volume daemon guarantees).
#[derive(Default)]
pub struct StaticDirectory {
    volumes: Mutex<Vec<Volume>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VolumeDirectory for StaticDirectory {
    fn is_ready(&self) -> bool {
        true
    }

    fn volumes(&self) -> Vec<Volume> {
        self.volumes.lock().expect("volume list poisoned").clone()
    }

    fn find(&self, name: &str) -> Option<Volume> {
        self.volumes
            .lock()
            .expect("volume list poisoned")
            .iter()
            .find(|volume| volume.name() == name)
            .cloned()
    }

    fn issue(&self, volume: &Volume, op: VolumeOp, reply: CommandReply) {
        match op {
            VolumeOp::Mount => {
                volume.set_state(MountState::Mounted);
                volume.set_mount_requested(false);
                volume.set_is_sharing(false);
                volume.set_is_formatting(false);
            }
            VolumeOp::Unmount => volume.set_state(MountState::Idle),
            VolumeOp::Share => volume.set_state(MountState::Shared),
            VolumeOp::Unshare => volume.set_state(MountState::Idle),
            VolumeOp::Format => {
                volume.set_state(MountState::Idle);
                // The format intent is consumed once the command runs; the
                // is-formatting flag stays up until the volume is mounted
                // again.
                volume.set_format_requested(false);
            }
        }
        tracing::debug!("{op} on {} completed", volume.name());
        reply.deliver(CommandOutcome::Success);
    }

    fn register_volume(&self, name: &str, mount_point: &Path) {
        let mut volumes = self.volumes.lock().expect("volume list poisoned");
        if volumes.iter().any(|volume| volume.name() == name) {
            tracing::warn!("volume {name} already registered; ignoring");
            return;
        }
        let volume = Volume::new(name, mount_point);
        volume.set_state(MountState::Mounted);
        tracing::info!("registered volume {name} at {}", mount_point.display());
        volumes.push(volume);
    }
}
