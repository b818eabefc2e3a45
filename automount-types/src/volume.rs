// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Mount state of a volume, as reported by the volume manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountState {
    /// No media in the slot.
    NoMedia,
    /// Media present, not mounted.
    #[default]
    Idle,
    /// Mount has been requested and is in flight.
    Pending,
    /// Filesystem check in progress.
    Checking,
    /// Mounted and usable by the system.
    Mounted,
    /// Unmount in flight.
    Unmounting,
    /// Format in flight.
    Formatting,
    /// Exposed to the USB host as mass storage.
    Shared,
}

impl MountState {
    pub fn as_str(self) -> &'static str {
        match self {
            MountState::NoMedia => "no_media",
            MountState::Idle => "idle",
            MountState::Pending => "pending",
            MountState::Checking => "checking",
            MountState::Mounted => "mounted",
            MountState::Unmounting => "unmounting",
            MountState::Formatting => "formatting",
            MountState::Shared => "shared",
        }
    }

    /// Whether the volume is mid-transition and no command should target it.
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            MountState::Pending
                | MountState::Checking
                | MountState::Unmounting
                | MountState::Formatting
        )
    }
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct VolumeFields {
    state: MountState,
    media_present: bool,
    mount_locked: bool,
    mount_point: PathBuf,
    sharing_enabled: bool,
    is_sharing: bool,
    is_formatting: bool,
    format_requested: bool,
    mount_requested: bool,
    unmount_requested: bool,
}

/// Shared handle to a volume managed by the volume manager.
///
/// The volume manager owns the lifecycle and the mount state; the automount
/// core only mutates the request/intent flags and observes state
/// transitions. At most one of the three request flags is an active intent
/// at a time: setting one clears the other two.
#[derive(Clone)]
pub struct Volume {
    inner: Arc<VolumeInner>,
}

struct VolumeInner {
    name: String,
    fields: Mutex<VolumeFields>,
}

impl Volume {
    pub fn new(name: impl Into<String>, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(VolumeInner {
                name: name.into(),
                fields: Mutex::new(VolumeFields {
                    mount_point: mount_point.into(),
                    media_present: true,
                    ..VolumeFields::default()
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn fields(&self) -> std::sync::MutexGuard<'_, VolumeFields> {
        // The mutex is uncontended: all access happens on the core's task.
        self.inner.fields.lock().expect("volume fields poisoned")
    }

    pub fn state(&self) -> MountState {
        self.fields().state
    }

    pub fn set_state(&self, state: MountState) {
        self.fields().state = state;
    }

    pub fn media_present(&self) -> bool {
        self.fields().media_present
    }

    pub fn set_media_present(&self, present: bool) {
        self.fields().media_present = present;
    }

    pub fn mount_locked(&self) -> bool {
        self.fields().mount_locked
    }

    pub fn set_mount_locked(&self, locked: bool) {
        self.fields().mount_locked = locked;
    }

    pub fn mount_point(&self) -> PathBuf {
        self.fields().mount_point.clone()
    }

    pub fn sharing_enabled(&self) -> bool {
        self.fields().sharing_enabled
    }

    pub fn set_sharing_enabled(&self, enabled: bool) {
        self.fields().sharing_enabled = enabled;
    }

    pub fn is_sharing(&self) -> bool {
        self.fields().is_sharing
    }

    pub fn set_is_sharing(&self, sharing: bool) {
        self.fields().is_sharing = sharing;
    }

    pub fn is_formatting(&self) -> bool {
        self.fields().is_formatting
    }

    pub fn set_is_formatting(&self, formatting: bool) {
        self.fields().is_formatting = formatting;
    }

    pub fn format_requested(&self) -> bool {
        self.fields().format_requested
    }

    pub fn mount_requested(&self) -> bool {
        self.fields().mount_requested
    }

    pub fn unmount_requested(&self) -> bool {
        self.fields().unmount_requested
    }

    /// Set or clear the format request. Setting it clears the other two
    /// request flags.
    pub fn set_format_requested(&self, requested: bool) {
        let mut fields = self.fields();
        fields.format_requested = requested;
        if requested {
            fields.mount_requested = false;
            fields.unmount_requested = false;
        }
    }

    /// Set or clear the mount request. Setting it clears the other two
    /// request flags.
    pub fn set_mount_requested(&self, requested: bool) {
        let mut fields = self.fields();
        fields.mount_requested = requested;
        if requested {
            fields.format_requested = false;
            fields.unmount_requested = false;
        }
    }

    /// Set or clear the unmount request. Setting it clears the other two
    /// request flags.
    pub fn set_unmount_requested(&self, requested: bool) {
        let mut fields = self.fields();
        fields.unmount_requested = requested;
        if requested {
            fields.format_requested = false;
            fields.mount_requested = false;
        }
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields();
        f.debug_struct("Volume")
            .field("name", &self.inner.name)
            .field("state", &fields.state)
            .field("media_present", &fields.media_present)
            .field("mount_locked", &fields.mount_locked)
            .field("sharing_enabled", &fields.sharing_enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_flags_are_mutually_exclusive() {
        let vol = Volume::new("sdcard", "/mnt/sdcard");

        vol.set_format_requested(true);
        assert!(vol.format_requested());

        vol.set_mount_requested(true);
        assert!(vol.mount_requested());
        assert!(!vol.format_requested());

        vol.set_unmount_requested(true);
        assert!(vol.unmount_requested());
        assert!(!vol.mount_requested());
        assert!(!vol.format_requested());
    }

    #[test]
    fn clearing_a_request_leaves_the_others_alone() {
        let vol = Volume::new("sdcard", "/mnt/sdcard");

        vol.set_unmount_requested(true);
        vol.set_format_requested(false);
        assert!(vol.unmount_requested());
    }

    #[test]
    fn new_volume_starts_idle_with_media() {
        let vol = Volume::new("sdcard", "/mnt/sdcard");
        assert_eq!(vol.state(), MountState::Idle);
        assert!(vol.media_present());
        assert!(!vol.mount_locked());
        assert!(!vol.sharing_enabled());
    }

    #[test]
    fn transitional_states() {
        assert!(MountState::Unmounting.is_transitional());
        assert!(MountState::Formatting.is_transitional());
        assert!(!MountState::Mounted.is_transitional());
        assert!(!MountState::Shared.is_transitional());
        assert!(!MountState::Idle.is_transitional());
    }

    #[test]
    fn clones_share_state() {
        let vol = Volume::new("sdcard", "/mnt/sdcard");
        let alias = vol.clone();
        alias.set_state(MountState::Mounted);
        assert_eq!(vol.state(), MountState::Mounted);
    }
}
