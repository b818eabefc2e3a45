// SPDX-License-Identifier: GPL-3.0-only

use automount_types::AutomountStatus;

/// Bridge to the persisted user settings store.
///
/// Inbound: the initial per-volume sharing preference, read once when the
/// volume manager becomes ready (later changes arrive as events through the
/// public handle). Outbound: the aggregate status, published whenever it
/// changes.
pub trait SettingsBridge: Send {
    /// The persisted sharing preference for a volume, if one exists.
    fn sharing_enabled(&self, volume: &str) -> Option<bool>;

    /// Publish the aggregate status for UI consumption.
    fn publish_status(&self, status: AutomountStatus);
}
