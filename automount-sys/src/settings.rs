// SPDX-License-Identifier: GPL-3.0-only

use automount_contracts::SettingsBridge;
use automount_types::AutomountStatus;

use crate::props::PropertyDir;

const STATUS_KEY: &str = "ums.status";

/// Settings bridge backed by the property store.
///
/// Per-volume sharing preferences live under `ums.volume.<name>.enabled`
/// as `0`/`1`; the aggregate status is published to `ums.status`.
#[derive(Debug, Clone)]
pub struct PropertySettings {
    props: PropertyDir,
}

impl PropertySettings {
    pub fn new(props: PropertyDir) -> Self {
        Self { props }
    }

    fn volume_key(volume: &str) -> String {
        format!("ums.volume.{volume}.enabled")
    }
}

impl SettingsBridge for PropertySettings {
    fn sharing_enabled(&self, volume: &str) -> Option<bool> {
        let key = Self::volume_key(volume);
        match self.props.get(&key).as_str() {
            "" => None,
            "1" => Some(true),
            "0" => Some(false),
            other => {
                tracing::warn!("ignoring malformed setting {key}='{other}'");
                None
            }
        }
    }

    fn publish_status(&self, status: AutomountStatus) {
        if let Err(e) = self.props.set(STATUS_KEY, status.as_str()) {
            tracing::error!("failed to publish status: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    static COUNTER: AtomicU64 = AtomicU64::new(1);

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new() -> Self {
            let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!("automount-settings-{unique}"));
            fs::create_dir_all(&path).expect("create temp dir");
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn reads_sharing_preference() {
        let temp = TempDir::new();
        let props = PropertyDir::new(&temp.path);
        let settings = PropertySettings::new(props.clone());

        assert_eq!(settings.sharing_enabled("sdcard"), None);

        props.set("ums.volume.sdcard.enabled", "1").expect("set property");
        assert_eq!(settings.sharing_enabled("sdcard"), Some(true));

        props.set("ums.volume.sdcard.enabled", "0").expect("set property");
        assert_eq!(settings.sharing_enabled("sdcard"), Some(false));

        props.set("ums.volume.sdcard.enabled", "yes").expect("set property");
        assert_eq!(settings.sharing_enabled("sdcard"), None);
    }

    #[test]
    fn publishes_status_property() {
        let temp = TempDir::new();
        let props = PropertyDir::new(&temp.path);
        let settings = PropertySettings::new(props.clone());

        settings.publish_status(AutomountStatus::FilesOpen);
        assert_eq!(props.get("ums.status"), "files-open");
    }
}
