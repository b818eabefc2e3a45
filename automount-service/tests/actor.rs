// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests of the spawned core task: the fire-and-forget handle,
//! the cached status value, and the delayed open-files retry.

mod common;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use automount_contracts::VolumeDirectory;
use automount_service::{Automounter, Collaborators, StaticDirectory};
use automount_types::{AutomountMode, AutomountStatus, MountState, OpenFileEntry};

use common::{FakeMtpBridge, FakeScanner, FakeUsb, FakeUsbState, MtpLog, RecordingSettings};

struct Fixture {
    usb: Arc<Mutex<FakeUsbState>>,
    mtp: Arc<Mutex<MtpLog>>,
    open_files: Arc<Mutex<HashMap<PathBuf, Vec<OpenFileEntry>>>>,
    published: Arc<Mutex<Vec<AutomountStatus>>>,
    directory: StaticDirectory,
}

impl Fixture {
    fn new(usb: FakeUsbState) -> Self {
        Self {
            usb: Arc::new(Mutex::new(usb)),
            mtp: Arc::new(Mutex::new(MtpLog::default())),
            open_files: Arc::new(Mutex::new(HashMap::new())),
            published: Arc::new(Mutex::new(Vec::new())),
            directory: StaticDirectory::new(),
        }
    }

    fn spawn(self) -> (Automounter, tokio::task::JoinHandle<()>) {
        Automounter::spawn(Collaborators {
            usb: Box::new(FakeUsb(self.usb)),
            volumes: Box::new(self.directory),
            mtp: Box::new(FakeMtpBridge(self.mtp)),
            scanner: Box::new(FakeScanner(self.open_files)),
            settings: Box::new(RecordingSettings {
                prefs: Arc::new(Mutex::new(HashMap::new())),
                published: self.published,
            }),
        })
    }
}

/// Let the core task drain its queue.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn open_files_retry_completes_the_share_once_files_close() {
    let fixture = Fixture::new(FakeUsbState {
        plugged: true,
        configured: true,
        functions: Some("mass_storage,adb".to_string()),
        ums_avail: true,
        desired: "mass_storage,adb".to_string(),
        persisted: "mass_storage,adb".to_string(),
        ..FakeUsbState::default()
    });

    fixture
        .directory
        .register_volume("sdcard", Path::new("/mnt/sdcard"));
    let volume = fixture.directory.find("sdcard").expect("volume registered");
    volume.set_sharing_enabled(true);

    fixture.open_files.lock().expect("scanner map").insert(
        volume.mount_point(),
        vec![OpenFileEntry {
            pid: 4242,
            path: PathBuf::from("/mnt/sdcard/dcim/img.jpg"),
            command: "camera".to_string(),
            exe: None,
        }],
    );

    let open_files = fixture.open_files.clone();
    let published = fixture.published.clone();
    let (mounter, task) = fixture.spawn();

    mounter.set_mode(AutomountMode::EnableUms);
    settle().await;

    assert_eq!(mounter.status(), AutomountStatus::FilesOpen);
    assert_eq!(volume.state(), MountState::Mounted);
    assert!(volume.is_sharing());

    // The files close; the delayed poll picks the share back up.
    open_files.lock().expect("scanner map").clear();
    tokio::time::sleep(Duration::from_millis(1300)).await;

    assert_eq!(volume.state(), MountState::Shared);
    assert_eq!(mounter.status(), AutomountStatus::Enabled);
    assert_eq!(
        published.lock().expect("published").as_slice(),
        &[AutomountStatus::FilesOpen, AutomountStatus::Enabled]
    );

    mounter.shutdown();
    task.await.expect("core task");
}

#[tokio::test]
async fn shutdown_tears_down_the_mtp_server() {
    let fixture = Fixture::new(FakeUsbState {
        plugged: true,
        configured: true,
        functions: Some("mtp,adb".to_string()),
        mtp_avail: true,
        desired: "mtp,adb".to_string(),
        ..FakeUsbState::default()
    });

    fixture
        .directory
        .register_volume("sdcard", Path::new("/mnt/sdcard"));

    let mtp = fixture.mtp.clone();
    let (mounter, task) = fixture.spawn();

    mounter.set_mode(AutomountMode::EnableMtp);
    settle().await;

    assert_eq!(mounter.status(), AutomountStatus::Enabled);
    {
        let log = mtp.lock().expect("mtp log");
        assert_eq!(log.servers_started, 1);
        assert_eq!(log.storages_attached, vec!["sdcard".to_string()]);
    }

    mounter.shutdown();
    task.await.expect("core task");

    let log = mtp.lock().expect("mtp log");
    assert_eq!(log.servers_stopped, 1);
    assert_eq!(log.storages_detached, 1);
}

#[tokio::test]
async fn events_after_shutdown_are_dropped() {
    let fixture = Fixture::new(FakeUsbState::default());
    let (mounter, task) = fixture.spawn();

    mounter.shutdown();
    task.await.expect("core task");

    // The queue is gone; the handle must not panic.
    mounter.set_mode(AutomountMode::EnableUms);
    mounter.usb_cable_event();
    assert_eq!(mounter.status(), AutomountStatus::Disabled);
}
