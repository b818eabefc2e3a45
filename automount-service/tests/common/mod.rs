// SPDX-License-Identifier: GPL-3.0-only

//! Shared fakes and a synchronous harness for driving the automount core.
//!
//! The harness feeds events straight into `AutoMounter::handle_event` and
//! pumps the queue after each one, so tests control exactly when commands
//! complete and in what order passes run.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use automount_contracts::{
    CommandOutcome, CommandReply, MtpBridge, MtpServer, MtpStorage, OpenFileScanner,
    SettingsBridge, UsbGadget, VolumeDirectory, VolumeOp,
};
use automount_service::{AutoMounter, Collaborators, Event, PassDirective, channel};
use automount_types::{AutomountStatus, MountState, OpenFileEntry, UsbFunction, Volume};

#[derive(Debug, Default)]
pub struct FakeUsbState {
    pub plugged: bool,
    pub configured: bool,
    pub functions: Option<String>,
    pub ums_avail: bool,
    pub mtp_avail: bool,
    pub desired: String,
    pub persisted: String,
}

pub struct FakeUsb(pub Arc<Mutex<FakeUsbState>>);

impl FakeUsb {
    fn state(&self) -> MutexGuard<'_, FakeUsbState> {
        self.0.lock().expect("usb state poisoned")
    }
}

impl UsbGadget for FakeUsb {
    fn cable_plugged(&self) -> bool {
        self.state().plugged
    }

    fn configured(&self) -> bool {
        self.state().configured
    }

    fn active_functions(&self) -> Option<String> {
        self.state().functions.clone()
    }

    fn function_available(&self, func: UsbFunction) -> bool {
        match func {
            UsbFunction::MassStorage => self.state().ums_avail,
            UsbFunction::Mtp => self.state().mtp_avail,
            UsbFunction::Adb => false,
        }
    }

    fn desired_config(&self) -> String {
        self.state().desired.clone()
    }

    fn set_desired_config(&self, config: &str) {
        self.state().desired = config.to_string();
    }

    fn persisted_config(&self) -> String {
        self.state().persisted.clone()
    }
}

#[derive(Debug, Default)]
pub struct MtpLog {
    pub servers_started: usize,
    pub servers_stopped: usize,
    pub storages_attached: Vec<String>,
    pub storages_detached: usize,
}

pub struct FakeMtpBridge(pub Arc<Mutex<MtpLog>>);

struct FakeMtpServer(Arc<Mutex<MtpLog>>);

struct FakeMtpStorage(Arc<Mutex<MtpLog>>);

impl MtpBridge for FakeMtpBridge {
    fn start(&self) -> Box<dyn MtpServer> {
        self.0.lock().expect("mtp log poisoned").servers_started += 1;
        Box::new(FakeMtpServer(self.0.clone()))
    }
}

impl MtpServer for FakeMtpServer {
    fn attach_storage(&self, volume: &Volume) -> Box<dyn MtpStorage> {
        self.0
            .lock()
            .expect("mtp log poisoned")
            .storages_attached
            .push(volume.name().to_string());
        Box::new(FakeMtpStorage(self.0.clone()))
    }
}

impl Drop for FakeMtpServer {
    fn drop(&mut self) {
        self.0.lock().expect("mtp log poisoned").servers_stopped += 1;
    }
}

impl MtpStorage for FakeMtpStorage {}

impl Drop for FakeMtpStorage {
    fn drop(&mut self) {
        self.0.lock().expect("mtp log poisoned").storages_detached += 1;
    }
}

pub struct FakeScanner(pub Arc<Mutex<HashMap<PathBuf, Vec<OpenFileEntry>>>>);

impl OpenFileScanner for FakeScanner {
    fn open_files_under(&self, mount_point: &Path) -> Vec<OpenFileEntry> {
        self.0
            .lock()
            .expect("scanner map poisoned")
            .get(mount_point)
            .cloned()
            .unwrap_or_default()
    }
}

pub struct RecordingSettings {
    pub prefs: Arc<Mutex<HashMap<String, bool>>>,
    pub published: Arc<Mutex<Vec<AutomountStatus>>>,
}

impl SettingsBridge for RecordingSettings {
    fn sharing_enabled(&self, volume: &str) -> Option<bool> {
        self.prefs.lock().expect("prefs poisoned").get(volume).copied()
    }

    fn publish_status(&self, status: AutomountStatus) {
        self.published.lock().expect("published poisoned").push(status);
    }
}

#[derive(Default)]
pub struct DirectoryState {
    pub volumes: Vec<Volume>,
    pub issued: Vec<(String, VolumeOp)>,
    pub pending: Vec<(String, VolumeOp, CommandReply)>,
}

pub struct FakeDirectory {
    pub state: Arc<Mutex<DirectoryState>>,
    pub ready: Arc<AtomicBool>,
}

impl VolumeDirectory for FakeDirectory {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn volumes(&self) -> Vec<Volume> {
        self.state.lock().expect("directory poisoned").volumes.clone()
    }

    fn find(&self, name: &str) -> Option<Volume> {
        self.state
            .lock()
            .expect("directory poisoned")
            .volumes
            .iter()
            .find(|volume| volume.name() == name)
            .cloned()
    }

    fn issue(&self, volume: &Volume, op: VolumeOp, reply: CommandReply) {
        let mut state = self.state.lock().expect("directory poisoned");
        state.issued.push((volume.name().to_string(), op));
        state.pending.push((volume.name().to_string(), op, reply));
    }

    fn register_volume(&self, name: &str, mount_point: &Path) {
        let volume = Volume::new(name, mount_point);
        volume.set_state(MountState::Mounted);
        self.state
            .lock()
            .expect("directory poisoned")
            .volumes
            .push(volume);
    }
}

/// Apply the state transition a successful command produces, the way the
/// volume manager reports it.
pub fn apply_transition(volume: &Volume, op: VolumeOp) {
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
            volume.set_format_requested(false);
        }
    }
}

pub struct Harness {
    pub mounter: AutoMounter,
    rx: mpsc::UnboundedReceiver<Event>,
    pub usb: Arc<Mutex<FakeUsbState>>,
    pub mtp: Arc<Mutex<MtpLog>>,
    pub open_files: Arc<Mutex<HashMap<PathBuf, Vec<OpenFileEntry>>>>,
    pub directory: Arc<Mutex<DirectoryState>>,
    pub ready: Arc<AtomicBool>,
    pub prefs: Arc<Mutex<HashMap<String, bool>>>,
    pub published: Arc<Mutex<Vec<AutomountStatus>>>,
    pub last: PassDirective,
}

impl Harness {
    pub fn new() -> Self {
        let usb = Arc::new(Mutex::new(FakeUsbState::default()));
        let mtp = Arc::new(Mutex::new(MtpLog::default()));
        let open_files = Arc::new(Mutex::new(HashMap::new()));
        let directory = Arc::new(Mutex::new(DirectoryState::default()));
        let ready = Arc::new(AtomicBool::new(true));
        let prefs = Arc::new(Mutex::new(HashMap::new()));
        let published = Arc::new(Mutex::new(Vec::new()));

        let (events, rx) = channel();
        let mounter = AutoMounter::new(
            Collaborators {
                usb: Box::new(FakeUsb(usb.clone())),
                volumes: Box::new(FakeDirectory {
                    state: directory.clone(),
                    ready: ready.clone(),
                }),
                mtp: Box::new(FakeMtpBridge(mtp.clone())),
                scanner: Box::new(FakeScanner(open_files.clone())),
                settings: Box::new(RecordingSettings {
                    prefs: prefs.clone(),
                    published: published.clone(),
                }),
            },
            events,
        );

        Self {
            mounter,
            rx,
            usb,
            mtp,
            open_files,
            directory,
            ready,
            prefs,
            published,
            last: PassDirective::default(),
        }
    }

    pub fn add_volume(&self, name: &str, state: MountState, sharing_enabled: bool) -> Volume {
        let volume = Volume::new(name, format!("/mnt/{name}"));
        volume.set_state(state);
        volume.set_sharing_enabled(sharing_enabled);
        self.directory
            .lock()
            .expect("directory poisoned")
            .volumes
            .push(volume.clone());
        volume
    }

    pub fn gadget(&self) -> MutexGuard<'_, FakeUsbState> {
        self.usb.lock().expect("usb state poisoned")
    }

    /// Simulate the kernel accepting the desired configuration.
    pub fn apply_desired_config(&self) {
        let mut usb = self.gadget();
        usb.functions = Some(usb.desired.clone());
        usb.configured = true;
    }

    /// Feed one event, then drain everything it queued (command replies).
    pub fn event(&mut self, event: Event) {
        self.last = self.mounter.handle_event(event);
        self.pump();
    }

    pub fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.last = self.mounter.handle_event(event);
        }
    }

    pub fn issued(&self) -> Vec<(String, VolumeOp)> {
        self.directory.lock().expect("directory poisoned").issued.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.directory.lock().expect("directory poisoned").pending.len()
    }

    /// Complete the oldest outstanding command and pump the resulting pass.
    pub fn complete_next(&mut self, success: bool) {
        let (name, op, reply) = {
            let mut state = self.directory.lock().expect("directory poisoned");
            assert!(!state.pending.is_empty(), "no command outstanding");
            state.pending.remove(0)
        };
        if success {
            let volume = {
                let state = self.directory.lock().expect("directory poisoned");
                state
                    .volumes
                    .iter()
                    .find(|volume| volume.name() == name)
                    .cloned()
                    .expect("volume for pending command")
            };
            apply_transition(&volume, op);
            reply.deliver(CommandOutcome::Success);
        } else {
            reply.deliver(CommandOutcome::failure(400, "command failed"));
        }
        self.pump();
    }
}
