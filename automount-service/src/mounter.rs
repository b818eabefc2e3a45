// SPDX-License-Identifier: GPL-3.0-only

//! The automount state machine driver.
//!
//! `AutoMounter` owns every piece of mutable automount state and is only
//! ever touched from the core task. Each external event funnels into
//! [`AutoMounter::update_state`], a single re-entrant-guarded pass that
//! samples the USB subsystem, steps the function state machine, and walks
//! the volume set issuing at most one command.

use std::time::Duration;

use automount_contracts::{
    CommandOutcome, CommandReply, MtpBridge, OpenFileScanner, SettingsBridge, UsbGadget,
    VolumeDirectory, VolumeOp,
};
use automount_types::{AutomountMode, AutomountStatus, MountState, Volume};
use tokio::sync::watch;

use crate::events::{Event, EventSender};
use crate::machine::{self, UsbAction, UsbState};
use crate::mtp::MtpSession;
use crate::response::{MAX_ERROR_COUNT, ResponseTracker, RetryDecision};
use crate::usb::{self, UsbSnapshot};

/// Short open-files backoff, used while apps are still reacting to the
/// sharing notification.
const FILES_OPEN_RETRY_FAST: Duration = Duration::from_millis(1000);
/// Long backoff once the apps have had their chance.
const FILES_OPEN_RETRY_SLOW: Duration = Duration::from_millis(5000);
const FILES_OPEN_ESCALATE_AFTER: u32 = 10;

/// The collaborators the core is wired to at construction.
pub struct Collaborators {
    pub usb: Box<dyn UsbGadget>,
    pub volumes: Box<dyn VolumeDirectory>,
    pub mtp: Box<dyn MtpBridge>,
    pub scanner: Box<dyn OpenFileScanner>,
    pub settings: Box<dyn SettingsBridge>,
}

/// What the caller of a pass must do afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassDirective {
    /// Re-run the pass after this delay (open-files backoff).
    pub retry_after: Option<Duration>,
}

pub struct AutoMounter {
    state: UsbState,
    mode: AutomountMode,
    response: ResponseTracker,
    mtp_session: Option<MtpSession>,
    files_open_retries: u32,
    in_pass: bool,
    status_tx: watch::Sender<AutomountStatus>,
    events: EventSender,
    usb: Box<dyn UsbGadget>,
    volumes: Box<dyn VolumeDirectory>,
    mtp: Box<dyn MtpBridge>,
    scanner: Box<dyn OpenFileScanner>,
    settings: Box<dyn SettingsBridge>,
}

impl AutoMounter {
    pub fn new(collaborators: Collaborators, events: EventSender) -> Self {
        let (status_tx, _) = watch::channel(AutomountStatus::Disabled);
        Self {
            state: UsbState::Idle,
            mode: AutomountMode::Disable,
            response: ResponseTracker::default(),
            mtp_session: None,
            files_open_retries: 0,
            in_pass: false,
            status_tx,
            events,
            usb: collaborators.usb,
            volumes: collaborators.volumes,
            mtp: collaborators.mtp,
            scanner: collaborators.scanner,
            settings: collaborators.settings,
        }
    }

    pub fn usb_state(&self) -> UsbState {
        self.state
    }

    pub fn mode(&self) -> AutomountMode {
        self.mode
    }

    pub fn status(&self) -> AutomountStatus {
        *self.status_tx.borrow()
    }

    pub fn mtp_running(&self) -> bool {
        self.mtp_session.is_some()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<AutomountStatus> {
        self.status_tx.subscribe()
    }

    pub(crate) fn events(&self) -> EventSender {
        self.events.clone()
    }

    pub fn handle_event(&mut self, event: Event) -> PassDirective {
        match event {
            Event::SetMode(mode) => self.set_mode(mode),
            Event::SetSharingEnabled { volume, enabled } => {
                self.set_sharing_enabled(&volume, enabled)
            }
            Event::RequestFormat { volume } => self.format_volume(&volume),
            Event::RequestMount { volume } => self.mount_volume(&volume),
            Event::RequestUnmount { volume } => self.unmount_volume(&volume),
            Event::UsbCableEvent | Event::VolumesChanged | Event::Poll => self.update_state(),
            Event::VolumeManagerReady => self.volume_manager_ready(),
            Event::MtpSessionStarted => self.mtp_session_started(),
            Event::MtpSessionEnded => self.mtp_session_ended(),
            Event::CommandResponse {
                volume,
                op,
                outcome,
            } => self.command_response(&volume, op, outcome),
            Event::Shutdown => {
                self.shutdown();
                PassDirective::default()
            }
        }
    }

    /// Stop serving; called when the core task winds down.
    pub fn shutdown(&mut self) {
        self.stop_mtp_server();
    }

    fn set_mode(&mut self, requested: AutomountMode) -> PassDirective {
        let mut mode = requested;

        if mode == AutomountMode::DisableWhenUnplugged && self.mode == AutomountMode::Disable {
            // DisableWhenUnplugged implies "enabled until unplugged"; if
            // nothing is enabled there is nothing to defer.
            mode = AutomountMode::Disable;
        }

        if mode == AutomountMode::Disable
            && self.mode == AutomountMode::EnableUms
            && self.usb.cable_plugged()
        {
            // Many devices cannot force an unshare while the host holds the
            // LUN; the attempt would fail and leave sharing half torn down.
            tracing::info!("attempting to disable ums; deferring until the usb cable is unplugged");
            mode = AutomountMode::DisableWhenUnplugged;
        }

        if mode == self.mode {
            return PassDirective::default();
        }
        tracing::info!("changing mode from '{}' to '{mode}'", self.mode);
        self.mode = mode;
        self.update_state()
    }

    fn set_sharing_enabled(&mut self, name: &str, enabled: bool) -> PassDirective {
        let Some(volume) = self.volumes.find(name) else {
            return PassDirective::default();
        };
        if volume.sharing_enabled() == enabled {
            return PassDirective::default();
        }
        volume.set_unmount_requested(false);
        volume.set_mount_requested(false);
        volume.set_sharing_enabled(enabled);
        tracing::info!("volume {name} sharing {}", if enabled { "enabled" } else { "disabled" });
        self.update_state()
    }

    fn format_volume(&mut self, name: &str) -> PassDirective {
        let Some(volume) = self.volumes.find(name) else {
            return PassDirective::default();
        };
        if volume.format_requested() {
            return PassDirective::default();
        }
        volume.set_format_requested(true);
        tracing::info!("volume {name} format requested");
        self.update_state()
    }

    fn mount_volume(&mut self, name: &str) -> PassDirective {
        let Some(volume) = self.volumes.find(name) else {
            return PassDirective::default();
        };
        volume.set_unmount_requested(false);
        if volume.mount_requested() || volume.state() == MountState::Mounted {
            return PassDirective::default();
        }
        volume.set_mount_requested(true);
        tracing::info!("volume {name} mount requested");
        self.update_state()
    }

    fn unmount_volume(&mut self, name: &str) -> PassDirective {
        let Some(volume) = self.volumes.find(name) else {
            return PassDirective::default();
        };
        if volume.unmount_requested() {
            return PassDirective::default();
        }
        volume.set_unmount_requested(true);
        tracing::info!("volume {name} unmount requested");
        self.update_state()
    }

    /// Pick up the persisted per-volume sharing preferences now that the
    /// volume set is known.
    fn volume_manager_ready(&mut self) -> PassDirective {
        if !self.volumes.is_ready() {
            tracing::debug!("volume manager readiness signalled but not ready");
            return PassDirective::default();
        }
        for volume in self.volumes.volumes() {
            if let Some(enabled) = self.settings.sharing_enabled(volume.name())
                && volume.sharing_enabled() != enabled
            {
                volume.set_unmount_requested(false);
                volume.set_mount_requested(false);
                volume.set_sharing_enabled(enabled);
                tracing::info!(
                    "volume {} sharing {} from settings",
                    volume.name(),
                    if enabled { "enabled" } else { "disabled" }
                );
            }
        }
        self.update_state()
    }

    fn mtp_session_started(&mut self) -> PassDirective {
        if self.state == UsbState::MtpStarted {
            self.set_state(UsbState::MtpConnected);
        }
        self.update_state()
    }

    fn mtp_session_ended(&mut self) -> PassDirective {
        if self.state == UsbState::MtpConnected {
            self.set_state(UsbState::MtpStarted);
        }
        self.update_state()
    }

    fn command_response(
        &mut self,
        volume: &str,
        op: VolumeOp,
        outcome: CommandOutcome,
    ) -> PassDirective {
        if let CommandOutcome::Failure { code, ref message } = outcome {
            tracing::error!("{op} on {volume} failed: {code} '{message}'");
        }
        match self.response.finish(volume, op, &outcome) {
            RetryDecision::RunPass => self.update_state(),
            RetryDecision::GiveUp => {
                tracing::error!(
                    "{op} on {volume} failed {MAX_ERROR_COUNT} times in a row; giving up"
                );
                PassDirective::default()
            }
        }
    }

    /// Run one pass, unless one is already running.
    ///
    /// Flipping an intent flag inside the pass can synchronously re-enter
    /// through a collaborator callback; the nested invocation must be
    /// suppressed, not queued. The flag is restored on every exit path of
    /// `run_pass` since all of them return through here.
    pub fn update_state(&mut self) -> PassDirective {
        if self.in_pass {
            return PassDirective::default();
        }
        self.in_pass = true;
        let directive = self.run_pass();
        self.in_pass = false;
        directive
    }

    fn run_pass(&mut self) -> PassDirective {
        if !self.volumes.is_ready() {
            tracing::debug!("volume manager not ready yet");
            return PassDirective::default();
        }
        if self.response.is_pending() {
            // One volume command at a time; the completion re-runs us.
            return PassDirective::default();
        }

        let mut snap = UsbSnapshot::capture(self.usb.as_ref(), self.mode);
        let mut enabled = snap.mtp_enabled || snap.ums_enabled;

        if self.mode == AutomountMode::DisableWhenUnplugged {
            // DisableWhenUnplugged implies still enabled until the unplug.
            enabled = snap.cable_plugged;
            if !snap.cable_plugged {
                self.mode = AutomountMode::Disable;
                tracing::info!("usb cable unplugged; mode collapses to '{}'", self.mode);
                snap.mtp_enabled = false;
                snap.ums_enabled = false;
            }
        }

        tracing::debug!(
            state = self.state.as_str(),
            mode = %self.mode,
            plugged = snap.cable_plugged,
            ums_avail = snap.ums_avail,
            ums_configured = snap.ums_configured,
            ums_enabled = snap.ums_enabled,
            mtp_avail = snap.mtp_avail,
            mtp_configured = snap.mtp_configured,
            mtp_enabled = snap.mtp_enabled,
            "update pass"
        );

        let (next, actions) = machine::step(self.state, &snap);
        for action in actions {
            match action {
                UsbAction::StartMtp => self.start_mtp_server(),
                UsbAction::StopMtp => self.stop_mtp_server(),
                UsbAction::SelectFunction(func) => usb::select_function(self.usb.as_ref(), func),
            }
        }
        if next != self.state {
            self.set_state(next);
        }

        let try_to_share = snap.ums_enabled && snap.cable_plugged;
        let mut files_open = false;
        let mut retry_after = None;

        for volume in self.volumes.volumes() {
            let vol_state = volume.state();

            if vol_state == MountState::Mounted {
                tracing::debug!(
                    volume = volume.name(),
                    state = vol_state.as_str(),
                    media = volume.media_present(),
                    locked = volume.mount_locked(),
                    mount_point = %volume.mount_point().display(),
                    sharing_enabled = volume.sharing_enabled(),
                    is_sharing = volume.is_sharing(),
                    "volume status"
                );
                if volume.is_sharing() && !snap.cable_plugged {
                    // The sharing intent was flagged but the cable went away
                    // before the share happened; without the shared->mounted
                    // transition that normally clears it, the flag sticks.
                    volume.set_is_sharing(false);
                }
            } else {
                tracing::debug!(
                    volume = volume.name(),
                    state = vol_state.as_str(),
                    media = volume.media_present(),
                    "volume status"
                );
            }

            if !volume.media_present() {
                continue;
            }

            let wants_share = try_to_share && volume.sharing_enabled();
            if wants_share || volume.format_requested() || volume.unmount_requested() {
                match vol_state {
                    MountState::Mounted => {
                        if volume.mount_locked() {
                            tracing::warn!(
                                "mounted volume {} is locked; not sharing or formatting",
                                volume.name()
                            );
                            continue;
                        }

                        // Flag the intent first so observers see the pending
                        // transition and start closing their files.
                        if wants_share {
                            volume.set_is_sharing(true);
                        } else if volume.format_requested() {
                            volume.set_is_formatting(true);
                        }

                        let mount_point = volume.mount_point();
                        let open_files = self.scanner.open_files_under(&mount_point);
                        if open_files.is_empty() {
                            tracing::info!("unmounting {}", volume.name());
                            self.issue(&volume, VolumeOp::Unmount);
                            return PassDirective::default();
                        }

                        for entry in &open_files {
                            tracing::warn!(
                                "open file under {}: pid {} '{}' ({})",
                                mount_point.display(),
                                entry.pid,
                                entry.path.display(),
                                entry.command
                            );
                        }
                        tracing::warn!(
                            "mounted volume {} has open files; not sharing or formatting",
                            volume.name()
                        );
                        retry_after = Some(if self.files_open_retries > FILES_OPEN_ESCALATE_AFTER {
                            FILES_OPEN_RETRY_SLOW
                        } else {
                            FILES_OPEN_RETRY_FAST
                        });
                        files_open = true;
                        break;
                    }
                    MountState::Idle => {
                        if volume.is_formatting() && !volume.format_requested() {
                            tracing::info!("mounting {} after format", volume.name());
                            self.issue(&volume, VolumeOp::Mount);
                            return PassDirective::default();
                        }
                        if wants_share {
                            tracing::info!("sharing {}", volume.name());
                            self.issue(&volume, VolumeOp::Share);
                            return PassDirective::default();
                        }
                        if volume.format_requested() {
                            tracing::info!("formatting {}", volume.name());
                            self.issue(&volume, VolumeOp::Format);
                            return PassDirective::default();
                        }
                        // Unmount requested and already unmounted.
                    }
                    _ => {
                        // Mid-transition; nothing to do until it settles.
                    }
                }
            } else {
                match vol_state {
                    MountState::Shared => {
                        tracing::info!("unsharing {}", volume.name());
                        self.issue(&volume, VolumeOp::Unshare);
                        return PassDirective::default();
                    }
                    MountState::Idle => {
                        if !volume.unmount_requested() {
                            tracing::info!("mounting {}", volume.name());
                            self.issue(&volume, VolumeOp::Mount);
                            return PassDirective::default();
                        }
                    }
                    _ => {}
                }
            }
        }

        let status = if files_open {
            self.files_open_retries += 1;
            AutomountStatus::FilesOpen
        } else if enabled {
            self.files_open_retries = 0;
            AutomountStatus::Enabled
        } else {
            AutomountStatus::Disabled
        };
        self.publish_status(status);

        PassDirective { retry_after }
    }

    fn issue(&mut self, volume: &Volume, op: VolumeOp) {
        self.response.begin(volume.name(), op);
        let events = self.events.clone();
        let name = volume.name().to_string();
        let reply = CommandReply::new(move |outcome| {
            events.send(Event::CommandResponse {
                volume: name,
                op,
                outcome,
            });
        });
        self.volumes.issue(volume, op, reply);
    }

    fn start_mtp_server(&mut self) {
        if self.mtp_session.is_some() {
            return;
        }
        let session = MtpSession::start(self.mtp.as_ref(), &self.volumes.volumes());
        tracing::debug!("mtp server running with {} storages", session.storage_count());
        self.mtp_session = Some(session);
    }

    fn stop_mtp_server(&mut self) {
        if self.mtp_session.take().is_some() {
            tracing::info!("stopping mtp server");
        }
    }

    fn set_state(&mut self, next: UsbState) {
        tracing::info!(
            "usb state changed from {} to {}",
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }

    fn publish_status(&mut self, status: AutomountStatus) {
        let changed = *self.status_tx.borrow() != status;
        self.status_tx.send_replace(status);
        if changed {
            tracing::info!("status changed to {status}");
            self.settings.publish_status(status);
        }
    }
}
