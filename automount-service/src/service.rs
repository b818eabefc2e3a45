// SPDX-License-Identifier: GPL-3.0-only

//! The public face of the automount core.
//!
//! [`Automounter::spawn`] starts the core task and returns a cloneable
//! handle. Every operation on the handle is fire-and-forget: it posts an
//! event and returns; outcomes surface through the published status and
//! the logs. Only [`Automounter::status`] is synchronous, and it reads the
//! cached value the core last published, never the live state.

use automount_types::{AutomountMode, AutomountStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::events::{Event, EventSender, channel};
use crate::mounter::{AutoMounter, Collaborators};

#[derive(Debug, Clone)]
pub struct Automounter {
    events: EventSender,
    status: watch::Receiver<AutomountStatus>,
}

impl Automounter {
    /// Wire the core to its collaborators and start the core task.
    pub fn spawn(collaborators: Collaborators) -> (Self, JoinHandle<()>) {
        let (events, rx) = channel();
        let mounter = AutoMounter::new(collaborators, events.clone());
        let status = mounter.subscribe_status();
        let task = tokio::spawn(run(mounter, rx));
        (Self { events, status }, task)
    }

    pub fn set_mode(&self, mode: AutomountMode) {
        self.events.send(Event::SetMode(mode));
    }

    pub fn set_sharing_enabled(&self, volume: &str, enabled: bool) {
        self.events.send(Event::SetSharingEnabled {
            volume: volume.to_string(),
            enabled,
        });
    }

    pub fn request_format(&self, volume: &str) {
        self.events.send(Event::RequestFormat {
            volume: volume.to_string(),
        });
    }

    pub fn request_mount(&self, volume: &str) {
        self.events.send(Event::RequestMount {
            volume: volume.to_string(),
        });
    }

    pub fn request_unmount(&self, volume: &str) {
        self.events.send(Event::RequestUnmount {
            volume: volume.to_string(),
        });
    }

    pub fn usb_cable_event(&self) {
        self.events.send(Event::UsbCableEvent);
    }

    pub fn volumes_changed(&self) {
        self.events.send(Event::VolumesChanged);
    }

    pub fn volume_manager_ready(&self) {
        self.events.send(Event::VolumeManagerReady);
    }

    pub fn mtp_session_started(&self) {
        self.events.send(Event::MtpSessionStarted);
    }

    pub fn mtp_session_ended(&self) {
        self.events.send(Event::MtpSessionEnded);
    }

    /// The aggregate status the core last published.
    pub fn status(&self) -> AutomountStatus {
        *self.status.borrow()
    }

    pub fn shutdown(&self) {
        self.events.send(Event::Shutdown);
    }
}

async fn run(mut mounter: AutoMounter, mut rx: mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = rx.recv().await {
        if matches!(event, Event::Shutdown) {
            mounter.shutdown();
            break;
        }
        let directive = mounter.handle_event(event);
        if let Some(delay) = directive.retry_after {
            let events = mounter.events();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                events.send(Event::Poll);
            });
        }
    }
    tracing::debug!("automounter task finished");
}
