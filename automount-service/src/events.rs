// SPDX-License-Identifier: GPL-3.0-only

//! The event queue feeding the automount core.
//!
//! Everything that can happen to the core arrives as an [`Event`]: public
//! API calls, collaborator notifications, command completions and delayed
//! retries. Events are processed strictly in order by the single core task.

use automount_contracts::{CommandOutcome, VolumeOp};
use automount_types::AutomountMode;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum Event {
    SetMode(AutomountMode),
    SetSharingEnabled { volume: String, enabled: bool },
    RequestFormat { volume: String },
    RequestMount { volume: String },
    RequestUnmount { volume: String },
    /// The USB cable was plugged or unplugged.
    UsbCableEvent,
    /// A volume changed state or the volume set changed.
    VolumesChanged,
    /// The volume manager finished enumerating volumes.
    VolumeManagerReady,
    MtpSessionStarted,
    MtpSessionEnded,
    /// A volume command finished.
    CommandResponse {
        volume: String,
        op: VolumeOp,
        outcome: CommandOutcome,
    },
    /// Delayed re-run of the pass (open-files backoff).
    Poll,
    Shutdown,
}

/// Cloneable posting side of the core's event queue.
#[derive(Debug, Clone)]
pub struct EventSender(mpsc::UnboundedSender<Event>);

impl EventSender {
    /// Post an event. Events posted after shutdown are dropped.
    pub fn send(&self, event: Event) {
        if self.0.send(event).is_err() {
            tracing::debug!("automounter task is gone; dropping event");
        }
    }
}

pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender(tx), rx)
}
