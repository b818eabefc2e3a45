// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// A low-level volume command executed by the volume manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeOp {
    Mount,
    Unmount,
    Share,
    Unshare,
    Format,
}

impl VolumeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeOp::Mount => "mount",
            VolumeOp::Unmount => "unmount",
            VolumeOp::Share => "share",
            VolumeOp::Unshare => "unshare",
            VolumeOp::Format => "format",
        }
    }
}

impl fmt::Display for VolumeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a volume command, delivered exactly once per command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum CommandOutcome {
    Success,
    Failure { code: i32, message: String },
}

impl CommandOutcome {
    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        CommandOutcome::Failure {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}

/// Completion handle for a volume command.
///
/// The volume manager must invoke it exactly once, success or failure.
/// Delivery only enqueues an event on the core's task, so it is safe to
/// call from inside `VolumeDirectory::issue` or from another thread.
pub struct CommandReply {
    deliver: Box<dyn FnOnce(CommandOutcome) + Send>,
}

impl CommandReply {
    pub fn new(deliver: impl FnOnce(CommandOutcome) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    pub fn deliver(self, outcome: CommandOutcome) {
        (self.deliver)(outcome);
    }
}

impl fmt::Debug for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CommandReply")
    }
}
