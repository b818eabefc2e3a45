// SPDX-License-Identifier: GPL-3.0-only

use automount_contracts::{CommandOutcome, VolumeOp};

/// Consecutive failures tolerated before automatic retries stop.
pub(crate) const MAX_ERROR_COUNT: u32 = 3;

#[derive(Debug)]
struct PendingCommand {
    volume: String,
    op: VolumeOp,
}

/// Tracks the single in-flight volume command and its failure streak.
///
/// The streak resets on any success and survives across commands; after
/// `MAX_ERROR_COUNT` consecutive failures the tracker tells the caller to
/// stop re-running the pass (a later unrelated event still starts one).
#[derive(Debug, Default)]
pub(crate) struct ResponseTracker {
    pending: Option<PendingCommand>,
    error_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    RunPass,
    GiveUp,
}

impl ResponseTracker {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self, volume: &str, op: VolumeOp) {
        debug_assert!(self.pending.is_none(), "second command while one is pending");
        self.pending = Some(PendingCommand {
            volume: volume.to_string(),
            op,
        });
    }

    pub fn finish(&mut self, volume: &str, op: VolumeOp, outcome: &CommandOutcome) -> RetryDecision {
        match self.pending.take() {
            Some(pending) if pending.volume == volume && pending.op == op => {}
            Some(pending) => {
                tracing::warn!(
                    "response for {op} on {volume} while {} on {} was pending",
                    pending.op,
                    pending.volume
                );
            }
            None => {
                tracing::warn!("response for {op} on {volume} with no command pending");
            }
        }

        if outcome.is_success() {
            self.error_count = 0;
            return RetryDecision::RunPass;
        }

        self.error_count += 1;
        if self.error_count < MAX_ERROR_COUNT {
            RetryDecision::RunPass
        } else {
            RetryDecision::GiveUp
        }
    }
}
