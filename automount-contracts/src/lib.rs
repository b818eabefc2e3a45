// SPDX-License-Identifier: GPL-3.0-only

//! Contracts between the automount core and its collaborators
//!
//! The core never talks to the kernel, the volume daemon, the MTP stack or
//! the settings store directly; it goes through the traits defined here.
//! All trait calls happen synchronously on the core's single task, so the
//! traits are deliberately synchronous — asynchrony lives in the command
//! completion path (`CommandReply`), which is invoked exactly once when a
//! volume command finishes.

pub mod command;
pub mod traits;

pub use command::{CommandOutcome, CommandReply, VolumeOp};
pub use traits::{
    MtpBridge, MtpServer, MtpStorage, OpenFileScanner, SettingsBridge, UsbGadget, VolumeDirectory,
};
