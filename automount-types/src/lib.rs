// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the USB automount service
//!
//! This crate defines the single source of truth for the automount domain
//! types. These models are used throughout the stack:
//!
//! - **automount-sys**: Returns these types from its scanning/parsing APIs
//! - **automount-contracts**: References them in the collaborator traits
//! - **automount-service**: Drives the state machine over them

pub mod mode;
pub mod openfile;
pub mod status;
pub mod usb;
pub mod volume;

pub use mode::{AutomountMode, ModeParseError};
pub use openfile::OpenFileEntry;
pub use status::AutomountStatus;
pub use usb::UsbFunction;
pub use volume::{MountState, Volume};
