// SPDX-License-Identifier: GPL-3.0-only

//! The automount core
//!
//! One `AutoMounter` per process arbitrates between the two mutually
//! exclusive USB personalities (mass storage and MTP) and sequences the
//! mount/unmount/share/format transitions of every known volume. All of its
//! state lives on a single task: external callers talk to it through the
//! [`Automounter`] handle, which posts events onto the core's queue and
//! reads the published status from a cached value.

pub mod events;
pub mod machine;
pub mod mounter;
mod mtp;
mod response;
pub mod service;
pub mod usb;
pub mod volumes;

pub use events::{Event, EventSender, channel};
pub use machine::UsbState;
pub use mounter::{AutoMounter, Collaborators, PassDirective};
pub use service::Automounter;
pub use usb::UsbSnapshot;
pub use volumes::StaticDirectory;
