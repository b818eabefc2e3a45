// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system surfaces for the automount service
//!
//! This crate implements the collaborator contracts that touch the machine
//! directly:
//! - sysfs reads for USB cable/gadget state (both hardware generations)
//! - the property store backing `sys.usb.config` and friends
//! - the procfs open-file scanner consulted before unmounts
//! - the `volume.cfg` static volume configuration parser
//!
//! The automount core consumes all of this through `automount-contracts`;
//! nothing here knows about the state machine.

pub mod error;
pub mod openfiles;
pub mod props;
pub mod settings;
pub mod sysfs;
pub mod usb;
pub mod volume_config;

pub use error::{Result, SysError};
pub use openfiles::ProcScanner;
pub use props::PropertyDir;
pub use settings::PropertySettings;
pub use usb::SysfsUsb;
pub use volume_config::VolumeConfigEntry;
