// SPDX-License-Identifier: GPL-3.0-only

mod mtp;
mod scanner;
mod settings;
mod usb;
mod volumes;

pub use mtp::{MtpBridge, MtpServer, MtpStorage};
pub use scanner::OpenFileScanner;
pub use settings::SettingsBridge;
pub use usb::UsbGadget;
pub use volumes::VolumeDirectory;
