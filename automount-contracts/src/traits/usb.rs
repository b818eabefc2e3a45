// SPDX-License-Identifier: GPL-3.0-only

use automount_types::UsbFunction;

/// Read/write access to the kernel USB gadget and the USB configuration
/// properties.
///
/// Reads are point-in-time samples with no side effects. A read failure on
/// a status file is reported as "unavailable"/false by implementations
/// (and logged there); the core then continues with degraded information.
pub trait UsbGadget: Send {
    /// Whether a USB cable is attached to a host (link connected or
    /// configured).
    fn cable_plugged(&self) -> bool;

    /// Whether the USB link has reached the configured state.
    fn configured(&self) -> bool;

    /// The active function list (comma-separated), or `None` when the
    /// gadget interface is not present on this hardware generation.
    fn active_functions(&self) -> Option<String>;

    /// Whether the kernel exposes the given gadget function at all.
    fn function_available(&self, func: UsbFunction) -> bool;

    /// The desired function configuration property (`sys.usb.config`).
    fn desired_config(&self) -> String;

    /// Rewrite the desired function configuration property. The kernel
    /// reacts asynchronously; the link will renegotiate.
    fn set_desired_config(&self, config: &str);

    /// The persisted default function configuration
    /// (`persist.sys.usb.config`).
    fn persisted_config(&self) -> String;
}
