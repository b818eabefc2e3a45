// SPDX-License-Identifier: GPL-3.0-only

//! USB status sampling and function selection.

use automount_contracts::UsbGadget;
use automount_types::{AutomountMode, UsbFunction};

/// Point-in-time sample of the USB subsystem, taken once per pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbSnapshot {
    pub cable_plugged: bool,
    pub ums_avail: bool,
    pub ums_configured: bool,
    pub ums_enabled: bool,
    pub mtp_avail: bool,
    pub mtp_configured: bool,
    pub mtp_enabled: bool,
}

impl UsbSnapshot {
    /// Sample the gadget. Reads only; no side effects.
    ///
    /// A function counts as configured when the link is configured AND the
    /// active function list names it. A function counts as enabled when the
    /// mode requests it, or when the mode is `DisableWhenUnplugged` and the
    /// function is already configured (tearing it down mid-unplug is what
    /// that mode exists to avoid).
    pub fn capture(usb: &dyn UsbGadget, mode: AutomountMode) -> Self {
        let mut snap = UsbSnapshot {
            cable_plugged: usb.cable_plugged(),
            ..UsbSnapshot::default()
        };

        let Some(functions) = usb.active_functions() else {
            return snap;
        };
        let configured = usb.configured();

        snap.ums_avail = usb.function_available(UsbFunction::MassStorage);
        if snap.ums_avail {
            snap.ums_configured = configured && UsbFunction::MassStorage.in_list(&functions);
            snap.ums_enabled = mode == AutomountMode::EnableUms
                || (mode == AutomountMode::DisableWhenUnplugged && snap.ums_configured);
        }

        snap.mtp_avail = usb.function_available(UsbFunction::Mtp);
        if snap.mtp_avail {
            snap.mtp_configured = configured && UsbFunction::Mtp.in_list(&functions);
            snap.mtp_enabled = mode == AutomountMode::EnableMtp
                || (mode == AutomountMode::DisableWhenUnplugged && snap.mtp_configured);
        }

        snap
    }
}

/// Rewrite the desired function configuration to select `func` as the
/// primary personality.
///
/// The rewrite preserves whatever the debug bridge state currently is: adb
/// stays in the list if it was there, and is stripped from the new value if
/// it was not. If `func` is already listed the property is left untouched,
/// so a pass that re-samples an already-correct configuration does not
/// bounce the link.
pub(crate) fn select_function(usb: &dyn UsbGadget, func: UsbFunction) {
    let current = usb.desired_config();
    if func.in_list(&current) {
        tracing::debug!("usb function {func} already selected; nothing to do");
        return;
    }

    let mut next = match func {
        UsbFunction::Mtp => UsbFunction::Mtp.as_str().to_string(),
        // The persisted default is assumed to carry mass_storage.
        UsbFunction::MassStorage => usb.persisted_config(),
        UsbFunction::Adb => {
            debug_assert!(false, "adb is never the primary usb function");
            tracing::error!("refusing to select adb as the primary usb function");
            return;
        }
    };

    if UsbFunction::Adb.in_list(&current) {
        if !UsbFunction::Adb.in_list(&next) {
            next = append_function(&next, UsbFunction::Adb);
        }
    } else if UsbFunction::Adb.in_list(&next) {
        next = remove_function(&next, UsbFunction::Adb);
    }

    tracing::info!("selecting usb function {func}: desired config set to '{next}'");
    usb.set_desired_config(&next);
}

fn append_function(list: &str, func: UsbFunction) -> String {
    if list.is_empty() {
        func.as_str().to_string()
    } else {
        format!("{list},{}", func.as_str())
    }
}

fn remove_function(list: &str, func: UsbFunction) -> String {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && *token != func.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
