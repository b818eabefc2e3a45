// SPDX-License-Identifier: GPL-3.0-only

//! The USB function state machine.
//!
//! [`step`] is a pure decision function: given the current state and a USB
//! snapshot it returns the next state and the side effects to perform. The
//! caller (the update pass) executes the actions and records the state.

use automount_types::UsbFunction;

use crate::usb::UsbSnapshot;

/// USB function negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbState {
    /// Nothing is being shared or served.
    Idle,
    /// mtp has been written into the desired configuration; waiting for
    /// the kernel to report it configured.
    MtpConfiguring,
    /// The MTP server is running.
    MtpStarted,
    /// The MTP server has an active session with the host.
    MtpConnected,
    /// mass_storage has been written into the desired configuration;
    /// waiting for the kernel to report it configured.
    UmsConfiguring,
    /// mass_storage is configured; volumes can be shared once enabled.
    UmsConfigured,
}

impl UsbState {
    pub fn as_str(self) -> &'static str {
        match self {
            UsbState::Idle => "idle",
            UsbState::MtpConfiguring => "mtp-configuring",
            UsbState::MtpStarted => "mtp-started",
            UsbState::MtpConnected => "mtp-connected",
            UsbState::UmsConfiguring => "ums-configuring",
            UsbState::UmsConfigured => "ums-configured",
        }
    }

    /// Whether the MTP server must be running in this state.
    pub fn mtp_running(self) -> bool {
        matches!(self, UsbState::MtpStarted | UsbState::MtpConnected)
    }
}

/// A side effect requested by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UsbAction {
    StartMtp,
    StopMtp,
    SelectFunction(UsbFunction),
}

/// One step of the state machine. Total and deterministic over every
/// reachable `(state, snapshot)` pair.
pub(crate) fn step(state: UsbState, usb: &UsbSnapshot) -> (UsbState, Vec<UsbAction>) {
    match state {
        UsbState::Idle => {
            if !usb.cable_plugged {
                // A cable event arrives when that changes.
                (UsbState::Idle, vec![])
            } else if usb.mtp_enabled {
                if usb.mtp_configured {
                    // The gadget was already configured for mtp, e.g. after
                    // a daemon restart with the property still set.
                    (UsbState::MtpStarted, vec![UsbAction::StartMtp])
                } else {
                    (
                        UsbState::MtpConfiguring,
                        vec![UsbAction::SelectFunction(UsbFunction::Mtp)],
                    )
                }
            } else if usb.ums_configured {
                (UsbState::UmsConfigured, vec![])
            } else if usb.ums_avail {
                // Selected whether or not UMS is enabled: with UMS it is the
                // sharing of a volume that matters, and the gadget must not
                // be left in mtp mode while mtp is disabled.
                (
                    UsbState::UmsConfiguring,
                    vec![UsbAction::SelectFunction(UsbFunction::MassStorage)],
                )
            } else {
                (UsbState::Idle, vec![])
            }
        }

        UsbState::MtpConfiguring => {
            // The link bounces through disconnected/connected while the
            // kernel reconfigures, so cable state is not consulted here.
            if usb.mtp_enabled && usb.mtp_configured {
                (UsbState::MtpStarted, vec![UsbAction::StartMtp])
            } else {
                (UsbState::MtpConfiguring, vec![])
            }
        }

        UsbState::MtpStarted | UsbState::MtpConnected => {
            if usb.cable_plugged && usb.mtp_configured && usb.mtp_enabled {
                (state, vec![])
            } else if usb.ums_avail {
                (
                    UsbState::UmsConfiguring,
                    vec![
                        UsbAction::StopMtp,
                        UsbAction::SelectFunction(UsbFunction::MassStorage),
                    ],
                )
            } else {
                (UsbState::Idle, vec![UsbAction::StopMtp])
            }
        }

        UsbState::UmsConfiguring => {
            // Same renegotiation bounce as MtpConfiguring.
            if usb.ums_configured {
                (UsbState::UmsConfigured, vec![])
            } else {
                (UsbState::UmsConfiguring, vec![])
            }
        }

        UsbState::UmsConfigured => {
            if usb.cable_plugged && usb.mtp_enabled {
                (
                    UsbState::MtpConfiguring,
                    vec![UsbAction::SelectFunction(UsbFunction::Mtp)],
                )
            } else if usb.cable_plugged && usb.ums_configured && usb.ums_enabled {
                (UsbState::UmsConfigured, vec![])
            } else {
                (UsbState::Idle, vec![])
            }
        }
    }
}
