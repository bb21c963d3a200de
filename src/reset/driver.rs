//! Vendor reset interface class driver
//!
//! Claims one control-only vendor interface during enumeration and turns
//! two vendor requests on it into reboots. A host setting the CDC bit rate
//! to 1200 baud is treated as a bootloader request too.

use log::{debug, trace};

use crate::config::reset::{
    BOOTSEL_BIT_RATE, INTERFACE_CLASS, INTERFACE_PROTOCOL, INTERFACE_SUBCLASS, REQUEST_BOOTSEL,
    REQUEST_FLASH, WATCHDOG_DELAY_MS,
};
use crate::reset::actions::{ResetAction, ResetPlatform};
use crate::reset::descriptor::{
    ControlRequest, ControlStage, InterfaceDescriptor, LineCoding, TransferResult,
};

/// Interface number before the interface has been opened
pub const UNASSIGNED: u8 = 0;

/// What the device stack should do with a control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Not for this driver; let another handle it or stall
    Rejected,
    /// Handled, complete the transfer normally
    Accepted,
    /// Handled, and the host asked for a reboot
    Reset(ResetAction),
}

impl ControlOutcome {
    /// Finish the transfer and carry out any reset.
    ///
    /// `accept` completes the transfer on the bus. It runs before the reset
    /// so the status stage is queued while the device is still there.
    /// Returns whether the transfer was handled.
    pub fn complete<P: ResetPlatform + ?Sized>(self, platform: &mut P, accept: impl FnOnce()) -> bool {
        match self {
            ControlOutcome::Rejected => false,
            ControlOutcome::Accepted => {
                accept();
                true
            }
            ControlOutcome::Reset(action) => {
                accept();
                action.perform(platform);
                true
            }
        }
    }
}

/// Reset interface state, owned by the device stack's class dispatch
#[derive(Debug, Default)]
pub struct ResetInterface {
    interface_number: u8,
}

impl ResetInterface {
    pub const fn new() -> Self {
        Self {
            interface_number: UNASSIGNED,
        }
    }

    /// Interface number recorded by the last successful open
    pub fn interface_number(&self) -> u8 {
        self.interface_number
    }

    /// Bus reset or re-enumeration
    pub fn on_reset_event(&mut self) {
        self.interface_number = UNASSIGNED;
    }

    /// Try to claim an interface during enumeration.
    ///
    /// Returns the number of descriptor bytes consumed, 0 if the interface
    /// is not ours or the remaining descriptor space is too short.
    pub fn on_interface_open(&mut self, descriptor: &InterfaceDescriptor, max_len: u16) -> u16 {
        if descriptor.interface_class != INTERFACE_CLASS
            || descriptor.interface_subclass != INTERFACE_SUBCLASS
            || descriptor.interface_protocol != INTERFACE_PROTOCOL
        {
            trace!(
                "reset: ignoring interface {} ({:02x}/{:02x}/{:02x})",
                descriptor.interface_number,
                descriptor.interface_class,
                descriptor.interface_subclass,
                descriptor.interface_protocol
            );
            return 0;
        }

        let driver_len = InterfaceDescriptor::LEN as u16;
        if max_len < driver_len {
            return 0;
        }

        self.interface_number = descriptor.interface_number;
        debug!("reset: opened on interface {}", self.interface_number);
        driver_len
    }

    /// Decode a control transfer addressed to the device.
    pub fn on_control_transfer(&self, stage: ControlStage, request: &ControlRequest) -> ControlOutcome {
        // Nothing to do in the data and status stages
        if stage != ControlStage::Setup {
            return ControlOutcome::Accepted;
        }

        if request.index != u16::from(self.interface_number) {
            return ControlOutcome::Rejected;
        }

        match request.request {
            REQUEST_BOOTSEL => ControlOutcome::Reset(ResetAction::Bootloader),
            REQUEST_FLASH => ControlOutcome::Reset(ResetAction::Reboot {
                delay_ms: WATCHDOG_DELAY_MS,
            }),
            _ => ControlOutcome::Rejected,
        }
    }

    /// Look at a class request to any interface for the legacy trigger.
    ///
    /// Only SET_LINE_CODING carrying 1200 baud is acted on. Everything else,
    /// including other bit rates, is left for the CDC class.
    pub fn on_class_request(&self, request: &ControlRequest, data: &[u8]) -> ControlOutcome {
        if request.request_type != ControlRequest::CLASS_INTERFACE_OUT
            || request.request != LineCoding::SET_LINE_CODING
        {
            return ControlOutcome::Rejected;
        }

        match LineCoding::parse(data).and_then(|coding| self.on_line_coding(&coding)) {
            Some(action) => ControlOutcome::Reset(action),
            None => ControlOutcome::Rejected,
        }
    }

    /// The interface has no endpoints, so there is never anything to do.
    pub fn on_transfer_complete(
        &mut self,
        _endpoint: u8,
        _result: TransferResult,
        _transferred: u32,
    ) -> bool {
        true
    }

    /// Legacy trigger: 1200 baud means "reboot into the bootloader".
    pub fn on_line_coding(&self, coding: &LineCoding) -> Option<ResetAction> {
        (coding.bit_rate == BOOTSEL_BIT_RATE).then_some(ResetAction::Bootloader)
    }
}
