//! Reset actions and the platform primitives that carry them out
//!
//! Requests decoded by the reset interface end in one of two terminal
//! actions. They are returned as [`ResetAction`] values so the decision
//! can be inspected before anything reboots; [`ResetAction::perform`]
//! hands them to the platform.

use log::info;

/// A reboot requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetAction {
    /// Restart into the ROM bootloader. Does not return on hardware.
    Bootloader,
    /// Restart the current firmware through the watchdog after a delay
    Reboot { delay_ms: u32 },
}

impl ResetAction {
    pub fn perform<P: ResetPlatform + ?Sized>(self, platform: &mut P) {
        match self {
            ResetAction::Bootloader => {
                info!("entering bootloader");
                platform.enter_bootloader();
            }
            ResetAction::Reboot { delay_ms } => {
                info!("rebooting in {} ms", delay_ms);
                platform.watchdog_reboot(delay_ms);
            }
        }
    }
}

/// Platform reboot primitives
pub trait ResetPlatform {
    /// Reboot into the ROM bootloader
    fn enter_bootloader(&mut self);

    /// Arm the watchdog to reset the chip after `delay_ms`
    fn watchdog_reboot(&mut self, delay_ms: u32);
}
