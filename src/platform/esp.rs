//! Reboot primitives for the ESP32-S3

use esp_hal::peripherals::LPWR;
use esp_hal::rtc_cntl::{Rtc, RwdtStage, RwdtStageAction};
use esp_hal::time::Duration;

use crate::reset::ResetPlatform;

/// Reboots through the RTC watchdog or into the ROM download mode
pub struct EspResetPlatform {
    rtc: Rtc<'static>,
}

impl EspResetPlatform {
    pub fn new(rtc: Rtc<'static>) -> Self {
        Self { rtc }
    }
}

impl ResetPlatform for EspResetPlatform {
    fn enter_bootloader(&mut self) {
        // Latched across the software reset, the ROM then stays in download mode
        LPWR::regs()
            .option1()
            .modify(|_, w| w.force_download_boot().set_bit());
        esp_hal::system::software_reset()
    }

    fn watchdog_reboot(&mut self, delay_ms: u32) {
        let rwdt = &mut self.rtc.rwdt;
        rwdt.set_timeout(RwdtStage::Stage0, Duration::from_millis(u64::from(delay_ms)));
        rwdt.set_stage_action(RwdtStage::Stage0, RwdtStageAction::ResetSystem);
        rwdt.enable();
    }
}
