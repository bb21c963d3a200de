//! Background USB servicing task.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use log::info;

use crate::config::scheduler::TICK_INTERVAL_US;
use crate::usb::{UsbEngine, UsbScheduler};

/// Keep the USB link serviced while no foreground caller holds it.
///
/// Runs for the lifetime of the program.
pub async fn usb_tick_task<M: RawMutex, E: UsbEngine, D: DelayNs>(
    scheduler: &UsbScheduler<M, E>,
    delay: D,
) -> ! {
    info!("usb tick every {} us", TICK_INTERVAL_US);
    scheduler.run_periodic(delay).await
}
