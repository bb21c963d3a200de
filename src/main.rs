#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;
use esp_backtrace as _;
use esp_hal::otg_fs::{Usb, UsbBus};
use esp_hal::rtc_cntl::Rtc;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;
use usb_device::bus::UsbBusAllocator;
use usb_device::device::{StringDescriptors, UsbDeviceBuilder, UsbVidPid};
use usbd_serial::CdcAcmClass;

use usb_stdio_reset::config;
use usb_stdio_reset::platform::{EspResetPlatform, OtgEngine, ResetClass};
use usb_stdio_reset::stdio::UsbStdio;
use usb_stdio_reset::usb::{StdioReader, StdioWriter, UsbScheduler};
use usb_stdio_reset::{debug, tasks};

type Bus = UsbBus<Usb<'static>>;
type Engine = OtgEngine<'static, Bus, EspResetPlatform>;
type Scheduler = UsbScheduler<CriticalSectionRawMutex, Engine>;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Endpoint memory for the OTG FIFOs
static EP_MEMORY: StaticCell<[u32; 1024]> = StaticCell::new();

static USB_BUS: StaticCell<UsbBusAllocator<Bus>> = StaticCell::new();

/// Shared by the tick task and every stream user
static SCHEDULER: StaticCell<Scheduler> = StaticCell::new();

#[esp_hal::main]
fn main() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // USB owns the PHY, so boot messages go out on UART0
    esp_println::println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    // Log lines share the stream with the echo, keep them rare
    if !debug::init(log::LevelFilter::Warn) {
        esp_println::println!("logger already installed");
    }

    let platform = EspResetPlatform::new(Rtc::new(peripherals.LPWR));

    let usb = Usb::new(peripherals.USB0, peripherals.GPIO20, peripherals.GPIO19);
    let bus: &'static UsbBusAllocator<Bus> = USB_BUS.init(UsbBus::new(usb, EP_MEMORY.init([0; 1024])));

    // Classes must be allocated before the device is built, in poll order
    let reset = ResetClass::new(bus, platform);
    let serial = CdcAcmClass::new(bus, config::usb::CDC_PACKET_SIZE);
    let device = UsbDeviceBuilder::new(bus, UsbVidPid(config::usb::VID, config::usb::PID))
        .strings(&[StringDescriptors::default()
            .manufacturer(config::usb::MANUFACTURER)
            .product(config::usb::PRODUCT)
            .serial_number(config::usb::SERIAL_NUMBER)])
        .expect("Failed to set USB strings")
        .max_packet_size_0(config::usb::EP0_PACKET_SIZE)
        .expect("Invalid EP0 packet size")
        .composite_with_iads()
        .build();

    // Created once, before any task can touch the engine
    let scheduler: &'static Scheduler =
        SCHEDULER.init(UsbScheduler::new(OtgEngine::new(device, serial, reset)));

    usb_stdio_reset::debug!("{} ready", config::usb::PRODUCT);

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(usb_tick_task(scheduler));
        spawner.must_spawn(log_task(scheduler));
        spawner.must_spawn(echo_task(scheduler));
    })
}

/// Periodic background servicing of the USB engine
#[embassy_executor::task]
async fn usb_tick_task(scheduler: &'static Scheduler) -> ! {
    tasks::usb_tick_task(scheduler, Delay).await
}

/// Task that drains queued log lines onto the CDC stream
#[embassy_executor::task]
async fn log_task(scheduler: &'static Scheduler) -> ! {
    debug::log_writer_task(UsbStdio::new(scheduler)).await
}

/// Echo received bytes back unchanged
#[embassy_executor::task]
async fn echo_task(scheduler: &'static Scheduler) -> ! {
    let reader = StdioReader::new(UsbStdio::new(scheduler));
    let writer = StdioWriter::new(UsbStdio::new(scheduler).with_crlf(false));
    tasks::echo_task(reader, writer).await
}
