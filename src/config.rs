//! Compile-time configuration for the USB stdio link and reset interface

/// USB device identity and packet sizes
pub mod usb {
    /// pid.codes test vendor ID
    pub const VID: u16 = 0x1209;
    /// pid.codes test product ID
    pub const PID: u16 = 0x0001;

    pub const MANUFACTURER: &str = "usb-stdio-reset";
    pub const PRODUCT: &str = "Board CDC";
    pub const SERIAL_NUMBER: &str = "0000000000000000";

    /// Control endpoint max packet size
    pub const EP0_PACKET_SIZE: u8 = 64;

    /// CDC bulk endpoint max packet size
    pub const CDC_PACKET_SIZE: u16 = 64;
}

/// CDC software FIFOs
pub mod cdc {
    pub const RX_BUFFER_SIZE: usize = 64;
    pub const TX_BUFFER_SIZE: usize = 64;
}

/// Character stream defaults
pub mod stdio {
    /// Whether the stream layer translates LF into CR LF by default
    pub const DEFAULT_CRLF: bool = true;
}

/// Background USB servicing
pub mod scheduler {
    /// Delay between periodic engine services, relative to the end of the previous one
    pub const TICK_INTERVAL_US: u32 = 1000;
}

/// Vendor reset interface
pub mod reset {
    /// Vendor specific interface class
    pub const INTERFACE_CLASS: u8 = 0xFF;
    pub const INTERFACE_SUBCLASS: u8 = 0x00;
    pub const INTERFACE_PROTOCOL: u8 = 0x01;

    /// Reboot into the ROM bootloader
    pub const REQUEST_BOOTSEL: u8 = 0x01;

    /// Reboot the current firmware through the watchdog
    pub const REQUEST_FLASH: u8 = 0x02;

    /// Leaves time for the status stage of the control transfer to complete
    pub const WATCHDOG_DELAY_MS: u32 = 100;

    /// Line coding bit rate that requests the bootloader
    pub const BOOTSEL_BIT_RATE: u32 = 1200;
}

/// Log output queue
pub mod logging {
    /// Maximum length of a single formatted log line
    pub const MAX_LINE_LEN: usize = 128;

    /// Lines held before new records are dropped
    pub const QUEUE_DEPTH: usize = 8;
}
