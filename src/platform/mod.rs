//! ESP32-S3 bindings for the USB engine and the reset primitives

pub mod esp;
pub mod otg;
pub mod reset_class;

pub use esp::EspResetPlatform;
pub use otg::OtgEngine;
pub use reset_class::ResetClass;
