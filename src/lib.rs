#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod debug;
pub mod reset;
pub mod stdio;
pub mod tasks;
pub mod usb;

// Hardware bindings need the ESP HAL and the usb-device stack
#[cfg(feature = "embedded")]
pub mod platform;
