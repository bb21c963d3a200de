//! Embassy tasks module
//!
//! The task bodies are generic so they can be driven on the host; the
//! firmware wraps each in a concrete `#[embassy_executor::task]`.

pub mod echo;
pub mod usb;

pub use echo::{echo_once, echo_task};
pub use usb::usb_tick_task;
