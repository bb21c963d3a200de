//! Vendor reset interface.
//!
//! Lets the host reboot the device into its bootloader or restart the
//! running firmware without touching the board.

pub mod actions;
pub mod descriptor;
pub mod driver;

pub use actions::{ResetAction, ResetPlatform};
pub use descriptor::{ControlRequest, ControlStage, InterfaceDescriptor, LineCoding, TransferResult};
pub use driver::{ControlOutcome, ResetInterface};
