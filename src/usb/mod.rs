//! USB link shared between the background tick and stdio.
//!
//! - `engine`: the device stack as seen by the core
//! - `scheduler`: the link mutex and periodic servicing
//! - `cdc_io`: embedded-io adapters over a stdio driver

pub mod cdc_io;
pub mod engine;
pub mod scheduler;

pub use cdc_io::{CdcError, StdioReader, StdioWriter};
pub use engine::{UsbEngine, UsbError};
pub use scheduler::{LinkStatus, UsbLink, UsbScheduler};
