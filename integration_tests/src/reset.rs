//! Vendor requests to the firmware's reset interface.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rusb::{Direction, GlobalContext, Recipient, RequestType};

use crate::device::{PID, VID};

/// Reset interface class triple
const INTERFACE_CLASS: u8 = 0xFF;
const INTERFACE_SUBCLASS: u8 = 0x00;
const INTERFACE_PROTOCOL: u8 = 0x01;

const CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

/// Reboot requested from the device
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResetMode {
    /// Reboot into the ROM bootloader
    Bootsel,
    /// Restart the firmware through the watchdog
    Flash,
}

impl ResetMode {
    /// bRequest code understood by the reset interface
    pub fn request(self) -> u8 {
        match self {
            ResetMode::Bootsel => 0x01,
            ResetMode::Flash => 0x02,
        }
    }
}

/// Whether an interface descriptor is the reset interface
pub fn is_reset_interface(class: u8, subclass: u8, protocol: u8) -> bool {
    class == INTERFACE_CLASS && subclass == INTERFACE_SUBCLASS && protocol == INTERFACE_PROTOCOL
}

/// Find the reset interface number in the active configuration
fn find_reset_interface(device: &rusb::Device<GlobalContext>) -> Result<u8> {
    let config = device
        .active_config_descriptor()
        .context("Failed to read configuration descriptor")?;

    for interface in config.interfaces() {
        for desc in interface.descriptors() {
            if is_reset_interface(desc.class_code(), desc.sub_class_code(), desc.protocol_code()) {
                return Ok(desc.interface_number());
            }
        }
    }

    anyhow::bail!("Device has no reset interface")
}

/// Send the reset request for `mode`. Returns the interface it was sent to.
///
/// The device may reboot before the status stage completes, so a lost
/// device or broken pipe after sending counts as success.
pub fn send_reset(mode: ResetMode) -> Result<u8> {
    let mut handle = rusb::open_device_with_vid_pid(VID, PID).with_context(|| {
        format!("No USB device with VID {:04x} PID {:04x}", VID, PID)
    })?;

    let interface = find_reset_interface(&handle.device())?;
    handle
        .claim_interface(interface)
        .context("Failed to claim reset interface")?;

    let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Interface);
    let result = handle.write_control(
        request_type,
        mode.request(),
        0,
        u16::from(interface),
        &[],
        CONTROL_TIMEOUT,
    );

    match result {
        Ok(_) | Err(rusb::Error::NoDevice) | Err(rusb::Error::Pipe) | Err(rusb::Error::Io) => {
            Ok(interface)
        }
        Err(e) => Err(e).context("Reset request failed"),
    }
}
