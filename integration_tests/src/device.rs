//! Device communication client.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::{SerialPort, SerialPortType};

/// pid.codes test VID/PID the firmware enumerates with
pub const VID: u16 = 0x1209;
pub const PID: u16 = 0x0001;

/// Bit rate that makes the firmware reboot into its bootloader
pub const BOOTSEL_BAUD: u32 = 1200;

/// Find CDC ports belonging to the firmware by USB VID/PID.
pub fn find_data_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .filter(|port| match &port.port_type {
            SerialPortType::UsbPort(usb) => usb.vid == VID && usb.pid == PID,
            _ => false,
        })
        .map(|port| port.port_name)
        .collect())
}

/// Find a single data port. Returns error if none found.
pub fn find_data_port() -> Result<String> {
    let ports = find_data_ports()?;
    match ports.into_iter().next() {
        Some(port) => Ok(port),
        None => anyhow::bail!(
            "No port with VID {:04x} PID {:04x} found - ensure device is connected",
            VID,
            PID
        ),
    }
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_data_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Open the port at 1200 baud and close it again.
///
/// Setting the line coding is what triggers the reboot; the device
/// disappears shortly after.
pub fn touch_bootsel(port_name: &str) -> Result<()> {
    let port = serialport::new(port_name, BOOTSEL_BAUD)
        .timeout(Duration::from_millis(100))
        .open()?;
    drop(port);
    Ok(())
}

/// Client for the echo stream on the device's CDC port.
pub struct DeviceClient {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl DeviceClient {
    /// Create a new device client.
    ///
    /// Opening the port asserts DTR, which is what the firmware treats
    /// as "connected".
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let mut port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        port.write_data_terminal_ready(true)?;

        Ok(Self {
            port,
            timeout: Duration::from_secs(2),
        })
    }

    /// Drain all pending data from the serial port.
    /// Reads until no more data is available (with a short timeout).
    pub fn drain_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;

        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Write all of `data`.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read exactly `len` bytes or fail on timeout.
    pub fn receive(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len);
        let mut buf = [0u8; 256];
        let start = Instant::now();

        while data.len() < len {
            if start.elapsed() > self.timeout {
                anyhow::bail!(
                    "Timeout waiting for data, got {} of {} bytes",
                    data.len(),
                    len
                );
            }

            let want = std::cmp::min(buf.len(), len - data.len());
            match self.port.read(&mut buf[..want]) {
                Ok(n) => data.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(data)
    }

    /// Send `data` and read back the same number of bytes.
    pub fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.send(data)?;
        self.receive(data.len())
    }

    /// Send `data` in chunks, reading the echo back as it arrives.
    ///
    /// The device only buffers a packet or so, so writing everything
    /// before reading would stall both sides.
    pub fn echo_chunked(&mut self, data: &[u8], chunk: usize) -> Result<Vec<u8>> {
        let mut echoed = Vec::with_capacity(data.len());
        for piece in data.chunks(chunk) {
            echoed.extend(self.echo(piece)?);
        }
        Ok(echoed)
    }
}

/// Deterministic test pattern that covers every byte value.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 256) as u8).collect()
}
