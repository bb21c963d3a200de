//! USB engine over the usb-device stack and a CDC-ACM class
//!
//! `task()` is the single step of the device stack: one poll of the bus,
//! then received packets move into the RX FIFO and queued bytes move from
//! the TX FIFO into the IN endpoint.
//!
//! The reset class is polled ahead of the serial class so it sees every
//! SET_LINE_CODING before the CDC class accepts it.

use heapless::Deque;
use log::{debug, info};
use usb_device::bus::UsbBus;
use usb_device::device::{UsbDevice, UsbDeviceState};
use usb_device::UsbError as DeviceError;
use usbd_serial::CdcAcmClass;

use crate::config::cdc::{RX_BUFFER_SIZE, TX_BUFFER_SIZE};
use crate::config::usb::CDC_PACKET_SIZE;
use crate::platform::reset_class::ResetClass;
use crate::reset::ResetPlatform;
use crate::usb::engine::{UsbEngine, UsbError};

const PACKET: usize = CDC_PACKET_SIZE as usize;

pub struct OtgEngine<'d, B: UsbBus, P: ResetPlatform> {
    device: UsbDevice<'d, B>,
    serial: CdcAcmClass<'d, B>,
    reset: ResetClass<P>,
    rx: Deque<u8, RX_BUFFER_SIZE>,
    tx: Deque<u8, TX_BUFFER_SIZE>,
    configured: bool,
    /// Last packet was full, the host needs a ZLP to end the transfer
    needs_zlp: bool,
}

impl<'d, B: UsbBus, P: ResetPlatform> OtgEngine<'d, B, P> {
    /// Both classes must have been allocated on the bus `device` was built from,
    /// the reset class first so its interface comes first in the descriptors.
    pub fn new(device: UsbDevice<'d, B>, serial: CdcAcmClass<'d, B>, reset: ResetClass<P>) -> Self {
        Self {
            device,
            serial,
            reset,
            rx: Deque::new(),
            tx: Deque::new(),
            configured: false,
            needs_zlp: false,
        }
    }

    fn on_state_change(&mut self, configured: bool) {
        self.configured = configured;
        if configured {
            info!("usb configured");
            self.reset.open();
        } else {
            debug!("usb deconfigured, dropping {} rx / {} tx bytes", self.rx.len(), self.tx.len());
            self.rx.clear();
            self.tx.clear();
            self.needs_zlp = false;
        }
    }

    fn pull_rx(&mut self) {
        while self.rx.capacity() - self.rx.len() >= PACKET {
            let mut packet = [0u8; PACKET];
            match self.serial.read_packet(&mut packet) {
                Ok(0) | Err(_) => break,
                Ok(count) => {
                    for &byte in &packet[..count] {
                        // Space was checked above
                        let _ = self.rx.push_back(byte);
                    }
                }
            }
        }
    }

    fn push_tx(&mut self) {
        while !self.tx.is_empty() {
            let mut packet = [0u8; PACKET];
            let mut len = 0;
            for (slot, &byte) in packet.iter_mut().zip(self.tx.iter()) {
                *slot = byte;
                len += 1;
            }

            match self.serial.write_packet(&packet[..len]) {
                Ok(written) => {
                    for _ in 0..written {
                        self.tx.pop_front();
                    }
                    self.needs_zlp = written == PACKET;
                }
                Err(DeviceError::WouldBlock) => return,
                Err(e) => {
                    debug!("cdc write failed: {:?}", e);
                    return;
                }
            }
        }

        if self.needs_zlp && self.serial.write_packet(&[]).is_ok() {
            self.needs_zlp = false;
        }
    }
}

impl<B: UsbBus, P: ResetPlatform> UsbEngine for OtgEngine<'_, B, P> {
    fn task(&mut self) {
        self.device.poll(&mut [&mut self.reset, &mut self.serial]);

        let configured = self.device.state() == UsbDeviceState::Configured;
        if configured != self.configured {
            self.on_state_change(configured);
        }
        if !configured {
            return;
        }

        self.pull_rx();
        self.push_tx();
    }

    fn connected(&self) -> bool {
        self.configured && self.serial.dtr()
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.rx.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    fn write_available(&self) -> usize {
        self.tx.capacity() - self.tx.len()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UsbError> {
        if !self.configured {
            return Err(UsbError::Disconnected);
        }

        let mut count = 0;
        for &byte in data {
            if self.tx.push_back(byte).is_err() {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn write_flush(&mut self) {
        if self.configured {
            self.push_tx();
        }
    }

    fn tx_capacity(&self) -> usize {
        TX_BUFFER_SIZE
    }
}
