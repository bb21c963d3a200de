//! usb-device class wrapping the reset interface driver
//!
//! Vendor requests to an interface are decoded in either direction. Class
//! requests to an interface are only looked at for a 1200 baud line coding
//! and are otherwise left for the CDC class, so this class has to come
//! before it in the poll list.

use log::warn;
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, Request, RequestType};

use crate::config::reset::{INTERFACE_CLASS, INTERFACE_PROTOCOL, INTERFACE_SUBCLASS};
use crate::reset::{ControlRequest, ControlStage, InterfaceDescriptor, ResetInterface, ResetPlatform};

/// Control-only vendor interface that reboots the device on request
pub struct ResetClass<P: ResetPlatform> {
    interface: InterfaceNumber,
    driver: ResetInterface,
    platform: P,
}

impl<P: ResetPlatform> ResetClass<P> {
    /// Allocate the interface. Must happen before the device is built.
    pub fn new<B: UsbBus>(alloc: &UsbBusAllocator<B>, platform: P) -> Self {
        Self {
            interface: alloc.interface(),
            driver: ResetInterface::new(),
            platform,
        }
    }

    fn descriptor(&self) -> InterfaceDescriptor {
        InterfaceDescriptor {
            interface_number: self.interface.into(),
            alternate_setting: 0,
            num_endpoints: 0,
            interface_class: INTERFACE_CLASS,
            interface_subclass: INTERFACE_SUBCLASS,
            interface_protocol: INTERFACE_PROTOCOL,
            interface_string: 0,
        }
    }

    /// Hand the configured interface to the driver
    pub fn open(&mut self) {
        let descriptor = self.descriptor();
        if self
            .driver
            .on_interface_open(&descriptor, InterfaceDescriptor::LEN as u16)
            == 0
        {
            warn!("reset interface {} not claimed", descriptor.interface_number);
        }
    }
}

fn setup_packet(req: &Request) -> ControlRequest {
    let request_type = req.direction as u8 | (req.request_type as u8) << 5 | req.recipient as u8;
    ControlRequest::new(request_type, req.request, req.value, req.index, req.length)
}

impl<B: UsbBus, P: ResetPlatform> UsbClass<B> for ResetClass<P> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> usb_device::Result<()> {
        writer.interface(
            self.interface,
            INTERFACE_CLASS,
            INTERFACE_SUBCLASS,
            INTERFACE_PROTOCOL,
        )
    }

    fn reset(&mut self) {
        self.driver.on_reset_event();
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = xfer.request();
        let request = setup_packet(req);

        let outcome = match (req.request_type, req.recipient) {
            (RequestType::Vendor, Recipient::Interface) => {
                self.driver.on_control_transfer(ControlStage::Setup, &request)
            }
            (RequestType::Class, Recipient::Interface) => {
                self.driver.on_class_request(&request, xfer.data())
            }
            _ => return,
        };

        // Accepting queues the status stage before the chip goes away
        outcome.complete(&mut self.platform, move || {
            let _ = xfer.accept();
        });
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = xfer.request();
        if req.request_type != RequestType::Vendor || req.recipient != Recipient::Interface {
            return;
        }

        let request = setup_packet(req);
        let outcome = self.driver.on_control_transfer(ControlStage::Setup, &request);
        outcome.complete(&mut self.platform, move || {
            let _ = xfer.accept_with(&[]);
        });
    }
}
