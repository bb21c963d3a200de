//! Wire formats seen by the reset interface driver
//!
//! Interface descriptors, setup packets and CDC line coding, as defined
//! by the USB 2.0 and CDC 1.2 specifications. All multi-byte fields are
//! little-endian.

/// Standard interface descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub interface_number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub interface_class: u8,
    pub interface_subclass: u8,
    pub interface_protocol: u8,
    /// String descriptor index, 0 for none
    pub interface_string: u8,
}

impl InterfaceDescriptor {
    /// Encoded size in bytes
    pub const LEN: usize = 9;
}

/// Stage of a control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStage {
    /// Setup packet received
    Setup,
    /// Data stage finished
    Data,
    /// Status stage acknowledged
    Ack,
}

/// Outcome of a completed endpoint transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Success,
    Failed,
    Stalled,
}

/// Setup packet of a control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    /// bmRequestType: direction, type and recipient bits
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex, the interface number for interface requests
    pub index: u16,
    /// wLength
    pub length: u16,
}

impl ControlRequest {
    /// bmRequestType for a host-to-device vendor request to an interface
    pub const VENDOR_INTERFACE_OUT: u8 = 0x41;
    /// bmRequestType for a device-to-host vendor request to an interface
    pub const VENDOR_INTERFACE_IN: u8 = 0xC1;
    /// bmRequestType for a host-to-device class request to an interface
    pub const CLASS_INTERFACE_OUT: u8 = 0x21;

    pub const fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value,
            index,
            length,
        }
    }
}

/// CDC line coding as set by SET_LINE_CODING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCoding {
    /// dwDTERate in bits per second
    pub bit_rate: u32,
    /// bCharFormat: 0 = 1 stop bit, 1 = 1.5, 2 = 2
    pub stop_bits: u8,
    /// bParityType: 0 none, 1 odd, 2 even, 3 mark, 4 space
    pub parity: u8,
    /// bDataBits
    pub data_bits: u8,
}

impl LineCoding {
    pub const LEN: usize = 7;
    /// bRequest of the CDC request carrying a line coding
    pub const SET_LINE_CODING: u8 = 0x20;

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::LEN {
            return None;
        }

        Some(Self {
            bit_rate: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            stop_bits: bytes[4],
            parity: bytes[5],
            data_bits: bytes[6],
        })
    }
}

impl Default for LineCoding {
    /// 9600 8N1
    fn default() -> Self {
        Self {
            bit_rate: 9600,
            stop_bits: 0,
            parity: 0,
            data_bits: 8,
        }
    }
}
