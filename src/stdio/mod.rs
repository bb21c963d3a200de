//! Character stream drivers.
//!
//! A [`StdioDriver`] is one of possibly several chained output/input
//! drivers. The stream layer above it decides what to do with the
//! line-ending flag; drivers only carry it.

pub mod usb;

use core::future::Future;

use crate::config::stdio::DEFAULT_CRLF;

pub use usb::UsbStdio;

/// Outcome of a non-blocking read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InChars {
    /// `n > 0` bytes were copied
    Data(usize),
    /// Nothing available right now, try again later
    NoData,
}

impl InChars {
    /// Normalise a copied byte count; zero is never a distinct success
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::NoData
        } else {
            Self::Data(count)
        }
    }

}

/// Character stream driver interface
pub trait StdioDriver {
    /// Write all of `buf`, or as much as can be sent before the host goes away.
    ///
    /// The caller is not told how much was sent.
    fn out_chars(&mut self, buf: &[u8]) -> impl Future<Output = ()>;

    /// Copy whatever is available into `buf` without waiting for more
    fn in_chars(&mut self, buf: &mut [u8]) -> impl Future<Output = InChars>;

    /// Wait until everything written has left the device or the host is gone
    fn out_flush(&mut self) -> impl Future<Output = ()>;

    /// Whether a reader is attached on the other end
    fn connected(&self) -> bool;

    /// Whether the stream layer should translate LF into CR LF
    fn crlf_enabled(&self) -> bool {
        DEFAULT_CRLF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_count_is_no_data() {
        assert_eq!(InChars::from_count(0), InChars::NoData);
        assert_eq!(InChars::from_count(5), InChars::Data(5));
    }
}
