//! embedded_io_async wrappers for a stdio driver.
//!
//! This is the stream layer on top of a [`StdioDriver`]: it provides
//! Read/Write implementations and applies the driver's line-ending flag.

use embassy_futures::yield_now;
use embedded_io_async::{ErrorType, Read, Write};

use crate::stdio::{InChars, StdioDriver};

/// Error type for CDC I/O operations.
///
/// Returned when writing while no host has the port open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdcError;

impl embedded_io::Error for CdcError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::NotConnected
    }
}

/// Wrapper around a stdio driver that implements embedded_io_async::Read.
pub struct StdioReader<D: StdioDriver> {
    inner: D,
}

impl<D: StdioDriver> StdioReader<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: StdioDriver> ErrorType for StdioReader<D> {
    type Error = CdcError;
}

impl<D: StdioDriver> Read for StdioReader<D> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Wait for a host and for data, letting other tasks run meanwhile
        loop {
            match self.inner.in_chars(buf).await {
                InChars::Data(n) => return Ok(n),
                InChars::NoData => yield_now().await,
            }
        }
    }
}

/// Wrapper around a stdio driver that implements embedded_io_async::Write.
///
/// When the driver asks for it, every LF not already preceded by CR is
/// sent as CR LF.
pub struct StdioWriter<D: StdioDriver> {
    inner: D,
    last_was_cr: bool,
}

impl<D: StdioDriver> StdioWriter<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            last_was_cr: false,
        }
    }

    async fn write_translated(&mut self, buf: &[u8]) {
        let mut start = 0;

        for (i, &byte) in buf.iter().enumerate() {
            let prev_cr = if i == 0 {
                self.last_was_cr
            } else {
                buf[i - 1] == b'\r'
            };

            if byte == b'\n' && !prev_cr {
                if start < i {
                    self.inner.out_chars(&buf[start..i]).await;
                }
                self.inner.out_chars(b"\r").await;
                // The LF itself goes out with the next segment
                start = i;
            }
        }

        if start < buf.len() {
            self.inner.out_chars(&buf[start..]).await;
        }
    }
}

impl<D: StdioDriver> ErrorType for StdioWriter<D> {
    type Error = CdcError;
}

impl<D: StdioDriver> Write for StdioWriter<D> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.inner.connected() {
            return Err(CdcError);
        }

        if self.inner.crlf_enabled() {
            self.write_translated(buf).await;
        } else {
            self.inner.out_chars(buf).await;
        }
        self.last_was_cr = buf.last() == Some(&b'\r');

        // Bytes lost to a disconnect mid-write are not reported
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.out_flush().await;
        Ok(())
    }
}
