//! Character stream over the USB CDC data interface.

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{trace, warn};

use crate::config::stdio::DEFAULT_CRLF;
use crate::stdio::{InChars, StdioDriver};
use crate::usb::engine::UsbEngine;
use crate::usb::scheduler::UsbScheduler;

/// Stdio driver backed by the shared USB engine.
///
/// Every engine call goes through the scheduler's link mutex. Writes and
/// flushes poll without sleeping until they make progress or the host
/// disconnects; reads never wait.
pub struct UsbStdio<'a, M: RawMutex, E: UsbEngine> {
    scheduler: &'a UsbScheduler<M, E>,
    crlf: bool,
}

impl<'a, M: RawMutex, E: UsbEngine> UsbStdio<'a, M, E> {
    pub fn new(scheduler: &'a UsbScheduler<M, E>) -> Self {
        Self {
            scheduler,
            crlf: DEFAULT_CRLF,
        }
    }

    /// Override the line-ending translation flag reported to the stream layer
    pub fn with_crlf(mut self, crlf: bool) -> Self {
        self.crlf = crlf;
        self
    }
}

impl<M: RawMutex, E: UsbEngine> StdioDriver for UsbStdio<'_, M, E> {
    async fn out_chars(&mut self, buf: &[u8]) {
        // Never completes if the caller already holds the link.
        let mut link = self.scheduler.lock().await;
        let mut sofar = 0;

        while sofar < buf.len() {
            link.service();

            if !link.connected() {
                trace!("host disconnected, dropping {} bytes", buf.len() - sofar);
                return;
            }

            let avail = link.write_available();
            if avail == 0 {
                link.service();
                yield_now().await;
                continue;
            }

            let end = sofar + core::cmp::min(avail, buf.len() - sofar);
            match link.write(&buf[sofar..end]) {
                Ok(written) => {
                    sofar += core::cmp::min(written, end - sofar);
                    link.write_flush();
                }
                Err(e) => {
                    warn!("usb write failed: {:?}", e);
                    return;
                }
            }
        }

        link.service();
    }

    async fn in_chars(&mut self, buf: &mut [u8]) -> InChars {
        let status = self.scheduler.status();
        if !status.connected() || status.rx_available() == 0 {
            return InChars::NoData;
        }

        let mut link = self.scheduler.lock().await;
        link.service();

        let avail = core::cmp::min(link.available(), buf.len());
        if avail == 0 {
            link.service();
            return InChars::NoData;
        }

        InChars::from_count(link.read(&mut buf[..avail]))
    }

    async fn out_flush(&mut self) {
        loop {
            {
                let mut link = self.scheduler.lock().await;
                if !link.connected() {
                    return;
                }
                if link.write_available() == link.tx_capacity() {
                    return;
                }
                link.service();
            }
            yield_now().await;
        }
    }

    fn connected(&self) -> bool {
        self.scheduler.connected()
    }

    fn crlf_enabled(&self) -> bool {
        self.crlf
    }
}
