//! Echo task.
//!
//! Sends every byte received on the stream straight back. Generic over any
//! type implementing embedded_io_async, so it runs on the USB stdio stream
//! on the device and on the mock engine in tests.

use embassy_futures::yield_now;
use embedded_io::{Error, ErrorKind};
use embedded_io_async::{Read, Write};
use log::trace;

use crate::config::cdc::RX_BUFFER_SIZE;

/// Read one chunk and write it back. Returns the number of bytes echoed.
pub async fn echo_once<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
) -> Result<usize, ErrorKind> {
    let n = reader.read(buf).await.map_err(|e| e.kind())?;
    if n == 0 {
        return Ok(0);
    }

    writer.write_all(&buf[..n]).await.map_err(|e| e.kind())?;
    writer.flush().await.map_err(|e| e.kind())?;
    Ok(n)
}

/// Echo forever. Errors (host gone mid-echo) drop the chunk.
pub async fn echo_task<R: Read, W: Write>(mut reader: R, mut writer: W) -> ! {
    let mut buf = [0u8; RX_BUFFER_SIZE];

    loop {
        match echo_once(&mut reader, &mut writer, &mut buf).await {
            Ok(n) => trace!("echoed {} bytes", n),
            Err(kind) => {
                trace!("echo dropped: {:?}", kind);
                yield_now().await;
            }
        }
    }
}
