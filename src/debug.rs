//! Logging backend for the firmware.
//!
//! `log` records are formatted into fixed-size lines and queued; a writer
//! task drains the queue onto a stdio driver. Queueing never blocks and
//! never touches the USB link, so logging is safe from anywhere, including
//! code that holds the link. Lines are dropped when the queue is full or
//! nobody is connected, and truncated when too long.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use log::{LevelFilter, Log, Metadata, Record};

use crate::config::logging::{MAX_LINE_LEN, QUEUE_DEPTH};
use crate::stdio::StdioDriver;

/// One formatted log line
pub type LogLine = String<MAX_LINE_LEN>;

/// Lines waiting for the writer task
pub static LOG_QUEUE: Channel<CriticalSectionRawMutex, LogLine, QUEUE_DEPTH> = Channel::new();

/// `log` backend that queues formatted records
pub struct UsbLogger;

static LOGGER: UsbLogger = UsbLogger;

impl Log for UsbLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            queue_line(format_record(record));
        }
    }

    fn flush(&self) {}
}

/// Install the queueing logger.
///
/// Returns false if a logger was already installed.
pub fn init(level: LevelFilter) -> bool {
    match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(level);
            true
        }
        Err(_) => false,
    }
}

/// Render a record as `LEVEL target: message`, truncated to fit
pub fn format_record(record: &Record) -> LogLine {
    let mut line = LogLine::new();
    // Overflow leaves whatever fitted
    let _ = write!(line, "{:<5} {}: {}", record.level(), record.target(), record.args());
    line
}

/// Queue a line without waiting. Returns false if it was dropped.
pub fn queue_line(line: LogLine) -> bool {
    LOG_QUEUE.try_send(line).is_ok()
}

/// Send one line with CR LF to `driver`, or drop it if nobody is listening.
///
/// The line goes out in a single write so nothing else on the stream can
/// land between it and its line ending.
pub async fn write_line<D: StdioDriver>(driver: &mut D, line: &str) {
    if !driver.connected() {
        return;
    }

    let body = &line.as_bytes()[..core::cmp::min(line.len(), MAX_LINE_LEN)];
    let mut out: Vec<u8, { MAX_LINE_LEN + 2 }> = Vec::new();
    // Sized for the longest line plus CR LF
    let _ = out.extend_from_slice(body);
    let _ = out.extend_from_slice(b"\r\n");
    driver.out_chars(&out).await;
}

/// Drain the log queue onto `driver` forever
pub async fn log_writer_task<D: StdioDriver>(mut driver: D) -> ! {
    loop {
        let line = LOG_QUEUE.receive().await;
        write_line(&mut driver, &line).await;
    }
}

/// Implementation behind the debug! macro.
pub fn debug_print(args: core::fmt::Arguments) {
    let mut line = LogLine::new();
    let _ = line.write_fmt(args);
    queue_line(line);
}

/// Queue a formatted line regardless of the log level.
///
/// Usage: `debug!("Hello, {}!", "world");`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::debug::debug_print(format_args!($($arg)*))
    };
}
