//! USB I/O scheduler
//!
//! The USB engine is shared between two callers: a periodic background
//! tick that keeps the link alive, and the foreground stream operations.
//! Both go through the link mutex owned here. Foreground callers wait for
//! it; the tick only ever tries once and skips its period on contention.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;
use log::trace;

use crate::config::scheduler::TICK_INTERVAL_US;
use crate::usb::engine::{UsbEngine, UsbError};

/// Connection snapshot readable without taking the link mutex.
///
/// Refreshed from the engine every time the link is acquired and after
/// every service, so it is never older than one tick interval while the
/// background tick is running.
pub struct LinkStatus {
    connected: AtomicBool,
    rx_available: AtomicUsize,
}

impl LinkStatus {
    const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            rx_available: AtomicUsize::new(0),
        }
    }

    fn refresh<E: UsbEngine>(&self, engine: &E) {
        self.connected.store(engine.connected(), Ordering::Relaxed);
        self.rx_available.store(engine.available(), Ordering::Relaxed);
    }

    /// Whether a host had the stream open at the last refresh
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Bytes waiting to be read at the last refresh
    pub fn rx_available(&self) -> usize {
        self.rx_available.load(Ordering::Relaxed)
    }
}

/// Owner of the USB engine and the mutex guarding it.
///
/// Created once at start-up, before anything else touches the engine,
/// and shared by reference for the rest of the program.
pub struct UsbScheduler<M: RawMutex, E: UsbEngine> {
    engine: Mutex<M, E>,
    status: LinkStatus,
}

impl<M: RawMutex, E: UsbEngine> UsbScheduler<M, E> {
    pub fn new(engine: E) -> Self {
        let status = LinkStatus::new();
        status.refresh(&engine);

        Self {
            engine: Mutex::new(engine),
            status,
        }
    }

    /// Take exclusive control of the USB engine, waiting as long as needed.
    ///
    /// Dropping the returned [`UsbLink`] releases it. While the link is
    /// held the background tick does nothing, so the holder must call
    /// [`UsbLink::service`] itself. Acquiring again while already holding
    /// the link never completes.
    pub async fn lock(&self) -> UsbLink<'_, M, E> {
        UsbLink::new(self.engine.lock().await, &self.status)
    }

    /// Take exclusive control of the USB engine if nobody holds it.
    pub fn try_lock(&self) -> Option<UsbLink<'_, M, E>> {
        self.engine
            .try_lock()
            .ok()
            .map(|engine| UsbLink::new(engine, &self.status))
    }

    /// Whether a host currently has the stream open
    pub fn connected(&self) -> bool {
        self.status.connected()
    }

    pub fn status(&self) -> &LinkStatus {
        &self.status
    }

    /// One firing of the periodic tick.
    ///
    /// Services the engine once if the link is free. Returns false when a
    /// foreground caller held the link and this period was skipped.
    pub fn tick(&self) -> bool {
        match self.try_lock() {
            Some(mut link) => {
                link.service();
                true
            }
            None => {
                trace!("usb tick skipped, link busy");
                false
            }
        }
    }

    /// Run the periodic tick forever.
    ///
    /// Each wait starts after the previous tick finished, so a slow tick
    /// delays the schedule instead of causing a burst of catch-up ticks.
    pub async fn run_periodic<D: DelayNs>(&self, mut delay: D) -> ! {
        loop {
            self.tick();
            delay.delay_us(TICK_INTERVAL_US).await;
        }
    }

    /// Direct access to the engine, possible only with no link outstanding
    pub fn engine_mut(&mut self) -> &mut E {
        self.engine.get_mut()
    }
}

/// Exclusive access to the USB engine.
///
/// Holding a `UsbLink` is holding the link mutex; dropping it releases.
pub struct UsbLink<'a, M: RawMutex, E: UsbEngine> {
    engine: MutexGuard<'a, M, E>,
    status: &'a LinkStatus,
}

impl<'a, M: RawMutex, E: UsbEngine> UsbLink<'a, M, E> {
    fn new(engine: MutexGuard<'a, M, E>, status: &'a LinkStatus) -> Self {
        status.refresh(&*engine);
        Self { engine, status }
    }

    /// Service pending USB work once
    pub fn service(&mut self) {
        self.engine.task();
        self.status.refresh(&*self.engine);
    }

    pub fn connected(&self) -> bool {
        self.engine.connected()
    }

    pub fn available(&self) -> usize {
        self.engine.available()
    }

    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let count = self.engine.read(buf);
        self.status.refresh(&*self.engine);
        count
    }

    pub fn write_available(&self) -> usize {
        self.engine.write_available()
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize, UsbError> {
        self.engine.write(data)
    }

    pub fn write_flush(&mut self) {
        self.engine.write_flush();
    }

    pub fn tx_capacity(&self) -> usize {
        self.engine.tx_capacity()
    }
}
