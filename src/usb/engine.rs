//! USB engine trait for abstraction and testability
//!
//! This trait is the only view the stdio core has of the device stack.
//! The real implementation polls the OTG peripheral; the mock scripts
//! connection state, endpoint capacity and received data for tests.

/// Errors reported by the USB engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbError {
    /// Endpoint cannot accept or provide data right now
    WouldBlock,
    /// Data did not fit into the endpoint buffer
    BufferOverflow,
    /// Device is not configured by a host
    Disconnected,
    /// Any other failure of the underlying stack
    Other,
}

/// Interface to the device stack and its CDC data interface
///
/// Mutating calls must only be made by whoever holds the link mutex,
/// see [`crate::usb::scheduler::UsbScheduler`].
pub trait UsbEngine {
    /// Service pending USB work once
    fn task(&mut self);

    /// Whether a host has the CDC data interface open
    fn connected(&self) -> bool;

    /// Bytes waiting to be read
    fn available(&self) -> usize;

    /// Copy received bytes into `buf`, returning how many were copied
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Bytes that can be written without blocking
    fn write_available(&self) -> usize;

    /// Queue bytes for transmission, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, UsbError>;

    /// Hand queued bytes to the host as soon as possible
    fn write_flush(&mut self);

    /// Size of the transmit buffer when nothing is in flight
    fn tx_capacity(&self) -> usize;
}

#[cfg(test)]
pub mod mock {
    //! Mock USB engine for testing

    use super::*;
    use heapless::Vec;

    /// Capacity of the mock buffers
    pub const MOCK_BUFFER_SIZE: usize = 512;

    /// Something the engine was asked to do
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EngineEvent {
        Service,
        Write(usize),
        Flush,
        Read(usize),
    }

    /// Mock USB engine for unit testing
    ///
    /// Written bytes sit in a transmit FIFO until a service or flush
    /// moves them to the host side, where `sent()` can inspect them.
    pub struct MockUsbEngine {
        connected: bool,
        /// Disconnect once this many services have happened
        disconnect_after: Option<usize>,
        /// When set, each service grants exactly this much write capacity
        grant_per_service: Option<usize>,
        /// Remaining capacity granted since the last service
        granted: usize,
        /// Bytes drained from the FIFO to the host per service
        drain_per_service: usize,
        /// No write capacity until more than this many services have happened
        stall_until: usize,
        tx_capacity: usize,
        tx_fifo: Vec<u8, MOCK_BUFFER_SIZE>,
        sent: Vec<u8, MOCK_BUFFER_SIZE>,
        rx: Vec<u8, MOCK_BUFFER_SIZE>,
        /// Data that arrives during the next service
        rx_incoming: Vec<u8, MOCK_BUFFER_SIZE>,
        next_write_error: Option<UsbError>,
        events: Vec<EngineEvent, MOCK_BUFFER_SIZE>,
        services: usize,
        /// Set for the duration of a service
        in_service: bool,
    }

    impl MockUsbEngine {
        /// Create a connected engine with an empty 64 byte transmit FIFO
        pub fn new() -> Self {
            Self {
                connected: true,
                disconnect_after: None,
                grant_per_service: None,
                granted: 0,
                drain_per_service: usize::MAX,
                stall_until: 0,
                tx_capacity: 64,
                tx_fifo: Vec::new(),
                sent: Vec::new(),
                rx: Vec::new(),
                rx_incoming: Vec::new(),
                next_write_error: None,
                events: Vec::new(),
                services: 0,
                in_service: false,
            }
        }

        /// Create an engine with no host attached
        pub fn disconnected() -> Self {
            let mut engine = Self::new();
            engine.connected = false;
            engine
        }

        pub fn set_connected(&mut self, connected: bool) {
            self.connected = connected;
        }

        /// Drop the host connection once `services` services have happened
        pub fn disconnect_after(&mut self, services: usize) {
            self.disconnect_after = Some(services);
        }

        /// Grant exactly `bytes` of write capacity per service
        pub fn grant_per_service(&mut self, bytes: usize) {
            self.grant_per_service = Some(bytes);
            self.granted = 0;
        }

        /// Limit how many bytes each service moves from the FIFO to the host
        pub fn drain_per_service(&mut self, bytes: usize) {
            self.drain_per_service = bytes;
        }

        /// Report no write capacity for the first `services` services
        pub fn stall_for(&mut self, services: usize) {
            self.stall_until = services;
        }

        /// Put bytes into the transmit FIFO as if an earlier write were in flight
        pub fn preload_tx(&mut self, data: &[u8]) {
            let _ = self.tx_fifo.extend_from_slice(data);
        }

        /// Queue data that can be read immediately
        pub fn queue_rx_data(&mut self, data: &[u8]) {
            let _ = self.rx.extend_from_slice(data);
        }

        /// Queue data that becomes readable during the next service
        pub fn queue_rx_on_service(&mut self, data: &[u8]) {
            let _ = self.rx_incoming.extend_from_slice(data);
        }

        /// Set an error to be returned by the next write() call
        pub fn set_next_write_error(&mut self, error: UsbError) {
            self.next_write_error = Some(error);
        }

        /// Bytes that reached the host
        pub fn sent(&self) -> &[u8] {
            &self.sent
        }

        /// Bytes written but not yet handed to the host
        pub fn in_flight(&self) -> usize {
            self.tx_fifo.len()
        }

        pub fn events(&self) -> &[EngineEvent] {
            &self.events
        }

        pub fn clear_events(&mut self) {
            self.events.clear();
        }

        pub fn services(&self) -> usize {
            self.services
        }

        fn drain(&mut self, limit: usize) {
            let count = core::cmp::min(limit, self.tx_fifo.len());
            let _ = self.sent.extend_from_slice(&self.tx_fifo[..count]);
            let remaining: Vec<u8, MOCK_BUFFER_SIZE> =
                self.tx_fifo[count..].iter().copied().collect();
            self.tx_fifo = remaining;
        }

        fn service_once(&mut self) {
            self.services += 1;
            let _ = self.events.push(EngineEvent::Service);

            if self.disconnect_after == Some(self.services) {
                self.connected = false;
            }
            if !self.connected {
                return;
            }

            self.drain(self.drain_per_service);

            let incoming = core::mem::take(&mut self.rx_incoming);
            let _ = self.rx.extend_from_slice(&incoming);

            if let Some(grant) = self.grant_per_service {
                self.granted = grant;
            }
        }
    }

    impl Default for MockUsbEngine {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UsbEngine for MockUsbEngine {
        fn task(&mut self) {
            assert!(!self.in_service, "engine serviced re-entrantly");
            self.in_service = true;
            self.service_once();
            self.in_service = false;
        }

        fn connected(&self) -> bool {
            self.connected
        }

        fn available(&self) -> usize {
            self.rx.len()
        }

        fn read(&mut self, buf: &mut [u8]) -> usize {
            let count = core::cmp::min(buf.len(), self.rx.len());
            buf[..count].copy_from_slice(&self.rx[..count]);

            let remaining: Vec<u8, MOCK_BUFFER_SIZE> = self.rx[count..].iter().copied().collect();
            self.rx = remaining;

            let _ = self.events.push(EngineEvent::Read(count));
            count
        }

        fn write_available(&self) -> usize {
            if self.services <= self.stall_until && self.stall_until > 0 {
                return 0;
            }

            let free = self.tx_capacity - self.tx_fifo.len();
            match self.grant_per_service {
                Some(_) => core::cmp::min(free, self.granted),
                None => free,
            }
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, UsbError> {
            if let Some(error) = self.next_write_error.take() {
                return Err(error);
            }

            let count = core::cmp::min(data.len(), self.write_available());
            self.tx_fifo
                .extend_from_slice(&data[..count])
                .map_err(|_| UsbError::BufferOverflow)?;
            self.granted = self.granted.saturating_sub(count);

            let _ = self.events.push(EngineEvent::Write(count));
            Ok(count)
        }

        fn write_flush(&mut self) {
            let _ = self.events.push(EngineEvent::Flush);
            if self.connected {
                self.drain(self.drain_per_service);
            }
        }

        fn tx_capacity(&self) -> usize {
            self.tx_capacity
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_write_reaches_host_on_flush() {
            let mut engine = MockUsbEngine::new();

            assert_eq!(engine.write(b"hi"), Ok(2));
            assert_eq!(engine.in_flight(), 2);

            engine.write_flush();
            assert_eq!(engine.sent(), b"hi");
            assert_eq!(engine.write_available(), engine.tx_capacity());
        }

        #[test]
        fn test_mock_grant_limits_capacity() {
            let mut engine = MockUsbEngine::new();
            engine.grant_per_service(1);

            assert_eq!(engine.write_available(), 0);
            engine.task();
            assert_eq!(engine.write_available(), 1);
            assert_eq!(engine.write(b"AB"), Ok(1));
            assert_eq!(engine.write_available(), 0);
        }

        #[test]
        fn test_mock_disconnect_after_services() {
            let mut engine = MockUsbEngine::new();
            engine.disconnect_after(2);

            engine.task();
            assert!(engine.connected());
            engine.task();
            assert!(!engine.connected());
        }

        #[test]
        fn test_mock_rx_arrives_on_service() {
            let mut engine = MockUsbEngine::new();
            engine.queue_rx_on_service(&[0x01, 0x02]);
            assert_eq!(engine.available(), 0);

            engine.task();
            assert_eq!(engine.available(), 2);

            let mut buf = [0u8; 4];
            assert_eq!(engine.read(&mut buf), 2);
            assert_eq!(&buf[..2], &[0x01, 0x02]);
        }

        #[test]
        fn test_mock_service_guard_clears_on_every_path() {
            let mut engine = MockUsbEngine::disconnected();
            engine.task();
            engine.task();

            engine.set_connected(true);
            engine.task();
            engine.task();
            assert_eq!(engine.services(), 4);
        }

        #[test]
        fn test_mock_write_error_is_cleared() {
            let mut engine = MockUsbEngine::new();
            engine.set_next_write_error(UsbError::Other);

            assert_eq!(engine.write(b"x"), Err(UsbError::Other));
            assert_eq!(engine.write(b"x"), Ok(1));
        }
    }
}
