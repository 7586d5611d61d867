//! In-memory serial port for tests and simulations

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use desfire_apdu_core::TransportError;

use crate::{constants::ACK, frame::Frame, serial::SerialPort};

/// Callback producing the bytes a device sends back for one write
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Default)]
struct MockState {
    inbound: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    opened: bool,
    responder: Option<Responder>,
}

/// Serial port backed by shared in-memory queues
///
/// Clones share state, so a test can keep a handle for inspection after
/// moving the port into a link.
#[derive(Clone, Default)]
pub struct MockSerialPort {
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockSerialPort")
            .field("inbound", &state.inbound.len())
            .field("writes", &state.writes.len())
            .field("opened", &state.opened)
            .field("has_responder", &state.responder.is_some())
            .finish()
    }
}

impl MockSerialPort {
    /// Create an empty port
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a port whose device answers every write through `responder`
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let port = Self::new();
        port.set_responder(responder);
        port
    }

    /// Install or replace the device callback
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Append bytes the host will read next
    pub fn queue(&self, bytes: &[u8]) {
        self.lock().inbound.extend(bytes.iter().copied());
    }

    /// Number of bytes waiting to be read
    pub fn pending(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Every write the host made, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// Forget recorded writes
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Whether [`SerialPort::begin`] has been called
    pub fn is_open(&self) -> bool {
        self.lock().opened
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SerialPort for MockSerialPort {
    fn begin(&mut self) -> Result<(), TransportError> {
        self.lock().opened = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.writes.push(data.to_vec());

        if let Some(responder) = state.responder.as_mut() {
            let reply = responder(data);
            state.inbound.extend(reply);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        Ok(self.lock().inbound.pop_front())
    }
}

/// Bytes a controller sends for a successful exchange: the ACK frame then a
/// response frame carrying `payload`
///
/// `payload` starts with the response code (command code + 1).
pub fn ack_and_response(payload: &[u8]) -> Result<Vec<u8>, TransportError> {
    let frame = Frame::to_host(payload.to_vec()).encode()?;
    let mut out = ACK.to_vec();
    out.extend_from_slice(&frame);
    Ok(out)
}
