//! Byte-level serial port capability

use core::fmt;

use desfire_apdu_core::TransportError;

/// Non-blocking byte stream to the controller
///
/// Implementations wrap a UART. [`read_byte`](Self::read_byte) must return
/// immediately with `Ok(None)` when nothing is buffered; the link layer owns
/// all timing.
pub trait SerialPort: fmt::Debug {
    /// Open and configure the port
    fn begin(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Write every byte of `data`
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Pop one buffered byte, if any
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError>;

    /// Discard everything currently buffered, returning how many bytes were dropped
    fn clear_input(&mut self) -> Result<usize, TransportError> {
        let mut dropped = 0;
        while self.read_byte()?.is_some() {
            dropped += 1;
        }
        Ok(dropped)
    }
}

impl<S: SerialPort + ?Sized> SerialPort for &mut S {
    fn begin(&mut self) -> Result<(), TransportError> {
        (**self).begin()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(data)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        (**self).read_byte()
    }

    fn clear_input(&mut self) -> Result<usize, TransportError> {
        (**self).clear_input()
    }
}
