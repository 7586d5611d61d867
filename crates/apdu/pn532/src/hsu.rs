//! PN532 high-speed UART link
//!
//! Every exchange walks the same states:
//!
//! ```text
//! Idle -> Sending -> AwaitingAck -> AwaitingFrame -> Idle
//! ```
//!
//! and falls back to `Idle` on any failed check. Reads are polled: the port
//! is asked for one byte at a time and the link sleeps for the configured poll
//! interval whenever nothing is buffered.

use std::{
    fmt, thread,
    time::{Duration, Instant},
};

use bytes::Bytes;
use desfire_apdu_core::TransportError;
use tracing::{debug, trace, warn};

use crate::{
    config::Pn532Config,
    constants::{ACK, POSTAMBLE, PREAMBLE, WAKEUP, tfi},
    frame::Frame,
    interface::Pn532Interface,
    serial::SerialPort,
};

/// Where the link is within a command/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No exchange in flight
    #[default]
    Idle,
    /// Command frame is being written
    Sending,
    /// Waiting for the ACK frame
    AwaitingAck,
    /// ACK received, waiting for the response frame
    AwaitingFrame,
}

/// PN532 link over a byte-level serial port
pub struct HsuInterface<S> {
    serial: S,
    config: Pn532Config,
    command: u8,
    state: LinkState,
}

impl<S: fmt::Debug> fmt::Debug for HsuInterface<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HsuInterface")
            .field("serial", &self.serial)
            .field("command", &format_args!("{:#04x}", self.command))
            .field("state", &self.state)
            .finish()
    }
}

impl<S: SerialPort> HsuInterface<S> {
    /// Create a link with the default configuration
    pub fn new(serial: S) -> Self {
        Self::with_config(serial, Pn532Config::default())
    }

    /// Create a link with a custom configuration
    pub const fn with_config(serial: S, config: Pn532Config) -> Self {
        Self {
            serial,
            config,
            command: 0,
            state: LinkState::Idle,
        }
    }

    /// Current exchange state
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Command code of the last frame sent
    pub const fn last_command(&self) -> u8 {
        self.command
    }

    /// Link configuration
    pub const fn config(&self) -> &Pn532Config {
        &self.config
    }

    /// Borrow the serial port
    pub const fn serial(&self) -> &S {
        &self.serial
    }

    /// Give back the serial port
    pub fn into_inner(self) -> S {
        self.serial
    }

    /// Collect up to `buf.len()` bytes before `timeout`
    ///
    /// Once the deadline passes, returns how many bytes were collected if at
    /// least one arrived, and [`TransportError::Timeout`] if none did. A short
    /// count is not an error here; callers validate what they got.
    pub fn receive(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        let start = Instant::now();
        let mut count = 0;

        while count < buf.len() {
            match self.serial.read_byte()? {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => thread::sleep(self.config.poll_interval),
            }

            if let Some(timeout) = timeout
                && start.elapsed() > timeout
            {
                if count == 0 {
                    return Err(TransportError::Timeout);
                }
                trace!(count, wanted = buf.len(), "Receive deadline passed");
                return Ok(count);
            }
        }

        Ok(count)
    }

    /// Fill `buf` completely or fail with a timeout
    fn receive_exact(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let count = self.receive(buf, timeout)?;
        if count < buf.len() {
            debug!(count, wanted = buf.len(), "Short read");
            return Err(TransportError::Timeout);
        }
        Ok(())
    }

    /// Wait for the fixed ACK frame
    pub fn read_ack(&mut self) -> Result<(), TransportError> {
        let mut ack = [0u8; ACK.len()];
        let count = self.receive(&mut ack, Some(self.config.ack_timeout))?;

        if count < ack.len() || ack != ACK {
            warn!(ack = %hex::encode(&ack[..count]), "Invalid ACK");
            return Err(TransportError::InvalidAck);
        }
        Ok(())
    }

    fn send_frame(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        let dropped = self.serial.clear_input()?;
        if dropped > 0 {
            debug!(dropped, "Discarded stray inbound bytes");
        }

        let frame: Bytes = Frame::to_controller(Bytes::copy_from_slice(packet)).encode()?;
        trace!(frame = %hex::encode(&frame), "Writing command frame");
        self.serial.write(&frame)
    }

    fn read_frame(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        let mut preamble = [0u8; PREAMBLE.len()];
        self.receive_exact(&mut preamble, timeout)?;
        if preamble != PREAMBLE {
            warn!(preamble = %hex::encode(preamble), "Invalid preamble");
            return Err(TransportError::InvalidFrame);
        }

        let mut length = [0u8; 2];
        self.receive_exact(&mut length, timeout)?;
        let [len, lcs] = length;
        if len.wrapping_add(lcs) != 0 || len < 2 {
            warn!(len, lcs, "Invalid length checksum");
            return Err(TransportError::InvalidFrame);
        }

        // LEN covers TFI and the response code
        let data_len = usize::from(len - 2);
        if data_len > buf.len() {
            warn!(data_len, capacity = buf.len(), "Response does not fit buffer");
            return Err(TransportError::NoSpace);
        }

        let expected = self.command.wrapping_add(1);
        let mut header = [0u8; 2];
        self.receive_exact(&mut header, timeout)?;
        if header != [tfi::TO_HOST, expected] {
            warn!(
                tfi = header[0],
                code = header[1],
                expected,
                "Unexpected frame direction or response code"
            );
            return Err(TransportError::InvalidFrame);
        }

        let data = &mut buf[..data_len];
        self.receive_exact(data, timeout)?;

        let checksum = data
            .iter()
            .fold(tfi::TO_HOST.wrapping_add(expected), |sum, &b| sum.wrapping_add(b));

        let mut trailer = [0u8; 2];
        self.receive_exact(&mut trailer, timeout)?;
        let [dcs, postamble] = trailer;
        if checksum.wrapping_add(dcs) != 0 || postamble != POSTAMBLE {
            warn!(dcs, postamble, "Invalid data checksum or postamble");
            return Err(TransportError::InvalidFrame);
        }

        trace!(payload = %hex::encode(&buf[..data_len]), "Read response frame");
        Ok(data_len)
    }
}

impl<S: SerialPort> Pn532Interface for HsuInterface<S> {
    fn begin(&mut self) -> Result<(), TransportError> {
        self.state = LinkState::Idle;
        self.serial.begin()
    }

    fn wakeup(&mut self) -> Result<(), TransportError> {
        self.serial.write(&WAKEUP)?;
        let dropped = self.serial.clear_input()?;
        debug!(dropped, "Sent wakeup sequence");
        Ok(())
    }

    fn write_command(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        let Some(&command) = packet.first() else {
            return Err(TransportError::InvalidFrame);
        };

        self.state = LinkState::Sending;
        self.command = command;
        if let Err(e) = self.send_frame(packet) {
            self.state = LinkState::Idle;
            return Err(e);
        }

        self.state = LinkState::AwaitingAck;
        match self.read_ack() {
            Ok(()) => {
                self.state = LinkState::AwaitingFrame;
                Ok(())
            }
            Err(e) => {
                self.state = LinkState::Idle;
                Err(e)
            }
        }
    }

    fn read_response(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        if self.state != LinkState::AwaitingFrame {
            debug!(state = ?self.state, "Reading response outside an exchange");
        }

        let result = self.read_frame(buf, timeout);
        self.state = LinkState::Idle;
        result
    }
}
