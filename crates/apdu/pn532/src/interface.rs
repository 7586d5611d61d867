//! Link-layer capability consumed by the controller

use core::{fmt, time::Duration};

use desfire_apdu_core::TransportError;

/// Command/response link to a PN532
///
/// One exchange is always [`write_command`](Self::write_command) followed by
/// [`read_response`](Self::read_response). The link remembers the command code
/// so it can check the echoed response code.
pub trait Pn532Interface: fmt::Debug {
    /// Initialise the physical link
    fn begin(&mut self) -> Result<(), TransportError>;

    /// Bring the controller out of power-down
    fn wakeup(&mut self) -> Result<(), TransportError>;

    /// Send one command packet and wait for its acknowledgement
    fn write_command(&mut self, packet: &[u8]) -> Result<(), TransportError>;

    /// Receive the response to the last command into `buf`
    ///
    /// Returns the number of payload bytes written, excluding the TFI and the
    /// echoed response code. `None` waits without a deadline.
    fn read_response(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError>;
}

impl<I: Pn532Interface + ?Sized> Pn532Interface for &mut I {
    fn begin(&mut self) -> Result<(), TransportError> {
        (**self).begin()
    }

    fn wakeup(&mut self) -> Result<(), TransportError> {
        (**self).wakeup()
    }

    fn write_command(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        (**self).write_command(packet)
    }

    fn read_response(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        (**self).read_response(buf, timeout)
    }
}
