//! APDU transport tunnelled through InDataExchange

use bytes::Bytes;
use desfire_apdu_core::{ByteBuffer, CardTransport, TransportError};
use tracing::warn;

use crate::{
    constants::{STATUS_ERROR_MASK, command},
    controller::Pn532,
    interface::Pn532Interface,
};

/// [`CardTransport`] to one activated target
///
/// Each APDU goes out as `40 Tg APDU`; the controller status byte that leads
/// the answer is checked and stripped.
#[derive(Debug)]
pub struct TagLink<'a, I> {
    controller: &'a mut Pn532<I>,
    tg: u8,
}

impl<'a, I: Pn532Interface> TagLink<'a, I> {
    /// Bind a transport to target `tg`
    pub const fn new(controller: &'a mut Pn532<I>, tg: u8) -> Self {
        Self { controller, tg }
    }

    /// Logical target number
    pub const fn tg(&self) -> u8 {
        self.tg
    }
}

impl<I: Pn532Interface> CardTransport for TagLink<'_, I> {
    type Error = TransportError;

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        let mut packet = ByteBuffer::with_capacity(command.len() + 2);
        packet
            .put_u8(command::IN_DATA_EXCHANGE)
            .put_u8(self.tg)
            .put_slice(command);

        let response = self.controller.transmit_packet(packet.as_slice())?;
        let Some(&status) = response.first() else {
            warn!(tg = self.tg, "InDataExchange answer without status");
            return Err(TransportError::InvalidFrame);
        };

        if status & STATUS_ERROR_MASK != 0 {
            warn!(tg = self.tg, status, "InDataExchange failed");
            return Err(TransportError::Exchange(status));
        }

        Ok(response.slice(1..))
    }
}
