//! PN532 controller commands

use core::time::Duration;

use bytes::Bytes;
use desfire_apdu_core::{ByteBuffer, TransportError};
use tracing::{debug, trace, warn};

use crate::{
    config::Pn532Config,
    constants::{STATUS_ERROR_MASK, command, rf_item},
    error::Pn532Error,
    interface::Pn532Interface,
    packets::{
        BaudModulation, FirmwareVersion, InListPassiveTargetRequest, InListPassiveTargetResponse,
        SamConfiguration,
    },
    tag::TagLink,
};

/// A PN532 reached through a [`Pn532Interface`]
#[derive(Debug)]
pub struct Pn532<I> {
    interface: I,
    config: Pn532Config,
}

impl<I: Pn532Interface> Pn532<I> {
    /// Create a controller with the default configuration
    pub fn new(interface: I) -> Self {
        Self::with_config(interface, Pn532Config::default())
    }

    /// Create a controller with a custom configuration
    pub const fn with_config(interface: I, config: Pn532Config) -> Self {
        Self { interface, config }
    }

    /// Controller configuration
    pub const fn config(&self) -> &Pn532Config {
        &self.config
    }

    /// Borrow the link
    pub const fn interface(&self) -> &I {
        &self.interface
    }

    /// Give back the link
    pub fn into_inner(self) -> I {
        self.interface
    }

    /// Open the link and wake the controller up
    pub fn begin(&mut self) -> Result<(), Pn532Error> {
        self.interface.begin()?;
        self.interface.wakeup()?;
        Ok(())
    }

    /// Send a raw command packet, first byte being the command code
    pub fn write_command(&mut self, packet: &[u8]) -> Result<(), Pn532Error> {
        trace!(packet = %hex::encode(packet), "Controller write");
        self.interface.write_command(packet)?;
        Ok(())
    }

    /// Read the response to the last command with the configured deadline
    pub fn read_response(&mut self) -> Result<Bytes, Pn532Error> {
        self.read_response_timeout(Some(self.config.response_timeout))
    }

    /// Read the response to the last command with an explicit deadline
    pub fn read_response_timeout(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Bytes, Pn532Error> {
        Ok(self.receive_packet(timeout)?)
    }

    /// Select the SAM mode
    pub fn sam_config(&mut self, config: SamConfiguration) -> Result<(), Pn532Error> {
        let mut request = ByteBuffer::with_capacity(4);
        request.put_u8(command::SAM_CONFIGURATION);
        config.write_to(&mut request);

        self.exchange(request.as_slice())?;
        debug!(?config, "SAM configured");
        Ok(())
    }

    /// Query the IC and firmware revision
    pub fn get_firmware_version(&mut self) -> Result<FirmwareVersion, Pn532Error> {
        let mut response = self.exchange(&[command::GET_FIRMWARE_VERSION])?;
        let version = FirmwareVersion::parse(&mut response)?;
        debug!(%version, "Controller firmware");
        Ok(version)
    }

    /// Limit how often the controller retries passive activation
    ///
    /// `0xFF` retries forever, `0x00` tries once.
    pub fn set_passive_activation_retries(&mut self, retries: u8) -> Result<(), Pn532Error> {
        self.exchange(&[
            command::RF_CONFIGURATION,
            rf_item::MAX_RETRIES,
            0xFF, // MxRtyATR
            0x01, // MxRtyPSL
            retries,
        ])?;
        debug!(retries, "Passive activation retries set");
        Ok(())
    }

    /// Detect and activate up to `max_targets` cards
    pub fn in_list_passive_target(
        &mut self,
        max_targets: u8,
        brty: BaudModulation,
    ) -> Result<InListPassiveTargetResponse, Pn532Error> {
        let request = InListPassiveTargetRequest {
            max_targets,
            brty,
            initiator_data: Bytes::new(),
        };
        let mut packet = ByteBuffer::with_capacity(3);
        packet.put_u8(command::IN_LIST_PASSIVE_TARGET);
        request.write_to(&mut packet);

        let mut response = self.exchange(packet.as_slice())?;
        let targets = InListPassiveTargetResponse::parse(&mut response)?;
        if targets.target_count > max_targets {
            return Err(Pn532Error::UnexpectedResponse {
                command: command::IN_LIST_PASSIVE_TARGET,
                reason: "more targets than requested",
            });
        }

        debug!(count = targets.target_count, "Listed passive targets");
        Ok(targets)
    }

    /// Release an activated target
    pub fn in_release(&mut self, tg: u8) -> Result<(), Pn532Error> {
        let mut response = self.exchange(&[command::IN_RELEASE, tg])?;
        let status = response.read_u8()?;
        if status & STATUS_ERROR_MASK != 0 {
            warn!(tg, status, "InRelease failed");
            return Err(TransportError::Exchange(status).into());
        }
        Ok(())
    }

    /// APDU transport to target `tg`
    pub fn tag(&mut self, tg: u8) -> TagLink<'_, I> {
        TagLink::new(self, tg)
    }

    /// Write `packet` and read its response
    pub(crate) fn transmit_packet(&mut self, packet: &[u8]) -> Result<Bytes, TransportError> {
        self.interface.write_command(packet)?;
        self.receive_packet(Some(self.config.response_timeout))
    }

    fn receive_packet(&mut self, timeout: Option<Duration>) -> Result<Bytes, TransportError> {
        let mut buf = vec![0u8; self.config.max_packet_size];
        let len = self.interface.read_response(&mut buf, timeout)?;
        buf.truncate(len);
        trace!(packet = %hex::encode(&buf), "Controller read");
        Ok(Bytes::from(buf))
    }

    fn exchange(&mut self, packet: &[u8]) -> Result<ByteBuffer, Pn532Error> {
        let response = self.transmit_packet(packet)?;
        Ok(ByteBuffer::from(response))
    }
}
