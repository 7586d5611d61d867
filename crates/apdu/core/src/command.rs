//! APDU command definitions
//!
//! This module provides the ISO/IEC 7816-4 command APDU in its short form:
//! `CLA INS P1 P2 [Lc data] [Le]`.

use bytes::Bytes;

use crate::{ByteBuffer, Error, Result};

/// Largest data field a short APDU can carry
pub const MAX_SHORT_DATA_LEN: usize = 255;

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<u8>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self::new(cla, ins, p1, p2).with_data(data)
    }

    /// Create a new command with both data and expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: u8,
    ) -> Self {
        Self::new_with_data(cla, ins, p1, p2, data).with_le(le)
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Length of the serialized command
    pub fn command_length(&self) -> usize {
        4 + self.data.as_ref().map_or(0, |data| 1 + data.len()) + usize::from(self.le.is_some())
    }

    /// Serialize into `buf`
    ///
    /// Lc is emitted whenever a data field is set, even an empty one.
    pub fn write_to(&self, buf: &mut ByteBuffer) -> Result<()> {
        if let Some(data) = &self.data
            && data.len() > MAX_SHORT_DATA_LEN
        {
            return Err(Error::InvalidCommandLength(data.len()));
        }

        buf.put_u8(self.cla)
            .put_u8(self.ins)
            .put_u8(self.p1)
            .put_u8(self.p2);

        if let Some(data) = &self.data {
            buf.put_u8(data.len() as u8).put_slice(data);
        }

        if let Some(le) = self.le {
            buf.put_u8(le);
        }

        Ok(())
    }

    /// Convert to raw APDU bytes
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = ByteBuffer::with_capacity(self.command_length());
        self.write_to(&mut buf)?;
        Ok(buf.into_bytes())
    }

    /// Parse a command from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::InvalidCommandLength(data.len()));
        }

        let mut command = Self::new(data[0], data[1], data[2], data[3]);

        // Parse Lc, data, and Le if present
        if data.len() == 5 {
            // Only Le present, no data
            command.le = Some(data[4]);
        } else if data.len() > 5 {
            let lc = data[4] as usize;
            let end = 5 + lc;

            if data.len() < end {
                return Err(Error::InvalidCommandLength(data.len()));
            }
            command.data = Some(Bytes::copy_from_slice(&data[5..end]));

            match data.len() - end {
                0 => {}
                1 => command.le = Some(data[end]),
                _ => return Err(Error::InvalidCommandLength(data.len())),
            }
        }

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_command_serialization() {
        let data = Bytes::from_static(&hex!("D2 76 00 00 85 01 00"));
        let cmd = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, data, 0);

        assert_eq!(
            cmd.to_bytes().unwrap().as_ref(),
            &hex!("00 A4 04 00 07 D2 76 00 00 85 01 00 00")
        );
    }

    #[test]
    fn test_empty_data_keeps_lc() {
        let cmd = Command::new_with_data_and_le(0x90, 0x60, 0x00, 0x00, Bytes::new(), 0);
        assert_eq!(cmd.command_length(), 6);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), &hex!("90 60 00 00 00 00"));
    }

    #[test]
    fn test_command_length() {
        let cmd1 = Command::new(0x00, 0xB0, 0x00, 0x00);
        assert_eq!(cmd1.command_length(), 4);

        let cmd2 = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0xFF);
        assert_eq!(cmd2.command_length(), 5);

        let data = Bytes::from_static(&[0x01, 0x02, 0x03]);
        let cmd3 = Command::new_with_data(0x00, 0xD6, 0x00, 0x00, data.clone());
        assert_eq!(cmd3.command_length(), 8);

        let cmd4 = Command::new_with_data_and_le(0x00, 0xD6, 0x00, 0x00, data, 0xFF);
        assert_eq!(cmd4.command_length(), 9);
        assert_eq!(cmd4.to_bytes().unwrap().len(), 9);
    }

    #[test]
    fn test_oversized_data_rejected() {
        let cmd = Command::new_with_data(0x90, 0xC4, 0x00, 0x00, vec![0u8; 256]);
        assert!(matches!(
            cmd.to_bytes(),
            Err(Error::InvalidCommandLength(256))
        ));
    }

    #[test]
    fn test_command_from_bytes() {
        let cmd = Command::from_bytes(&hex!("00 A4 04 00")).unwrap();
        assert_eq!((cmd.cla, cmd.ins, cmd.p1, cmd.p2), (0x00, 0xA4, 0x04, 0x00));
        assert!(cmd.data.is_none());
        assert!(cmd.le.is_none());

        let cmd = Command::from_bytes(&hex!("00 A4 04 00 03 01 02 03")).unwrap();
        assert_eq!(cmd.data.as_deref(), Some(&hex!("01 02 03")[..]));
        assert!(cmd.le.is_none());

        let cmd = Command::from_bytes(&hex!("90 AA 00 00 01 00 00")).unwrap();
        assert_eq!(cmd.data.as_deref(), Some(&[0x00][..]));
        assert_eq!(cmd.le, Some(0));

        let cmd = Command::from_bytes(&hex!("00 B0 00 00 FF")).unwrap();
        assert!(cmd.data.is_none());
        assert_eq!(cmd.le, Some(0xFF));

        assert!(Command::from_bytes(&hex!("00 A4 04")).is_err());
        assert!(Command::from_bytes(&hex!("00 A4 04 00 05 01 02")).is_err());
        assert!(Command::from_bytes(&hex!("00 A4 04 00 01 01 00 00")).is_err());
    }
}
