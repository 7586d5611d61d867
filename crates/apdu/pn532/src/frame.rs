//! PN532 normal information frame
//!
//! ```text
//! 00 00 FF | LEN | LCS | TFI | PD0 .. PDn | DCS | 00
//! ```
//!
//! `LEN` counts the TFI plus the payload. `LEN + LCS` and
//! `TFI + PD0 + .. + PDn + DCS` are both zero modulo 256.

use bytes::Bytes;
use desfire_apdu_core::{ByteBuffer, TransportError};

use crate::constants::{POSTAMBLE, PREAMBLE, tfi};

/// Largest payload a normal frame can carry next to its TFI
pub const MAX_FRAME_PAYLOAD: usize = u8::MAX as usize - 1;

/// Bytes a frame adds around its payload
pub const FRAME_OVERHEAD: usize = PREAMBLE.len() + 2 + 1 + 2;

/// Length checksum: the byte that makes `len + lcs` wrap to zero
pub const fn length_checksum(len: u8) -> u8 {
    len.wrapping_neg()
}

/// Data checksum over the TFI and payload
pub fn data_checksum(tfi: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(tfi, |sum, &b| sum.wrapping_add(b))
        .wrapping_neg()
}

/// A decoded information frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Direction byte
    pub tfi: u8,
    /// Command or response code followed by its parameters
    pub payload: Bytes,
}

impl Frame {
    /// Frame travelling from the host to the controller
    pub fn to_controller(payload: impl Into<Bytes>) -> Self {
        Self {
            tfi: tfi::TO_CONTROLLER,
            payload: payload.into(),
        }
    }

    /// Frame travelling from the controller to the host
    pub fn to_host(payload: impl Into<Bytes>) -> Self {
        Self {
            tfi: tfi::TO_HOST,
            payload: payload.into(),
        }
    }

    /// Encode into wire bytes
    pub fn encode(&self) -> Result<Bytes, TransportError> {
        if self.payload.len() > MAX_FRAME_PAYLOAD {
            return Err(TransportError::NoSpace);
        }

        let len = self.payload.len() as u8 + 1;
        let mut buf = ByteBuffer::with_capacity(self.payload.len() + FRAME_OVERHEAD);
        buf.put_slice(&PREAMBLE)
            .put_u8(len)
            .put_u8(length_checksum(len))
            .put_u8(self.tfi)
            .put_slice(&self.payload)
            .put_u8(data_checksum(self.tfi, &self.payload))
            .put_u8(POSTAMBLE);

        Ok(buf.into_bytes())
    }

    /// Decode one complete frame
    ///
    /// Trailing bytes after the postamble are rejected.
    pub fn decode(data: &[u8]) -> Result<Self, TransportError> {
        let mut buf = ByteBuffer::from(data);
        let invalid = |_| TransportError::InvalidFrame;

        let preamble = buf.read_bytes(PREAMBLE.len()).map_err(invalid)?;
        if preamble[..] != PREAMBLE {
            return Err(TransportError::InvalidFrame);
        }

        let len = buf.read_u8().map_err(invalid)?;
        let lcs = buf.read_u8().map_err(invalid)?;
        if len.wrapping_add(lcs) != 0 || len == 0 {
            return Err(TransportError::InvalidFrame);
        }

        let tfi = buf.read_u8().map_err(invalid)?;
        let payload = buf.read_bytes(usize::from(len) - 1).map_err(invalid)?;
        let dcs = buf.read_u8().map_err(invalid)?;
        if dcs != data_checksum(tfi, &payload) {
            return Err(TransportError::InvalidFrame);
        }

        if buf.read_u8().map_err(invalid)? != POSTAMBLE || buf.remaining() != 0 {
            return Err(TransportError::InvalidFrame);
        }

        Ok(Self { tfi, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn sum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
    }

    #[test]
    fn test_get_firmware_version_frame() {
        let frame = Frame::to_controller(Bytes::from_static(&[0x02])).encode().unwrap();
        assert_eq!(frame.as_ref(), &hex!("00 00 FF 02 FE D4 02 2A 00"));
    }

    #[test]
    fn test_checksum_invariants() {
        for len in [0usize, 1, 2, 17, 100, MAX_FRAME_PAYLOAD] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let frame = Frame::to_controller(payload.clone()).encode().unwrap();

            let (len_byte, lcs) = (frame[3], frame[4]);
            assert_eq!(len_byte.wrapping_add(lcs), 0);
            assert_eq!(usize::from(len_byte), payload.len() + 1);

            // TFI through DCS
            let body = &frame[5..frame.len() - 1];
            assert_eq!(sum(body), 0);
            assert_eq!(frame[frame.len() - 1], POSTAMBLE);

            assert_eq!(Frame::decode(&frame).unwrap().payload.as_ref(), &payload[..]);
        }
    }

    #[test]
    fn test_oversized_payload() {
        let frame = Frame::to_controller(vec![0u8; MAX_FRAME_PAYLOAD + 1]);
        assert_eq!(frame.encode(), Err(TransportError::NoSpace));
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let good = Frame::to_host(Bytes::from_static(&hex!("03 32 01 06 07")))
            .encode()
            .unwrap();
        assert_eq!(Frame::decode(&good).unwrap().tfi, tfi::TO_HOST);

        // preamble, LCS, a payload byte, DCS, postamble
        for idx in [2, 4, 7, good.len() - 2, good.len() - 1] {
            let mut bad = good.to_vec();
            bad[idx] ^= 0x01;
            assert_eq!(Frame::decode(&bad), Err(TransportError::InvalidFrame), "byte {idx}");
        }

        assert_eq!(
            Frame::decode(&good[..good.len() - 1]),
            Err(TransportError::InvalidFrame)
        );
    }
}
