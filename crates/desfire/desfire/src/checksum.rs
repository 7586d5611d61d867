//! Checksums used inside DESFire cryptograms
//!
//! The two algorithms guard different ChangeKey branches: the CRC16 covers
//! DES and 2K3DES keys, the CRC32 covers 3K3DES and AES keys.

/// Reflected polynomial of the DESFire CRC32
const CRC32_POLY: u32 = 0xEDB8_8320;

/// ISO/IEC 14443-3 Type B CRC, emitted low byte first
pub fn crc16_iso14443b(data: &[u8]) -> [u8; 2] {
    let mut reg: u16 = 0xFFFF;
    for &byte in data {
        let mut b = byte ^ reg as u8;
        b ^= b << 4;
        let b = u16::from(b);
        reg = (reg >> 8) ^ (b << 8) ^ (b << 3) ^ (b >> 4);
    }
    (!reg).to_le_bytes()
}

/// Feed one byte into a DESFire CRC32 register
///
/// No final complement is applied.
pub fn crc32_desfire_byte(crc: &mut u32, byte: u8) {
    *crc ^= u32::from(byte);
    for _ in 0..8 {
        let lsb = *crc & 1;
        *crc >>= 1;
        if lsb != 0 {
            *crc ^= CRC32_POLY;
        }
    }
}

/// Running DESFire CRC32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesfireCrc32(u32);

impl DesfireCrc32 {
    /// Start from `seed`
    pub const fn new(seed: u32) -> Self {
        Self(seed)
    }

    /// Feed a single byte
    pub fn update_byte(&mut self, byte: u8) -> &mut Self {
        crc32_desfire_byte(&mut self.0, byte);
        self
    }

    /// Feed every byte of `data`
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        for &byte in data {
            crc32_desfire_byte(&mut self.0, byte);
        }
        self
    }

    /// Raw register value
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Register bytes as appended to a cryptogram
    pub const fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16_iso14443b(b"123456789"), [0x6E, 0x90]);
        assert_eq!(crc16_iso14443b(&[0x00, 0x00]), [0x47, 0x0F]);
    }

    #[test]
    fn test_crc32_check_value() {
        let mut crc = DesfireCrc32::new(0xFFFF_FFFF);
        crc.update(b"123456789");
        assert_eq!(crc.value(), 0x340B_C6D9);
        assert_eq!(crc.to_le_bytes(), [0xD9, 0xC6, 0x0B, 0x34]);
    }

    #[test]
    fn test_crc32_bytewise_matches_bulk() {
        let mut bytewise = 0xFFFF_FFFF;
        for &b in b"DESFire" {
            crc32_desfire_byte(&mut bytewise, b);
        }

        let mut bulk = DesfireCrc32::new(0xFFFF_FFFF);
        bulk.update_byte(b'D').update(b"ESFire");
        assert_eq!(bulk.value(), bytewise);
    }
}
