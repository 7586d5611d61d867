//! ChangeKey cryptogram construction
//!
//! The plain cryptogram is the new key (doubled for DES and 3DES), an AES
//! version byte, a checksum, and zero padding up to a multiple of the new key
//! length. Encryption with the session key happens in the session.

use desfire_apdu_core::ByteBuffer;
use zeroize::Zeroizing;

use crate::{
    Error, Result,
    checksum::{DesfireCrc32, crc16_iso14443b},
    constants::{AES_KEY_VERSION, CRC32_SEED, MAX_KEY_NO, key_flags},
    instruction::Instruction,
    key::{DesfireKey, KeyType},
};

/// Encode the key number byte of a ChangeKey command
///
/// Inside the root application the high bits announce the type of the new key.
pub const fn key_number(slot: u8, new_key_type: KeyType, root_application: bool) -> u8 {
    let slot = slot & MAX_KEY_NO;
    if !root_application {
        return slot;
    }

    match new_key_type {
        KeyType::ThreeKeyTripleDes => slot | key_flags::THREE_KEY_TDES,
        KeyType::Aes => slot | key_flags::AES,
        KeyType::None | KeyType::Des | KeyType::TwoKeyTripleDes => slot,
    }
}

/// Build the padded, unencrypted cryptogram for `new_key`
///
/// `key_byte` is the encoded key number as sent on the wire; it takes part in
/// the CRC32.
pub fn build(key_byte: u8, new_key: &DesfireKey) -> Result<Zeroizing<Vec<u8>>> {
    let key_type = new_key.key_type();
    if new_key.is_empty() {
        return Err(Error::UnsupportedKeyType(key_type));
    }

    let mut buf = ByteBuffer::new();
    buf.put_slice(new_key.as_bytes());
    if key_type.is_legacy() {
        buf.put_slice(new_key.as_bytes());
    }
    if key_type == KeyType::Aes {
        buf.put_u8(AES_KEY_VERSION);
    }

    let mut cryptogram = Zeroizing::new(buf.into_bytes().to_vec());

    if key_type.is_legacy() {
        // The first two bytes are not covered
        let crc = crc16_iso14443b(&cryptogram[2..]);
        cryptogram.extend_from_slice(&crc);
    } else {
        let crc = DesfireCrc32::new(CRC32_SEED)
            .update_byte(Instruction::ChangeKey.code())
            .update_byte(key_byte)
            .update(&cryptogram)
            .to_le_bytes();
        cryptogram.extend_from_slice(&crc);
    }

    let block = new_key.len();
    let padded = cryptogram.len().div_ceil(block) * block;
    cryptogram.resize(padded, 0x00);

    Ok(cryptogram)
}
