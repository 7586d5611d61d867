//! Key material and session-key diversification

use core::fmt;

use derive_more::Display;
use zeroize::Zeroize;

use crate::instruction::Instruction;

/// Cipher family of a DESFire key
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    /// No key
    #[default]
    #[display("none")]
    None,
    /// Single DES
    #[display("DES")]
    Des,
    /// Two-key triple DES
    #[display("3DES")]
    TwoKeyTripleDes,
    /// Three-key triple DES
    #[display("3K3DES")]
    ThreeKeyTripleDes,
    /// AES-128
    #[display("AES")]
    Aes,
}

impl KeyType {
    /// Stored key length in bytes, `None` for keys of unspecified length
    pub const fn key_len(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Des | Self::TwoKeyTripleDes => Some(8),
            Self::ThreeKeyTripleDes => Some(24),
            Self::Aes => Some(16),
        }
    }

    /// Authentication instruction matching this key type
    pub const fn auth_instruction(self) -> Option<Instruction> {
        match self {
            Self::None => None,
            Self::Des | Self::TwoKeyTripleDes => Some(Instruction::AuthenticateLegacy),
            Self::ThreeKeyTripleDes => Some(Instruction::AuthenticateIso),
            Self::Aes => Some(Instruction::AuthenticateAes),
        }
    }

    /// Whether the key travels doubled and guarded by a CRC16 in a ChangeKey cryptogram
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::Des | Self::TwoKeyTripleDes)
    }
}

/// A typed DESFire key
///
/// The key bytes are truncated or zero-padded to the length of the type on
/// construction and wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct DesfireKey {
    #[zeroize(skip)]
    key_type: KeyType,
    key: Vec<u8>,
}

impl DesfireKey {
    /// Create a key of the given type
    pub fn new(key_type: KeyType, key: &[u8]) -> Self {
        let mut key = key.to_vec();
        if let Some(len) = key_type.key_len() {
            key.resize(len, 0x00);
        }
        Self { key_type, key }
    }

    /// Single DES key
    pub fn des(key: &[u8]) -> Self {
        Self::new(KeyType::Des, key)
    }

    /// Two-key triple DES key
    pub fn tdes(key: &[u8]) -> Self {
        Self::new(KeyType::TwoKeyTripleDes, key)
    }

    /// Three-key triple DES key
    pub fn three_k_tdes(key: &[u8]) -> Self {
        Self::new(KeyType::ThreeKeyTripleDes, key)
    }

    /// AES-128 key
    pub fn aes(key: &[u8]) -> Self {
        Self::new(KeyType::Aes, key)
    }

    /// Key type
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Whether the key holds no bytes
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for DesfireKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesfireKey")
            .field("key_type", &self.key_type)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Derive the session key from both authentication nonces
///
/// | type   | session key                                        |
/// |--------|----------------------------------------------------|
/// | DES    | `A[0..4] B[0..4]`                                  |
/// | 3DES   | `A[0..4] B[0..4] A[4..8] B[4..8]`                  |
/// | 3K3DES | `A[0..4] B[0..4] A[6..10] B[6..10] A[12..16] B[12..16]` |
/// | AES    | `A[0..4] B[0..4] A[12..16] B[12..16]`              |
///
/// The 3DES result goes through [`DesfireKey::new`] and is therefore cut to
/// 8 bytes.
pub fn derive_session_key(rnd_a: &[u8; 16], rnd_b: &[u8; 16], key_type: KeyType) -> DesfireKey {
    let windows: &[core::ops::Range<usize>] = match key_type {
        KeyType::None => &[],
        KeyType::Des => &[0..4],
        KeyType::TwoKeyTripleDes => &[0..4, 4..8],
        KeyType::ThreeKeyTripleDes => &[0..4, 6..10, 12..16],
        KeyType::Aes => &[0..4, 12..16],
    };

    let mut material = zeroize::Zeroizing::new(Vec::with_capacity(24));
    for window in windows {
        material.extend_from_slice(&rnd_a[window.clone()]);
        material.extend_from_slice(&rnd_b[window.clone()]);
    }

    DesfireKey::new(key_type, &material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const RND_A: [u8; 16] = hex!("A0A1A2A3A4A5A6A7A8A9AAABACADAEAF");
    const RND_B: [u8; 16] = hex!("B0B1B2B3B4B5B6B7B8B9BABBBCBDBEBF");

    #[test]
    fn test_construction_forces_length() {
        assert_eq!(DesfireKey::aes(&[0x11; 4]).as_bytes(), &hex!("11111111 000000000000000000000000"));
        assert_eq!(DesfireKey::des(&[0x22; 16]).len(), 8);
        assert_eq!(DesfireKey::tdes(&[0x22; 16]).len(), 8);
        assert_eq!(DesfireKey::three_k_tdes(&[]).len(), 24);
        assert_eq!(DesfireKey::new(KeyType::None, &[1, 2, 3]).len(), 3);
    }

    #[test]
    fn test_auth_instruction() {
        assert_eq!(KeyType::Des.auth_instruction(), Some(Instruction::AuthenticateLegacy));
        assert_eq!(KeyType::TwoKeyTripleDes.auth_instruction(), Some(Instruction::AuthenticateLegacy));
        assert_eq!(KeyType::ThreeKeyTripleDes.auth_instruction(), Some(Instruction::AuthenticateIso));
        assert_eq!(KeyType::Aes.auth_instruction().map(Instruction::code), Some(0xAA));
        assert_eq!(KeyType::None.auth_instruction(), None);
    }

    #[test]
    fn test_session_keys() {
        let aes = derive_session_key(&RND_A, &RND_B, KeyType::Aes);
        assert_eq!(aes.key_type(), KeyType::Aes);
        assert_eq!(aes.as_bytes(), &hex!("A0A1A2A3 B0B1B2B3 ACADAEAF BCBDBEBF"));

        let des = derive_session_key(&RND_A, &RND_B, KeyType::Des);
        assert_eq!(des.as_bytes(), &hex!("A0A1A2A3 B0B1B2B3"));

        // 3DES keeps only the first 8 bytes
        let tdes = derive_session_key(&RND_A, &RND_B, KeyType::TwoKeyTripleDes);
        assert_eq!(tdes.as_bytes(), &hex!("A0A1A2A3 B0B1B2B3"));

        let three_k = derive_session_key(&RND_A, &RND_B, KeyType::ThreeKeyTripleDes);
        assert_eq!(
            three_k.as_bytes(),
            &hex!("A0A1A2A3 B0B1B2B3 A6A7A8A9 B6B7B8B9 ACADAEAF BCBDBEBF")
        );

        assert!(derive_session_key(&RND_A, &RND_B, KeyType::None).is_empty());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = DesfireKey::aes(&hex!("00112233445566778899AABBCCDDEEFF"));
        let debug = format!("{key:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("0x11"));
        assert!(!debug.contains("17"));
    }
}
