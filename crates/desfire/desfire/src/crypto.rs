//! Block cipher capability used by the session
//!
//! The chaining value is threaded explicitly: every call takes the IV by
//! mutable reference and leaves the CBC state (the last ciphertext block) in
//! it, ready for the next call of the same exchange.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, IvState, KeyIvInit};
use cipher::generic_array::GenericArray;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

type Encryptor = cbc::Encryptor<aes::Aes128>;
type Decryptor = cbc::Decryptor<aes::Aes128>;

/// Cipher failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Key or IV length does not fit the cipher
    #[error("Invalid key or IV length")]
    InvalidLength,

    /// Input is not a whole number of blocks
    #[error("Data length {0} is not a multiple of the block size")]
    Unaligned(usize),
}

/// CBC-mode block cipher
pub trait CbcCipher {
    /// Encrypt `data`, updating `iv` to the chaining state afterwards
    fn encrypt(&self, key: &[u8], iv: &mut [u8], data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `data`, updating `iv` to the chaining state afterwards
    fn decrypt(&self, key: &[u8], iv: &mut [u8], data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// AES-128 in CBC mode without padding
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes128Cbc;

impl CbcCipher for Aes128Cbc {
    fn encrypt(&self, key: &[u8], iv: &mut [u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_aligned(data)?;
        let mut encryptor =
            Encryptor::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength)?;

        let mut out = data.to_vec();
        for block in out.chunks_exact_mut(BLOCK_SIZE) {
            encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        iv.copy_from_slice(&encryptor.iv_state());
        Ok(out)
    }

    fn decrypt(&self, key: &[u8], iv: &mut [u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_aligned(data)?;
        let mut decryptor =
            Decryptor::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength)?;

        let mut out = data.to_vec();
        for block in out.chunks_exact_mut(BLOCK_SIZE) {
            decryptor.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        iv.copy_from_slice(&decryptor.iv_state());
        Ok(out)
    }
}

const fn check_aligned(data: &[u8]) -> Result<(), CryptoError> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Unaligned(data.len()));
    }
    Ok(())
}

/// Rotate left by one byte: `x1 .. xn x0`
pub fn rotate_left(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    if !out.is_empty() {
        out.rotate_left(1);
    }
    out
}

/// Rotate right by one byte: `xn x0 .. xn-1`
pub fn rotate_right(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    if !out.is_empty() {
        out.rotate_right(1);
    }
    out
}
