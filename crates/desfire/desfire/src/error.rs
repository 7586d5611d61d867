use desfire_apdu_core::StatusWord;

use crate::{crypto::CryptoError, key::KeyType, status::DesfireStatus};

/// Result type for DESFire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for DESFire operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport, APDU codec or buffer errors
    #[error(transparent)]
    Apdu(#[from] desfire_apdu_core::Error),

    /// The card answered with a failure status
    #[error("Card status: {0}")]
    Status(DesfireStatus),

    /// Selecting the DESFire application failed
    #[error("Application select failed: {0}")]
    SelectFailed(StatusWord),

    /// The key slot is not the authenticated one
    #[error("Key {0} is not authenticated")]
    NotAuthenticated(u8),

    /// The operation is not implemented for this key type
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(KeyType),

    /// The card did not prove knowledge of the key
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// A response had an unexpected length
    #[error("Invalid response length: expected {expected}, got {actual}")]
    InvalidResponseLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Cipher failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Application ids are three bytes wide
    #[error("Invalid application id: {0:#x}")]
    InvalidApplicationId(u32),
}

impl Error {
    /// Card status carried by this error, if any
    pub const fn status(&self) -> Option<DesfireStatus> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<desfire_apdu_core::TransportError> for Error {
    fn from(error: desfire_apdu_core::TransportError) -> Self {
        Self::Apdu(error.into())
    }
}

impl From<desfire_apdu_core::ResponseError> for Error {
    fn from(error: desfire_apdu_core::ResponseError) -> Self {
        Self::Apdu(error.into())
    }
}
