//! Error types specific to card transport

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No byte arrived before the deadline
    #[error("Operation timed out")]
    Timeout,

    /// A frame failed a preamble, checksum, direction or postamble check
    #[error("Invalid frame")]
    InvalidFrame,

    /// The acknowledgement did not match the expected pattern
    #[error("Invalid acknowledgement")]
    InvalidAck,

    /// The declared payload does not fit the receive buffer
    #[error("Response does not fit the receive buffer")]
    NoSpace,

    /// The reader reported a failed exchange with the card
    #[error("Card exchange failed with reader status {0:#04x}")]
    Exchange(u8),

    /// The underlying serial link failed
    #[error("Serial link error: {0}")]
    Serial(String),
}

impl TransportError {
    /// Create a serial link error
    pub fn serial<S: Into<String>>(message: S) -> Self {
        Self::Serial(message.into())
    }

    /// Whether this error is a timeout
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
