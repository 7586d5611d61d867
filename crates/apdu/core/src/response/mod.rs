//! APDU response definitions
//!
//! A response APDU is the body followed by exactly two status bytes. Parsing is
//! purely structural: everything before the trailing `SW1 SW2` is payload.

pub mod error;
pub mod status;

use bytes::Bytes;
use tracing::trace;

pub use error::ResponseError;
use status::StatusWord;

use crate::{ByteBuffer, Error, Result};

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response payload data
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub const fn success(payload: Bytes) -> Self {
        Self {
            payload,
            status: status::common::SUCCESS,
        }
    }

    /// Create an error response from a status word
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self {
            payload: Bytes::new(),
            status: status.into(),
        }
    }

    /// Read a response from the unread bytes of `buf`
    ///
    /// Consumes the buffer to its end. Fewer than two remaining bytes is an
    /// [`ResponseError::Incomplete`] error and leaves the cursor untouched.
    pub fn read_from(buf: &mut ByteBuffer) -> Result<Self> {
        let remaining = buf.remaining();
        if remaining < 2 {
            return Err(ResponseError::Incomplete(remaining).into());
        }

        let payload = buf.read_bytes(remaining - 2)?;
        let sw1 = buf.read_u8()?;
        let sw2 = buf.read_u8()?;
        let status = StatusWord::new(sw1, sw2);

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.len(),
            "Parsed APDU response"
        );

        Ok(Self { payload, status })
    }

    /// Parse response from raw bytes (including status word)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from(&mut ByteBuffer::from(data))
    }

    /// Serialize back to `payload SW1 SW2`
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = ByteBuffer::with_capacity(self.payload.len() + 2);
        buf.put_slice(&self.payload)
            .put_u8(self.status.sw1)
            .put_u8(self.status.sw2);
        buf.into_bytes()
    }

    /// Get the response payload data
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Take the response payload data
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success (90 00)
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Payload of a successful response, or the status as an error
    pub fn into_result(self) -> Result<Bytes> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(Error::Response(ResponseError::Status(self.status)))
        }
    }
}
