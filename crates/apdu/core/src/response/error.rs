//! Error types specific to APDU responses

use super::status::StatusWord;

/// Response parsing and status errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Fewer than the two mandatory status bytes were received
    #[error("Incomplete response: {0} bytes, expected at least 2")]
    Incomplete(usize),

    /// The card answered with a non-success status word
    #[error("Status error {0}")]
    Status(StatusWord),
}
