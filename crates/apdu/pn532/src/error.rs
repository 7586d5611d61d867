//! Error types for the PN532 controller

use desfire_apdu_core::TransportError;

/// PN532-specific errors
#[derive(Debug, thiserror::Error)]
pub enum Pn532Error {
    /// Link-level failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response packet was too short for its layout
    #[error(transparent)]
    Buffer(#[from] desfire_apdu_core::Error),

    /// The controller answered with something the command does not allow
    #[error("Unexpected response to command {command:#04x}: {reason}")]
    UnexpectedResponse {
        /// Command code that was sent
        command: u8,
        /// What was wrong with the answer
        reason: &'static str,
    },
}

impl From<Pn532Error> for desfire_apdu_core::Error {
    fn from(error: Pn532Error) -> Self {
        match error {
            Pn532Error::Transport(e) => Self::Transport(e),
            Pn532Error::Buffer(e) => e,
            Pn532Error::UnexpectedResponse { command, reason } => {
                Self::Transport(TransportError::InvalidFrame)
                    .with_context(format!("Command {command:#04x}: {reason}"))
            }
        }
    }
}
