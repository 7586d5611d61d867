//! DESFire card status codes
//!
//! Native answers carry the status in SW2. Every code maps to its own
//! variant; codes this crate does not know are kept verbatim in
//! [`DesfireStatus::Unknown`].

use derive_more::Display;
use tracing::Level;

/// Status reported by the card after a native command
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesfireStatus {
    /// Successful operation
    #[display("Operation OK")]
    OperationOk,
    /// No changes done to backup files
    #[display("No changes")]
    NoChanges,
    /// Insufficient NV-memory to complete the command
    #[display("Out of EEPROM")]
    OutOfEeprom,
    /// Command code not supported
    #[display("Illegal command code")]
    IllegalCommandCode,
    /// CRC or MAC does not match, or invalid padding bytes
    #[display("Integrity error")]
    IntegrityError,
    /// Invalid key number specified
    #[display("No such key")]
    NoSuchKey,
    /// Length of command string invalid
    #[display("Length error")]
    LengthError,
    /// Current configuration or status does not allow the command
    #[display("Permission denied")]
    PermissionDenied,
    /// Value of a parameter is invalid
    #[display("Parameter error")]
    ParameterError,
    /// Requested application not present
    #[display("Application not found")]
    ApplicationNotFound,
    /// Unrecoverable error within the application
    #[display("Application integrity error")]
    ApplicationIntegrityError,
    /// Current authentication status does not allow the command
    #[display("Authentication error")]
    AuthenticationError,
    /// More frames follow or the next handshake frame is expected
    #[display("Additional frame")]
    AdditionalFrame,
    /// Attempt to read or write beyond the file limits
    #[display("Boundary error")]
    BoundaryError,
    /// Unrecoverable error within the PICC
    #[display("PICC integrity error")]
    PiccIntegrityError,
    /// Previous command was not fully completed
    #[display("Command aborted")]
    CommandAborted,
    /// PICC was disabled by an unrecoverable error
    #[display("PICC disabled")]
    PiccDisabled,
    /// Number of applications limited to 28
    #[display("Count error")]
    CountError,
    /// Application or file already exists
    #[display("Duplicate error")]
    DuplicateError,
    /// Could not complete an NV-write operation
    #[display("EEPROM error")]
    EepromError,
    /// Specified file number does not exist
    #[display("File not found")]
    FileNotFound,
    /// Unrecoverable error within the file
    #[display("File integrity error")]
    FileIntegrityError,
    /// Any other status byte
    #[display("Unknown status {_0:#04x}")]
    Unknown(u8),
}

impl DesfireStatus {
    /// Decode a status byte
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::OperationOk,
            0x0C => Self::NoChanges,
            0x0E => Self::OutOfEeprom,
            0x1C => Self::IllegalCommandCode,
            0x1E => Self::IntegrityError,
            0x40 => Self::NoSuchKey,
            0x7E => Self::LengthError,
            0x9D => Self::PermissionDenied,
            0x9E => Self::ParameterError,
            0xA0 => Self::ApplicationNotFound,
            0xA1 => Self::ApplicationIntegrityError,
            0xAE => Self::AuthenticationError,
            0xAF => Self::AdditionalFrame,
            0xBE => Self::BoundaryError,
            0xC1 => Self::PiccIntegrityError,
            0xCA => Self::CommandAborted,
            0xCD => Self::PiccDisabled,
            0xCE => Self::CountError,
            0xDE => Self::DuplicateError,
            0xFE => Self::EepromError,
            0xF0 => Self::FileNotFound,
            0xF1 => Self::FileIntegrityError,
            other => Self::Unknown(other),
        }
    }

    /// Encode back to the status byte
    pub const fn code(self) -> u8 {
        match self {
            Self::OperationOk => 0x00,
            Self::NoChanges => 0x0C,
            Self::OutOfEeprom => 0x0E,
            Self::IllegalCommandCode => 0x1C,
            Self::IntegrityError => 0x1E,
            Self::NoSuchKey => 0x40,
            Self::LengthError => 0x7E,
            Self::PermissionDenied => 0x9D,
            Self::ParameterError => 0x9E,
            Self::ApplicationNotFound => 0xA0,
            Self::ApplicationIntegrityError => 0xA1,
            Self::AuthenticationError => 0xAE,
            Self::AdditionalFrame => 0xAF,
            Self::BoundaryError => 0xBE,
            Self::PiccIntegrityError => 0xC1,
            Self::CommandAborted => 0xCA,
            Self::PiccDisabled => 0xCD,
            Self::CountError => 0xCE,
            Self::DuplicateError => 0xDE,
            Self::EepromError => 0xFE,
            Self::FileNotFound => 0xF0,
            Self::FileIntegrityError => 0xF1,
            Self::Unknown(code) => code,
        }
    }

    /// Whether a native command completed, possibly with more frames pending
    pub const fn is_success(self) -> bool {
        matches!(self, Self::OperationOk | Self::AdditionalFrame)
    }

    /// Get the appropriate tracing level for this status
    pub const fn tracing_level(self) -> Level {
        match self {
            Self::OperationOk | Self::AdditionalFrame => Level::DEBUG,
            Self::NoChanges => Level::INFO,
            _ => Level::WARN,
        }
    }
}

impl From<u8> for DesfireStatus {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<DesfireStatus> for u8 {
    fn from(status: DesfireStatus) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_is_distinct() {
        let mut seen = std::collections::HashSet::new();
        for code in 0..=u8::MAX {
            let status = DesfireStatus::from_code(code);
            assert_eq!(status.code(), code);
            assert!(seen.insert(status));
        }
    }

    #[test]
    fn test_success_statuses() {
        assert!(DesfireStatus::OperationOk.is_success());
        assert!(DesfireStatus::AdditionalFrame.is_success());
        assert!(!DesfireStatus::AuthenticationError.is_success());
        assert!(!DesfireStatus::Unknown(0x01).is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(DesfireStatus::from_code(0xAE).to_string(), "Authentication error");
        assert_eq!(DesfireStatus::from_code(0x42).to_string(), "Unknown status 0x42");
    }
}
