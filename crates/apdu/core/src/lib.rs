//! Core types for talking to contactless cards through APDUs
//!
//! This crate provides the layers shared by the PN532 transport and the DESFire
//! session crates:
//!
//! - [`ByteBuffer`], a cursor-based little-endian byte buffer used to build and
//!   parse every packet
//! - [`Command`] and [`Response`], the ISO/IEC 7816-4 command and response APDUs
//! - [`CardTransport`], the capability of exchanging raw APDU bytes with a card
//! - Error types shared across the stack
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

// Main modules
pub mod buffer;
pub mod command;
pub mod response;
pub mod transport;

// Core error types
mod error;
pub use error::{Error, Result, ResultExt};

// Re-exports for common types
pub use buffer::{ByteBuffer, LeInt};
pub use command::Command;
pub use response::status::StatusWord;
pub use response::{Response, ResponseError};
pub use transport::{CardTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        ByteBuffer, Bytes, BytesMut, CardTransport, Command, Error, Response, ResponseError,
        Result, ResultExt, StatusWord, TransportError,
    };
}
