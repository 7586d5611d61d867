//! MIFARE DESFire EV1 session layer
//!
//! [`Desfire`] drives a card through any [`CardTransport`]: it selects the
//! DESFire application, exchanges native commands wrapped in ISO/IEC 7816-4
//! APDUs, runs the AES three-pass authentication and changes keys with an
//! encrypted cryptogram.
//!
//! ```no_run
//! use desfire::{Desfire, DesfireKey};
//! # fn run<T: desfire_apdu_core::CardTransport>(transport: T) -> desfire::Result<()> {
//! let mut card = Desfire::new(transport);
//! card.connect()?;
//! card.authenticate(0x00, &DesfireKey::aes(&[0u8; 16]))?;
//! card.change_key(0x00, &DesfireKey::aes(&[0x42; 16]))?;
//! # Ok(())
//! # }
//! ```
//!
//! [`CardTransport`]: desfire_apdu_core::CardTransport
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod checksum;
pub mod constants;
pub mod crypto;
pub mod cryptogram;
mod error;
pub mod instruction;
pub mod key;
mod session;
pub mod status;

pub use crypto::{Aes128Cbc, CbcCipher, CryptoError};
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use key::{DesfireKey, KeyType, derive_session_key};
pub use session::Desfire;
pub use status::DesfireStatus;
