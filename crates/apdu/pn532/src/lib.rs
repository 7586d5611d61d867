//! PN532 transport over the high-speed UART link
//!
//! Layers, bottom up:
//!
//! - [`SerialPort`]: non-blocking byte I/O supplied by the platform
//! - [`HsuInterface`]: frame encoding, ACK handling and timeout-bounded reads
//! - [`Pn532`]: controller commands (firmware version, SAM, RF retries,
//!   target listing and release)
//! - [`TagLink`]: a [`CardTransport`](desfire_apdu_core::CardTransport) that
//!   tunnels APDUs to one activated card through InDataExchange
//!
//! ```no_run
//! use desfire_transport_pn532::{
//!     BaudModulation, HsuInterface, Pn532, SamConfiguration, mock::MockSerialPort,
//! };
//!
//! # fn main() -> Result<(), desfire_transport_pn532::Pn532Error> {
//! let mut pn532 = Pn532::new(HsuInterface::new(MockSerialPort::new()));
//! pn532.begin()?;
//! pn532.sam_config(SamConfiguration::default())?;
//!
//! let targets = pn532.in_list_passive_target(1, BaudModulation::TypeA106)?;
//! if let Some(target) = targets.first_type_a()? {
//!     println!("{:?} uid={}", target.card_type(), hex::encode(&target.uid));
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod constants;
mod controller;
mod error;
pub mod frame;
mod hsu;
mod interface;
pub mod mock;
pub mod packets;
mod serial;
mod tag;

pub use config::Pn532Config;
pub use controller::Pn532;
pub use error::Pn532Error;
pub use frame::Frame;
pub use hsu::{HsuInterface, LinkState};
pub use interface::Pn532Interface;
pub use packets::{
    BaudModulation, CardType, FirmwareVersion, InListPassiveTargetResponse, SamConfiguration,
    SamMode, TargetDataTypeA,
};
pub use serial::SerialPort;
pub use tag::TagLink;
