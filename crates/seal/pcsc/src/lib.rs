//! PC/SC tag transport for `nfc-seal`
//!
//! Implements [`nfc_seal::TagTransport`] for ACR122U-class contactless readers.
//! Page access uses the reader's READ BINARY / UPDATE BINARY pseudo-APDUs; raw
//! NTAG commands go through the direct transmit tunnel untouched.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nfc_seal::TagSession;
//! use nfc_seal_pcsc::PcscDeviceManager;
//!
//! let manager = PcscDeviceManager::new()?;
//! let readers = manager.list_readers()?;
//! let reader = &readers[0];
//!
//! manager.wait_for_card(reader.name(), None)?;
//! let transport = manager.open_reader(reader.name())?;
//!
//! let session = TagSession::open(transport)?;
//! println!("{} {}", session.profile().model, session.uid());
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod error;
pub mod frame;
mod manager;
mod reader;
mod transport;

pub use config::{PcscConfig, ShareMode};
pub use error::PcscError;
pub use manager::PcscDeviceManager;
pub use reader::PcscReader;
pub use transport::PcscTransport;

pub use pcsc::{Protocol, Protocols};
