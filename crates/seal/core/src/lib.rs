//! Anti-counterfeiting seal protocol for NTAG21x NFC tags
//!
//! A seal binds the immutable hardware identity of a tag (its 7-byte factory UID
//! and the 32-byte signature burned in by the chip vendor) to an issuer-assigned
//! sequence number. The issuer signs that binding and the result is persisted on
//! the tag as a checksummed, versioned NDEF record. A verifier reads the tag back,
//! rebuilds the same binding and checks the signature against the issuer's public
//! key.
//!
//! ## Overview
//!
//! - [`chip`] resolves the capability container byte to a [`ChipProfile`]
//! - [`vendor`] reads the factory signature through the reader's direct transmit
//! - [`seed`] builds the 55-byte [`Seed`] that gets signed
//! - [`crypto`] signs and verifies seeds with secp256k1 recoverable signatures
//! - [`label`] encodes and decodes the on-tag [`LabelRecord`]
//! - [`access`] password-protects, authenticates and erases a tag
//! - [`session`] wires all of the above together for one presented tag
//!
//! Device I/O is delegated to a [`TagTransport`] implementation, such as the
//! PC/SC transport in `nfc-seal-pcsc`.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod access;
pub mod chip;
pub mod crypto;
pub mod label;
pub mod ndef;
pub mod seed;
pub mod session;
pub mod transport;
pub mod vendor;

mod error;
pub use error::{AuthFailure, CryptoError, Error, FormatError, Result};

pub use access::{AccessController, AccessSecret, AccessState};
pub use chip::{ChipModel, ChipProfile};
pub use crypto::{IssuerKey, IssuerKeyRing, IssuerPublicKey, KeyRingError, LabelSignature};
pub use label::{LabelClaim, LabelRecord};
pub use seed::{Seed, TagIdentity, Uid, VendorSignature};
pub use session::{TagSession, Verdict, VerifiedLabel};
pub use transport::{TagTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        AccessController, AccessState, ChipModel, ChipProfile, Error, IssuerKey, IssuerKeyRing,
        IssuerPublicKey, LabelClaim, LabelRecord, LabelSignature, Result, Seed, TagIdentity,
        TagSession, TagTransport, TransportError, Uid, VendorSignature, Verdict, VerifiedLabel,
    };
}
