//! Error types for seal operations
//!
//! Every failure is local to a single tag session. Nothing in this crate retries;
//! the caller decides whether to re-present the tag and start over.

use crate::transport::TransportError;

/// Result type for seal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for seal operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The capability container names a chip this crate has no profile for
    #[error("Unknown chip: capability container code {0:#04x}")]
    UnknownChip(u8),

    /// The factory signature could not be read from the tag
    #[error("Vendor signature unavailable: expected a 37 byte response, got {0} bytes")]
    SignatureUnavailable(usize),

    /// An input did not have its declared width
    #[error("Invalid field length for {field}: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        /// Field name
        field: &'static str,
        /// Declared width
        expected: usize,
        /// Width that was supplied
        actual: usize,
    },

    /// The signature primitive rejected a key or signature
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The serialized NDEF record does not fit a short TLV
    #[error("Record too large: {0} bytes exceeds the 254 byte TLV limit")]
    RecordTooLarge(usize),

    /// The tag holds a record this implementation does not understand
    #[error("Incompatible format: {0}")]
    IncompatibleFormat(#[from] FormatError),

    /// The record checksum does not match its contents
    #[error(
        "Checksum mismatch: stored {}, computed {}",
        hex::encode(.stored),
        hex::encode(.computed)
    )]
    ChecksumMismatch {
        /// Checksum read from the tag
        stored: [u8; 2],
        /// Checksum recomputed over the payload
        computed: [u8; 2],
    },

    /// The tag carries no label at all
    #[error("No label present on the tag")]
    NoLabel,

    /// The tag is already password protected
    #[error("Tag is already password protected (AUTH0 = {0:#04x})")]
    AlreadyProtected(u8),

    /// Password authentication against the tag failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(AuthFailure),

    /// Communication with the tag failed
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Create an invalid field length error
    pub const fn field_length(field: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidFieldLength {
            field,
            expected,
            actual,
        }
    }

    /// Whether this error is evidence that a label was present but has been altered
    ///
    /// A blank tag (`NoLabel`) is not evidence of tampering.
    pub const fn is_tamper_evidence(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. } | Self::IncompatibleFormat(_))
    }
}

/// Reason a stored record was rejected as foreign or malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// First TLV byte is not the NDEF message tag
    #[error("unexpected TLV type {0:#04x}")]
    UnexpectedTlv(u8),

    /// Three byte TLV length form, never written by this implementation
    #[error("extended TLV length is not supported")]
    ExtendedLength,

    /// Data ended before the declared length
    #[error("truncated data: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// TLV terminator missing after the NDEF message
    #[error("missing TLV terminator, found {0:#04x}")]
    MissingTerminator(u8),

    /// NDEF record header could not be parsed
    #[error("malformed NDEF record: {0}")]
    MalformedRecord(&'static str),

    /// Payload is not the size of a seal record
    #[error("unexpected payload length {0}")]
    PayloadLength(usize),

    /// Project signature does not identify a seal record
    #[error("wrong project signature {}", hex::encode(.0))]
    ProjectSignature([u8; 8]),

    /// Format version is not the one this implementation writes
    #[error("wrong format version {}", hex::encode(.0))]
    FormatVersion([u8; 2]),

    /// NDEF record id disagrees with the identity fields in the payload
    #[error("record id does not match payload")]
    RecordId,
}

/// Diagnostic detail for [`Error::AuthenticationFailed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// Reader returned fewer bytes than a PWD_AUTH answer
    #[error("short response ({0} bytes)")]
    ShortResponse(usize),

    /// Controller reported a non-zero status, usually a wrong password
    #[error("rejected with status {0:#04x}")]
    Rejected(u8),

    /// Tag answered with a different PACK than the one derived from the passphrase
    #[error(
        "PACK mismatch: expected {}, received {}",
        hex::encode(.expected),
        hex::encode(.received)
    )]
    PackMismatch {
        /// PACK derived from the passphrase
        expected: [u8; 2],
        /// PACK echoed by the tag
        received: [u8; 2],
    },
}

/// Errors raised by the signature primitive or key parsing
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// ECDSA signing or verification error
    #[error(transparent)]
    Ecdsa(#[from] k256::ecdsa::Error),

    /// Invalid key encoding
    #[error("Invalid key: {0}")]
    InvalidKey(&'static str),

    /// Recoverable signature header outside the accepted range
    #[error("Invalid signature header {0:#04x}")]
    SignatureHeader(u8),

    /// Hex decoding error
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
}
