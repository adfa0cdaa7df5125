//! Error types for the PC/SC transport

use nfc_seal::TransportError;

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("No readers available")]
    NoReadersAvailable,

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No tag present in the reader
    #[error("No tag present in reader: {0}")]
    NoCard(String),

    /// Gave up waiting for a tag
    #[error("Timed out waiting for a tag on {0}")]
    Timeout(String),

    /// Reader answered with a non-success status word
    #[error("Status word error: {0:#06X}")]
    StatusWord(u16),

    /// Reader answered with fewer bytes than requested
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Bytes requested
        expected: usize,
        /// Bytes received
        actual: usize,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::NoCard(_) | PcscError::Pcsc(pcsc::Error::NoSmartcard) => Self::NoTag,
            PcscError::Pcsc(pcsc::Error::RemovedCard) => Self::NoTag,
            PcscError::Pcsc(pcsc::Error::Timeout) | PcscError::Timeout(_) => Self::Timeout,
            PcscError::Pcsc(pcsc::Error::Cancelled) => Self::Cancelled,
            PcscError::Pcsc(pcsc::Error::NoService | pcsc::Error::UnknownReader)
            | PcscError::NoReadersAvailable
            | PcscError::ReaderNotFound(_) => Self::Connection,
            PcscError::Pcsc(_) => Self::Transmission,
            PcscError::StatusWord(sw) => Self::StatusWord(sw),
            PcscError::ShortRead { expected, actual } => Self::ShortRead { expected, actual },
            PcscError::Other(message) => Self::Other(message),
        }
    }
}
