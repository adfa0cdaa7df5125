//! Transport traits for tag memory and raw command access
//!
//! A transport is responsible for moving bytes to and from one presented tag.
//! It has no knowledge of labels, seeds or passwords. Every call is a blocking
//! round trip; timeouts and cancellation belong to the implementation.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, trace};

/// Tag transport error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// No tag in the field
    #[error("No tag present")]
    NoTag,

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

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Cancelled operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new status word error from individual bytes
    pub const fn status_word_bytes(sw1: u8, sw2: u8) -> Self {
        Self::StatusWord(((sw1 as u16) << 8) | (sw2 as u16))
    }

    /// Get the status word if this is a status word error
    pub const fn get_status_word(&self) -> Option<u16> {
        match self {
            Self::StatusWord(sw) => Some(*sw),
            _ => None,
        }
    }

    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}

/// Trait for tag transports
///
/// Pages are 4 bytes wide. `read_pages` and `write_pages` address memory by page
/// number and move whole byte ranges; `transceive` passes a command through to the
/// contactless controller untouched.
pub trait TagTransport: fmt::Debug {
    /// Read the factory UID of the tag in the field
    fn uid(&mut self) -> Result<Bytes, TransportError>;

    /// Read `length` bytes starting at page `page`
    fn read_pages(&mut self, page: u16, length: u16) -> Result<Bytes, TransportError> {
        trace!(page, length, "Reading pages");
        let result = self.do_read_pages(page, length);
        match &result {
            Ok(data) => trace!(data = %hex::encode(data), "Read pages"),
            Err(e) => debug!(error = ?e, page, "Transport error during read"),
        }
        result
    }

    /// Write `data` starting at page `page`
    fn write_pages(&mut self, page: u16, data: &[u8]) -> Result<(), TransportError> {
        trace!(page, data = %hex::encode(data), "Writing pages");
        let result = self.do_write_pages(page, data);
        if let Err(e) = &result {
            debug!(error = ?e, page, "Transport error during write");
        }
        result
    }

    /// Send a raw command and return a response of at most `response_len` bytes
    fn transceive(&mut self, command: &[u8], response_len: usize) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode(command), response_len, "Transceiving raw command");
        let result = self.do_transceive(command, response_len);
        match &result {
            Ok(response) => trace!(response = %hex::encode(response), "Received raw response"),
            Err(e) => debug!(error = ?e, "Transport error during transceive"),
        }
        result
    }

    /// Internal implementation of read_pages
    fn do_read_pages(&mut self, page: u16, length: u16) -> Result<Bytes, TransportError>;

    /// Internal implementation of write_pages
    fn do_write_pages(&mut self, page: u16, data: &[u8]) -> Result<(), TransportError>;

    /// Internal implementation of transceive
    fn do_transceive(&mut self, command: &[u8], response_len: usize)
    -> Result<Bytes, TransportError>;
}

#[cfg(test)]
pub(crate) use mock::MockTransport;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_word_bytes() {
        let err = TransportError::status_word_bytes(0x63, 0x00);
        assert_eq!(err.get_status_word(), Some(0x6300));
        assert_eq!(err.to_string(), "Status word error: 0x6300");
        assert_eq!(TransportError::Timeout.get_status_word(), None);
    }

    #[test]
    fn test_mock_records_traffic() {
        let mut transport = MockTransport::new(&[1, 2, 3, 4, 5, 6, 7])
            .with_read(&[0xAA; 4])
            .with_response(&[0xD5, 0x43, 0x00]);

        assert_eq!(transport.read_pages(3, 4).unwrap().as_ref(), &[0xAA; 4]);
        transport.write_pages(4, &[0x01, 0x02]).unwrap();
        assert_eq!(
            transport.transceive(&[0xFF], 3).unwrap().as_ref(),
            &[0xD5, 0x43, 0x00]
        );

        assert_eq!(transport.read_requests, vec![(3, 4)]);
        assert_eq!(transport.writes[0].0, 4);
        assert_eq!(transport.commands.len(), 1);
        assert!(transport.read_pages(4, 4).is_err());
    }
}
