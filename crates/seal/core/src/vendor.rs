//! Vendor signature reader and raw NTAG command framing
//!
//! NTAG21x chips carry a 32-byte signature written by the manufacturer that can be
//! read with READ_SIG but never rewritten. Raw NTAG commands are tunnelled through
//! the reader as an ACR122U direct transmit wrapping a PN53x InCommunicateThru:
//!
//! ```text
//! FF 00 00 00 <len> | D4 42 | <ntag command>
//! ```
//!
//! and come back as `D5 43 <status> <data> 90 00`.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::seed::{VENDOR_SIGNATURE_LEN, VendorSignature};
use crate::transport::TagTransport;
use crate::{Error, Result};

/// Reader pseudo-APDU header for direct transmit
pub const DIRECT_TRANSMIT: [u8; 4] = [0xFF, 0x00, 0x00, 0x00];
/// PN53x InCommunicateThru prefix
pub const IN_COMMUNICATE_THRU: [u8; 2] = [0xD4, 0x42];

/// NTAG READ_SIG command code
pub const READ_SIG: u8 = 0x3C;
/// NTAG PWD_AUTH command code
pub const PWD_AUTH: u8 = 0x1B;

/// Offset of the controller status byte in a tunnelled response
pub const RESPONSE_STATUS_OFFSET: usize = 2;
/// Offset of the NTAG answer in a tunnelled response
pub const RESPONSE_DATA_OFFSET: usize = 3;

/// `D5 43 00` + 32 signature bytes + `90 00`
pub const READ_SIG_RESPONSE_LEN: usize = RESPONSE_DATA_OFFSET + VENDOR_SIGNATURE_LEN + 2;

/// Wrap an NTAG command in the reader's direct transmit frame
pub fn direct_transmit(ntag_command: &[u8]) -> Bytes {
    let payload_len = IN_COMMUNICATE_THRU.len() + ntag_command.len();
    let mut buffer = BytesMut::with_capacity(DIRECT_TRANSMIT.len() + 1 + payload_len);

    buffer.put_slice(&DIRECT_TRANSMIT);
    buffer.put_u8(payload_len as u8);
    buffer.put_slice(&IN_COMMUNICATE_THRU);
    buffer.put_slice(ntag_command);

    buffer.freeze()
}

/// Build the READ_SIG command (address 0)
pub fn read_sig_command() -> Bytes {
    direct_transmit(&[READ_SIG, 0x00])
}

/// Read the factory signature of the tag in the field
///
/// Any answer that is not exactly [`READ_SIG_RESPONSE_LEN`] bytes means the tag
/// cannot prove its origin and must be treated as untrusted for this session.
pub fn read_vendor_signature<T: TagTransport + ?Sized>(
    transport: &mut T,
) -> Result<VendorSignature> {
    debug!("Reading vendor signature");
    let response = transport.transceive(&read_sig_command(), READ_SIG_RESPONSE_LEN)?;

    if response.len() != READ_SIG_RESPONSE_LEN {
        warn!(length = response.len(), "Cannot read vendor signature from the tag");
        return Err(Error::SignatureUnavailable(response.len()));
    }

    VendorSignature::try_from(
        &response[RESPONSE_DATA_OFFSET..RESPONSE_DATA_OFFSET + VENDOR_SIGNATURE_LEN],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_read_sig_framing() {
        assert_eq!(
            read_sig_command().as_ref(),
            &[0xFF, 0x00, 0x00, 0x00, 0x04, 0xD4, 0x42, 0x3C, 0x00]
        );
        assert_eq!(
            direct_transmit(&[PWD_AUTH, 1, 2, 3, 4]).as_ref(),
            &[0xFF, 0x00, 0x00, 0x00, 0x07, 0xD4, 0x42, 0x1B, 1, 2, 3, 4]
        );
    }

    #[test]
    fn test_read_vendor_signature() {
        let mut response = vec![0xD5, 0x43, 0x00];
        response.extend((0..32).map(|i| i as u8));
        response.extend([0x90, 0x00]);

        let mut transport = MockTransport::new(&[0; 7]).with_response(&response);
        let signature = read_vendor_signature(&mut transport).unwrap();

        let expected: Vec<u8> = (0..32).map(|i| i as u8).collect();
        assert_eq!(signature.as_bytes().as_slice(), expected.as_slice());
        assert_eq!(transport.commands[0], read_sig_command());
    }

    #[test]
    fn test_signature_unavailable() {
        // Tag without READ_SIG support: controller reports a timeout status only
        let mut transport =
            MockTransport::new(&[0; 7]).with_response(&[0xD5, 0x43, 0x01, 0x90, 0x00]);
        assert!(matches!(
            read_vendor_signature(&mut transport),
            Err(Error::SignatureUnavailable(5))
        ));
    }
}
