//! On-tag label record codec
//!
//! The label is stored from page 4 as a single NDEF record of unknown type inside
//! an NDEF TLV. The record id is `issuer_id || sequence_number` and the payload is:
//!
//! ```text
//! offset  len  field
//!      0    8  project signature   07 6c f3 1a 2b 7f 35 a3
//!      8    2  format version      00 01
//!     10    8  issuer id
//!     18    8  sequence number
//!     26   65  signature
//!     91    2  checksum            SHA-256(bytes 0..91)[0..2]
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::crypto::{LabelSignature, SIGNATURE_LEN};
use crate::ndef::{self, NdefRecord, Tnf};
use crate::seed::{ISSUER_ID_LEN, SEQUENCE_NUMBER_LEN};
use crate::{Error, FormatError, Result};

/// Constant identifying a seal record
pub const PROJECT_SIGNATURE: [u8; 8] = [0x07, 0x6c, 0xf3, 0x1a, 0x2b, 0x7f, 0x35, 0xa3];
/// Record layout revision written by this implementation
pub const FORMAT_VERSION: [u8; 2] = [0x00, 0x01];

/// Width of the checksum
pub const CHECKSUM_LEN: usize = 2;
/// Width of the checksummed part of the payload
pub const CHECKSUMMED_LEN: usize = PROJECT_SIGNATURE.len()
    + FORMAT_VERSION.len()
    + ISSUER_ID_LEN
    + SEQUENCE_NUMBER_LEN
    + SIGNATURE_LEN;
/// Width of the full payload
pub const PAYLOAD_LEN: usize = CHECKSUMMED_LEN + CHECKSUM_LEN;
/// Width of the NDEF record id
pub const RECORD_ID_LEN: usize = ISSUER_ID_LEN + SEQUENCE_NUMBER_LEN;

/// First page of the label area
pub const LABEL_PAGE: u16 = 4;
/// Bytes read back when looking for a label, and zeroed by erase
pub const LABEL_AREA_LEN: u16 = 144;

/// Issuer-assigned identity of a label
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelClaim {
    /// Issuer ID
    pub issuer_id: [u8; ISSUER_ID_LEN],
    /// Sequence number, unique within the issuer's namespace
    pub sequence_number: [u8; SEQUENCE_NUMBER_LEN],
}

impl LabelClaim {
    /// Create a claim from raw fields
    pub const fn new(
        issuer_id: [u8; ISSUER_ID_LEN],
        sequence_number: [u8; SEQUENCE_NUMBER_LEN],
    ) -> Self {
        Self {
            issuer_id,
            sequence_number,
        }
    }

    /// Create a claim from integers, stored big-endian
    pub const fn from_u64(issuer_id: u64, sequence_number: u64) -> Self {
        Self::new(issuer_id.to_be_bytes(), sequence_number.to_be_bytes())
    }

    /// Create a claim from untyped fields, checking both widths
    pub fn try_from_slices(issuer_id: &[u8], sequence_number: &[u8]) -> Result<Self> {
        let issuer_id = issuer_id
            .try_into()
            .map_err(|_| Error::field_length("issuer id", ISSUER_ID_LEN, issuer_id.len()))?;
        let sequence_number = sequence_number.try_into().map_err(|_| {
            Error::field_length("sequence number", SEQUENCE_NUMBER_LEN, sequence_number.len())
        })?;
        Ok(Self::new(issuer_id, sequence_number))
    }

    /// Issuer ID read as a big-endian integer
    pub const fn issuer_id_u64(&self) -> u64 {
        u64::from_be_bytes(self.issuer_id)
    }

    /// Sequence number read as a big-endian integer
    pub const fn sequence_number_u64(&self) -> u64 {
        u64::from_be_bytes(self.sequence_number)
    }

    /// NDEF record id: `issuer_id || sequence_number`
    pub fn record_id(&self) -> [u8; RECORD_ID_LEN] {
        let mut id = [0u8; RECORD_ID_LEN];
        id[..ISSUER_ID_LEN].copy_from_slice(&self.issuer_id);
        id[ISSUER_ID_LEN..].copy_from_slice(&self.sequence_number);
        id
    }
}

impl fmt::Debug for LabelClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelClaim")
            .field("issuer_id", &hex::encode(self.issuer_id))
            .field("sequence_number", &hex::encode(self.sequence_number))
            .finish()
    }
}

impl fmt::Display for LabelClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            hex::encode(self.issuer_id),
            hex::encode(self.sequence_number)
        )
    }
}

/// A label as persisted on the tag
///
/// Project signature, format version and checksum are implied: they are written by
/// [`LabelRecord::encode`] and checked by [`LabelRecord::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    /// Issuer claim
    pub claim: LabelClaim,
    /// Issuer signature over the seed
    pub signature: LabelSignature,
}

impl LabelRecord {
    /// Create a record
    pub const fn new(claim: LabelClaim, signature: LabelSignature) -> Self {
        Self { claim, signature }
    }

    /// Build the checksummed payload
    pub fn payload(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(PAYLOAD_LEN);
        buffer.put_slice(&PROJECT_SIGNATURE);
        buffer.put_slice(&FORMAT_VERSION);
        buffer.put_slice(&self.claim.issuer_id);
        buffer.put_slice(&self.claim.sequence_number);
        buffer.put_slice(self.signature.as_bytes());

        let checksum = checksum(&buffer);
        buffer.put_slice(&checksum);

        buffer.freeze()
    }

    /// Checksum stored with this record
    pub fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let payload = self.payload();
        [payload[CHECKSUMMED_LEN], payload[CHECKSUMMED_LEN + 1]]
    }

    /// SHA-256 of the signature, the value a registry keeps for each seal
    pub fn signature_hash(&self) -> [u8; 32] {
        Sha256::digest(self.signature.as_bytes()).into()
    }

    /// Serialize to page-aligned bytes ready to be written at [`LABEL_PAGE`]
    pub fn encode(&self) -> Result<Bytes> {
        let record = NdefRecord::unknown(self.claim.record_id().to_vec(), self.payload());
        ndef::wrap_tlv(&record.to_bytes())
    }

    /// Parse and validate a label from tag memory starting at [`LABEL_PAGE`]
    pub fn decode(data: &[u8]) -> Result<Self> {
        let message = ndef::unwrap_tlv(data)?;
        let record = NdefRecord::parse(message)?;
        if record.tnf != Tnf::Unknown {
            return Err(FormatError::MalformedRecord("label record type is not unknown").into());
        }
        let payload = record.payload.as_ref();

        if payload.len() != PAYLOAD_LEN {
            return Err(FormatError::PayloadLength(payload.len()).into());
        }

        // The checksum is verified before the header fields it covers.
        let (body, stored) = payload.split_at(CHECKSUMMED_LEN);
        let computed = checksum(body);
        if stored != computed.as_slice() {
            let stored = [stored[0], stored[1]];
            warn!(
                stored = %hex::encode(stored),
                computed = %hex::encode(computed),
                "Label checksum mismatch"
            );
            return Err(Error::ChecksumMismatch { stored, computed });
        }

        let (project_signature, rest) = body.split_at(PROJECT_SIGNATURE.len());
        if project_signature != PROJECT_SIGNATURE.as_slice() {
            return Err(FormatError::ProjectSignature(to_array(project_signature)).into());
        }

        let (format_version, rest) = rest.split_at(FORMAT_VERSION.len());
        if format_version != FORMAT_VERSION.as_slice() {
            return Err(FormatError::FormatVersion(to_array(format_version)).into());
        }

        let (issuer_id, rest) = rest.split_at(ISSUER_ID_LEN);
        let (sequence_number, signature) = rest.split_at(SEQUENCE_NUMBER_LEN);
        let claim = LabelClaim::try_from_slices(issuer_id, sequence_number)?;

        if !record.id.is_empty() && record.id[..] != claim.record_id()[..] {
            return Err(FormatError::RecordId.into());
        }

        let signature = LabelSignature::try_from(signature)?;
        debug!(%claim, "Decoded label record");

        Ok(Self { claim, signature })
    }
}

/// First two bytes of SHA-256 over `data`
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(data);
    [digest[0], digest[1]]
}

fn to_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LabelRecord {
        let mut signature = [0u8; SIGNATURE_LEN];
        signature[0] = 0x20;
        signature[1..].iter_mut().enumerate().for_each(|(i, b)| *b = i as u8);
        LabelRecord::new(
            LabelClaim::from_u64(1, 0x42),
            LabelSignature::try_from(signature.as_slice()).unwrap(),
        )
    }

    #[test]
    fn test_encoded_layout() {
        let encoded = record().encode().unwrap();

        // TLV + short record header + 16 byte id + 93 byte payload + terminator
        assert_eq!(encoded.len(), 116);
        assert_eq!(encoded.len() % 4, 0);
        assert_eq!(&encoded[..6], &[0x03, 113, 0xDD, 0x00, 93, 16]);
        assert_eq!(
            &encoded[6..22],
            hex::decode("00000000000000010000000000000042").unwrap().as_slice()
        );
        assert_eq!(&encoded[22..30], &PROJECT_SIGNATURE);
        assert_eq!(&encoded[30..32], &FORMAT_VERSION);
        assert_eq!(encoded[115], 0xFE);
    }

    #[test]
    fn test_decode_round_trip() {
        let record = record();
        let mut area = record.encode().unwrap().to_vec();
        area.resize(LABEL_AREA_LEN as usize, 0);

        let decoded = LabelRecord::decode(&area).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.claim.issuer_id_u64(), 1);
        assert_eq!(decoded.claim.sequence_number_u64(), 0x42);
    }

    #[test]
    fn test_checksum_covers_every_payload_bit() {
        let encoded = record().encode().unwrap();
        let payload_start = 22;

        for byte in payload_start..payload_start + PAYLOAD_LEN {
            for bit in 0..8 {
                let mut tampered = encoded.to_vec();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(
                        LabelRecord::decode(&tampered),
                        Err(Error::ChecksumMismatch { .. })
                    ),
                    "flip at byte {byte} bit {bit} not detected"
                );
            }
        }
    }

    #[test]
    fn test_foreign_magic_with_valid_checksum() {
        let encoded = record().encode().unwrap();
        let payload_start = 22;

        let mut tampered = encoded.to_vec();
        tampered[payload_start] = 0x00;
        let sum = checksum(&tampered[payload_start..payload_start + CHECKSUMMED_LEN]);
        tampered[payload_start + CHECKSUMMED_LEN..payload_start + PAYLOAD_LEN]
            .copy_from_slice(&sum);
        assert!(matches!(
            LabelRecord::decode(&tampered),
            Err(Error::IncompatibleFormat(FormatError::ProjectSignature(_)))
        ));

        let mut tampered = encoded.to_vec();
        tampered[payload_start + 9] = 0x02;
        let sum = checksum(&tampered[payload_start..payload_start + CHECKSUMMED_LEN]);
        tampered[payload_start + CHECKSUMMED_LEN..payload_start + PAYLOAD_LEN]
            .copy_from_slice(&sum);
        assert!(matches!(
            LabelRecord::decode(&tampered),
            Err(Error::IncompatibleFormat(FormatError::FormatVersion([0x00, 0x02])))
        ));
    }

    #[test]
    fn test_record_id_must_match() {
        let mut encoded = record().encode().unwrap().to_vec();
        encoded[6] ^= 0x80;
        assert!(matches!(
            LabelRecord::decode(&encoded),
            Err(Error::IncompatibleFormat(FormatError::RecordId))
        ));
    }

    #[test]
    fn test_typed_record_rejected() {
        let record = NdefRecord {
            tnf: Tnf::WellKnown,
            record_type: Bytes::from_static(b"T"),
            id: Bytes::new(),
            payload: record().payload(),
        };
        let framed = ndef::wrap_tlv(&record.to_bytes()).unwrap();
        assert!(matches!(
            LabelRecord::decode(&framed),
            Err(Error::IncompatibleFormat(FormatError::MalformedRecord(_)))
        ));
    }

    #[test]
    fn test_wrong_payload_length() {
        let record = NdefRecord::unknown(Vec::new(), vec![0u8; 60]);
        let framed = ndef::wrap_tlv(&record.to_bytes()).unwrap();
        assert!(matches!(
            LabelRecord::decode(&framed),
            Err(Error::IncompatibleFormat(FormatError::PayloadLength(60)))
        ));
    }

    #[test]
    fn test_blank_memory_is_no_label() {
        assert!(matches!(
            LabelRecord::decode(&[0u8; LABEL_AREA_LEN as usize]),
            Err(Error::NoLabel)
        ));
    }

    #[test]
    fn test_signature_hash() {
        let record = record();
        let expected: [u8; 32] = Sha256::digest(record.signature.as_bytes()).into();
        assert_eq!(record.signature_hash(), expected);
        assert_eq!(record.checksum(), checksum(&record.payload()[..CHECKSUMMED_LEN]));
    }
}
