//! Issuer signatures over seeds
//!
//! Labels are signed with secp256k1 ECDSA. The primitive hashes the seed with
//! SHA-256 before signing; the seed is passed in as an opaque message. Signatures
//! are stored in the 65-byte recoverable form
//!
//! ```text
//! header(1) || r(32) || s(32)      header = 27 + 4 + recovery id
//! ```

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey, signature::Verifier};
use tracing::debug;
use zeroize::Zeroizing;

use crate::label::LabelClaim;
use crate::seed::Seed;
use crate::{CryptoError, Error, Result};

/// Width of a stored signature
pub const SIGNATURE_LEN: usize = 65;

/// Header offset for signatures made with a compressed public key
const HEADER_COMPRESSED: u8 = 27 + 4;
/// Header offset for signatures made with an uncompressed public key
const HEADER_UNCOMPRESSED: u8 = 27;

/// A 65-byte recoverable signature as stored in a label
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LabelSignature([u8; SIGNATURE_LEN]);

impl LabelSignature {
    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[0] = HEADER_COMPRESSED + recovery_id.to_byte();
        bytes[1..].copy_from_slice(&signature.to_bytes());
        Self(bytes)
    }

    /// Split into an ECDSA signature with low S and the matching recovery id
    fn to_parts(&self) -> Result<(Signature, RecoveryId)> {
        let header = self.0[0];
        let recovery_byte = match header {
            h if (HEADER_COMPRESSED..HEADER_COMPRESSED + 4).contains(&h) => h - HEADER_COMPRESSED,
            h if (HEADER_UNCOMPRESSED..HEADER_COMPRESSED).contains(&h) => h - HEADER_UNCOMPRESSED,
            h => return Err(CryptoError::SignatureHeader(h).into()),
        };
        let recovery_id =
            RecoveryId::from_byte(recovery_byte).ok_or(CryptoError::SignatureHeader(header))?;

        let signature = Signature::from_slice(&self.0[1..]).map_err(CryptoError::from)?;
        Ok(match signature.normalize_s() {
            // Negating S mirrors R, flipping the parity of its y coordinate
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (signature, recovery_id),
        })
    }
}

impl TryFrom<&[u8]> for LabelSignature {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| Error::field_length("signature", SIGNATURE_LEN, value.len()))
    }
}

impl fmt::Debug for LabelSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelSignature({})", hex::encode(self.0))
    }
}

impl fmt::Display for LabelSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Issuer signing key
pub struct IssuerKey(SigningKey);

impl IssuerKey {
    /// Wrap a signing key
    pub const fn new(key: SigningKey) -> Self {
        Self(key)
    }

    /// Parse a 32-byte secret scalar
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKey("secret key must be a 32 byte scalar").into())
    }

    /// Parse a hex encoded 32-byte secret scalar
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(hex_key.trim().trim_start_matches("0x")).map_err(CryptoError::from)?,
        );
        Self::from_slice(&bytes)
    }

    /// Generate a fresh random key
    pub fn random<R: k256::elliptic_curve::rand_core::CryptoRngCore>(rng: &mut R) -> Self {
        Self(SigningKey::random(rng))
    }

    /// Hex encoded secret scalar
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0.to_bytes()))
    }

    /// The matching public key
    pub fn public_key(&self) -> IssuerPublicKey {
        IssuerPublicKey(self.0.verifying_key().clone())
    }

    /// Sign a seed
    pub fn sign(&self, seed: &Seed) -> Result<LabelSignature> {
        let (signature, recovery_id) = self
            .0
            .sign_recoverable(seed.as_bytes())
            .map_err(CryptoError::from)?;
        debug!("Signed seed");
        Ok(LabelSignature::from_parts(&signature, recovery_id))
    }
}

impl fmt::Debug for IssuerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Issuer public key used to verify labels
#[derive(Clone, PartialEq, Eq)]
pub struct IssuerPublicKey(VerifyingKey);

impl IssuerPublicKey {
    /// Wrap a verifying key
    pub const fn new(key: VerifyingKey) -> Self {
        Self(key)
    }

    /// Parse a SEC1 encoded point, compressed or uncompressed
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKey("public key is not a valid SEC1 point").into())
    }

    /// Parse a hex encoded SEC1 point
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim().trim_start_matches("0x")).map_err(CryptoError::from)?;
        Self::from_sec1_bytes(&bytes)
    }

    /// Compressed SEC1 encoding
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Hex of the compressed SEC1 encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_sec1_bytes())
    }

    /// Check `signature` over `seed` against this key
    ///
    /// A signature that does not match is `Ok(false)`; a signature that cannot be
    /// parsed at all is a [`CryptoError`].
    pub fn verify(&self, seed: &Seed, signature: &LabelSignature) -> Result<bool> {
        let (signature, _) = signature.to_parts()?;
        Ok(self.0.verify(seed.as_bytes(), &signature).is_ok())
    }

    /// Recover the public key that produced `signature` over `seed`
    pub fn recover(seed: &Seed, signature: &LabelSignature) -> Result<Self> {
        let (signature, recovery_id) = signature.to_parts()?;
        VerifyingKey::recover_from_msg(seed.as_bytes(), &signature, recovery_id)
            .map(Self)
            .map_err(|e| CryptoError::from(e).into())
    }
}

impl fmt::Debug for IssuerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuerPublicKey({})", self.to_hex())
    }
}

impl fmt::Display for IssuerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Errors raised while building an [`IssuerKeyRing`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyRingError {
    /// Range start is after its end
    #[error("Invalid sequence range {start}..={end}")]
    InvalidRange {
        /// First sequence number
        start: u64,
        /// Last sequence number
        end: u64,
    },

    /// Range overlaps one already registered for the issuer
    #[error("Sequence range {start}..={end} overlaps an existing range of issuer {issuer_id}")]
    Overlap {
        /// Issuer ID
        issuer_id: u64,
        /// First sequence number
        start: u64,
        /// Last sequence number
        end: u64,
    },
}

/// Public key responsible for an inclusive range of an issuer's sequence numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Issuer ID
    pub issuer_id: u64,
    /// First sequence number
    pub start: u64,
    /// Last sequence number
    pub end: u64,
    /// Key that signed the range
    pub public_key: IssuerPublicKey,
}

impl KeyRange {
    const fn contains(&self, claim: &LabelClaim) -> bool {
        let sequence_number = claim.sequence_number_u64();
        self.issuer_id == claim.issuer_id_u64()
            && self.start <= sequence_number
            && sequence_number <= self.end
    }
}

/// Verification keys selected by issuer ID and sequence number
#[derive(Debug, Clone, Default)]
pub struct IssuerKeyRing {
    ranges: Vec<KeyRange>,
}

impl IssuerKeyRing {
    /// Create an empty key ring
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `public_key` for sequence numbers `start..=end` of `issuer_id`
    pub fn insert(
        &mut self,
        issuer_id: u64,
        start: u64,
        end: u64,
        public_key: IssuerPublicKey,
    ) -> std::result::Result<(), KeyRingError> {
        if start > end {
            return Err(KeyRingError::InvalidRange { start, end });
        }
        let overlaps = self
            .ranges
            .iter()
            .any(|r| r.issuer_id == issuer_id && r.start <= end && start <= r.end);
        if overlaps {
            return Err(KeyRingError::Overlap {
                issuer_id,
                start,
                end,
            });
        }

        self.ranges.push(KeyRange {
            issuer_id,
            start,
            end,
            public_key,
        });
        Ok(())
    }

    /// Key responsible for `claim`, if any
    pub fn lookup(&self, claim: &LabelClaim) -> Option<&IssuerPublicKey> {
        self.ranges
            .iter()
            .find(|r| r.contains(claim))
            .map(|r| &r.public_key)
    }

    /// Registered ranges
    pub fn ranges(&self) -> &[KeyRange] {
        &self.ranges
    }

    /// Whether no range is registered
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Seed {
        Seed::build(
            &hex::decode("01020304050607").unwrap(),
            &hex::decode("0000000000000001").unwrap(),
            &hex::decode("0000000000000042").unwrap(),
            &[0u8; 32],
        )
        .unwrap()
    }

    fn key(byte: u8) -> IssuerKey {
        IssuerKey::from_slice(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let key = key(0x11);
        let signature = key.sign(&seed()).unwrap();

        assert!((31..=34).contains(&signature.as_bytes()[0]));
        assert!(key.public_key().verify(&seed(), &signature).unwrap());
        assert!(!self::key(0x22).public_key().verify(&seed(), &signature).unwrap());
    }

    #[test]
    fn test_signature_bound_to_seed() {
        let key = key(0x11);
        let signature = key.sign(&seed()).unwrap();

        let other = Seed::build(
            &hex::decode("01020304050607").unwrap(),
            &hex::decode("0000000000000001").unwrap(),
            &hex::decode("0000000000000043").unwrap(),
            &[0u8; 32],
        )
        .unwrap();
        assert!(!key.public_key().verify(&other, &signature).unwrap());
    }

    #[test]
    fn test_recover() {
        let key = IssuerKey::random(&mut rand_v8::thread_rng());
        let signature = key.sign(&seed()).unwrap();
        assert_eq!(
            IssuerPublicKey::recover(&seed(), &signature).unwrap(),
            key.public_key()
        );
    }

    #[test]
    fn test_high_s_accepted() {
        let key = key(0x33);
        let (signature, recovery_id) = key.0.sign_recoverable(seed().as_bytes()).unwrap();

        // Replace S with n - S and flip the parity, as some signers emit
        let (r, _) = signature.split_bytes();
        let high_s = (-*signature.s()).to_bytes();
        let flipped = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[0] = HEADER_COMPRESSED + flipped.to_byte();
        bytes[1..33].copy_from_slice(&r);
        bytes[33..].copy_from_slice(&high_s);
        let stored = LabelSignature(bytes);

        assert!(key.public_key().verify(&seed(), &stored).unwrap());
        assert_eq!(
            IssuerPublicKey::recover(&seed(), &stored).unwrap(),
            key.public_key()
        );
    }

    #[test]
    fn test_malformed_signature() {
        let mut bytes = *key(0x11).sign(&seed()).unwrap().as_bytes();
        bytes[0] = 0x00;
        let signature = LabelSignature::try_from(bytes.as_slice()).unwrap();
        assert!(matches!(
            key(0x11).public_key().verify(&seed(), &signature),
            Err(Error::Crypto(CryptoError::SignatureHeader(0x00)))
        ));

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[0] = 31;
        let signature = LabelSignature::try_from(bytes.as_slice()).unwrap();
        assert!(matches!(
            key(0x11).public_key().verify(&seed(), &signature),
            Err(Error::Crypto(CryptoError::Ecdsa(_)))
        ));
    }

    #[test]
    fn test_key_parsing() {
        let key = key(0x11);
        let parsed = IssuerKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed.public_key(), key.public_key());

        let public = IssuerPublicKey::from_hex(&key.public_key().to_hex()).unwrap();
        assert_eq!(public, key.public_key());
        assert_eq!(public.to_sec1_bytes().len(), 33);

        assert!(matches!(
            IssuerKey::from_slice(&[0u8; 32]),
            Err(Error::Crypto(CryptoError::InvalidKey(_)))
        ));
        assert!(matches!(
            IssuerPublicKey::from_hex("zz"),
            Err(Error::Crypto(CryptoError::Hex(_)))
        ));
    }

    #[test]
    fn test_key_ring() {
        let mut ring = IssuerKeyRing::new();
        ring.insert(1, 0, 99, key(0x01).public_key()).unwrap();
        ring.insert(1, 100, 199, key(0x02).public_key()).unwrap();
        ring.insert(2, 0, 99, key(0x03).public_key()).unwrap();

        assert_eq!(
            ring.insert(1, 150, 250, key(0x04).public_key()),
            Err(KeyRingError::Overlap {
                issuer_id: 1,
                start: 150,
                end: 250
            })
        );
        assert_eq!(
            ring.insert(3, 10, 5, key(0x04).public_key()),
            Err(KeyRingError::InvalidRange { start: 10, end: 5 })
        );

        assert_eq!(
            ring.lookup(&LabelClaim::from_u64(1, 100)),
            Some(&key(0x02).public_key())
        );
        assert_eq!(
            ring.lookup(&LabelClaim::from_u64(2, 99)),
            Some(&key(0x03).public_key())
        );
        assert_eq!(ring.lookup(&LabelClaim::from_u64(1, 200)), None);
        assert_eq!(ring.ranges().len(), 3);
    }
}
