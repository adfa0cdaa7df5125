//! Tag identity and seed derivation
//!
//! The seed is the message the issuer signs:
//!
//! ```text
//! uid(7) || issuer_id(8) || sequence_number(8) || vendor_signature(32)
//! ```
//!
//! It is never stored. Both the signing and the verifying side rebuild it from the
//! tag, so the layout here must never change without a new format version.

use std::fmt;

use derive_more::Deref;

use crate::label::LabelClaim;
use crate::{Error, Result};

/// Width of the factory UID
pub const UID_LEN: usize = 7;
/// Width of the issuer ID
pub const ISSUER_ID_LEN: usize = 8;
/// Width of the sequence number
pub const SEQUENCE_NUMBER_LEN: usize = 8;
/// Width of the vendor signature
pub const VENDOR_SIGNATURE_LEN: usize = 32;
/// Width of the seed
pub const SEED_LEN: usize = UID_LEN + ISSUER_ID_LEN + SEQUENCE_NUMBER_LEN + VENDOR_SIGNATURE_LEN;

/// Factory-assigned 7-byte tag UID
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deref)]
pub struct Uid([u8; UID_LEN]);

impl Uid {
    /// Wrap a UID
    pub const fn new(bytes: [u8; UID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; UID_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Uid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| Error::field_length("uid", UID_LEN, value.len()))
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", hex::encode(self.0))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Vendor-burned 32-byte chip signature
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deref)]
pub struct VendorSignature([u8; VENDOR_SIGNATURE_LEN]);

impl VendorSignature {
    /// Wrap a vendor signature
    pub const fn new(bytes: [u8; VENDOR_SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; VENDOR_SIGNATURE_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for VendorSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for VendorSignature {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| Error::field_length("vendor signature", VENDOR_SIGNATURE_LEN, value.len()))
    }
}

impl fmt::Debug for VendorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VendorSignature({})", hex::encode(self.0))
    }
}

impl fmt::Display for VendorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Immutable hardware identity of a presented tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagIdentity {
    /// Factory UID
    pub uid: Uid,
    /// Factory signature
    pub vendor_signature: VendorSignature,
}

/// The 55-byte message signed by the issuer
#[derive(Clone, Copy, PartialEq, Eq, Deref)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Build a seed from untyped fields, checking every width
    pub fn build(
        uid: &[u8],
        issuer_id: &[u8],
        sequence_number: &[u8],
        vendor_signature: &[u8],
    ) -> Result<Self> {
        let identity = TagIdentity {
            uid: Uid::try_from(uid)?,
            vendor_signature: VendorSignature::try_from(vendor_signature)?,
        };
        let claim = LabelClaim::try_from_slices(issuer_id, sequence_number)?;
        Ok(Self::new(&identity, &claim))
    }

    /// Build a seed from a tag identity and an issuer claim
    pub fn new(identity: &TagIdentity, claim: &LabelClaim) -> Self {
        let mut seed = [0u8; SEED_LEN];
        let (uid, rest) = seed.split_at_mut(UID_LEN);
        let (issuer_id, rest) = rest.split_at_mut(ISSUER_ID_LEN);
        let (sequence_number, vendor_signature) = rest.split_at_mut(SEQUENCE_NUMBER_LEN);

        uid.copy_from_slice(identity.uid.as_bytes());
        issuer_id.copy_from_slice(&claim.issuer_id);
        sequence_number.copy_from_slice(&claim.sequence_number);
        vendor_signature.copy_from_slice(identity.vendor_signature.as_bytes());

        Self(seed)
    }

    /// Raw seed bytes
    pub const fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", hex::encode(self.0))
    }
}
