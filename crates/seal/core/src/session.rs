//! One presented tag
//!
//! A [`TagSession`] resolves the chip profile and reads the hardware identity once
//! when it is opened, then runs label and access operations against that tag. The
//! session owns its transport; concurrent tags need one session each.

use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::access::{AccessController, AccessState};
use crate::chip::{CAPABILITY_CONTAINER_PAGE, ChipProfile};
use crate::crypto::{IssuerKey, IssuerKeyRing, IssuerPublicKey};
use crate::label::{LABEL_AREA_LEN, LABEL_PAGE, LabelClaim, LabelRecord};
use crate::seed::{Seed, TagIdentity, Uid};
use crate::transport::TagTransport;
use crate::vendor;

/// Outcome of checking a label's signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The signature matches the issuer key
    Genuine,
    /// The signature does not match the issuer key
    Forged,
    /// No key is registered for the label's issuer and sequence number
    UnknownIssuer,
}

/// A label read from a tag together with its verdict
#[derive(Debug, Clone)]
pub struct VerifiedLabel {
    /// Record read from the tag
    pub record: LabelRecord,
    /// Seed rebuilt from the tag identity and the record
    pub seed: Seed,
    /// Key the signature was checked against
    pub public_key: Option<IssuerPublicKey>,
    /// Result of the check
    pub verdict: Verdict,
}

impl VerifiedLabel {
    /// Whether the tag carries a genuine label
    pub fn is_genuine(&self) -> bool {
        self.verdict == Verdict::Genuine
    }
}

/// Protocol session for the tag behind a transport
#[derive(Debug)]
pub struct TagSession<T: TagTransport> {
    transport: T,
    profile: ChipProfile,
    identity: TagIdentity,
}

impl<T: TagTransport> TagSession<T> {
    /// Identify the tag behind `transport`
    ///
    /// Reads the capability container, the UID and the vendor signature. An unknown
    /// chip or a missing vendor signature aborts the session.
    pub fn open(mut transport: T) -> Result<Self> {
        let cc = transport.read_pages(CAPABILITY_CONTAINER_PAGE, 4)?;
        let profile = ChipProfile::from_capability_container(&cc)?;
        debug!(model = %profile.model, "Resolved chip profile");

        let uid = Uid::try_from(transport.uid()?.as_ref())?;
        let vendor_signature = vendor::read_vendor_signature(&mut transport)?;

        info!(%uid, model = %profile.model, "Tag session opened");
        Ok(Self {
            transport,
            profile,
            identity: TagIdentity {
                uid,
                vendor_signature,
            },
        })
    }

    /// Chip profile of the tag
    pub const fn profile(&self) -> &ChipProfile {
        &self.profile
    }

    /// Hardware identity of the tag
    pub const fn identity(&self) -> &TagIdentity {
        &self.identity
    }

    /// Factory UID of the tag
    pub const fn uid(&self) -> &Uid {
        &self.identity.uid
    }

    /// Underlying transport
    pub const fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Seed binding this tag to `claim`
    pub fn seed(&self, claim: &LabelClaim) -> Seed {
        Seed::new(&self.identity, claim)
    }

    /// Sign `claim` for this tag without writing anything
    pub fn sign(&self, claim: LabelClaim, key: &IssuerKey) -> Result<LabelRecord> {
        let signature = key.sign(&self.seed(&claim))?;
        Ok(LabelRecord::new(claim, signature))
    }

    /// Sign `claim` for this tag and write the label from page 4
    #[instrument(level = "debug", skip_all, fields(%claim))]
    pub fn write_label(&mut self, claim: LabelClaim, key: &IssuerKey) -> Result<LabelRecord> {
        let record = self.sign(claim, key)?;
        let data = record.encode()?;

        debug!(page = LABEL_PAGE, length = data.len(), "Writing label");
        self.transport.write_pages(LABEL_PAGE, &data)?;

        info!(%claim, uid = %self.identity.uid, "Label written");
        Ok(record)
    }

    /// Read and decode the label
    #[instrument(level = "debug", skip_all, fields(uid = %self.identity.uid))]
    pub fn read_label(&mut self) -> Result<LabelRecord> {
        let data = self.transport.read_pages(LABEL_PAGE, LABEL_AREA_LEN)?;
        LabelRecord::decode(&data)
    }

    /// Read the label and check it against `public_key`
    pub fn verify_label(&mut self, public_key: &IssuerPublicKey) -> Result<VerifiedLabel> {
        let record = self.read_label()?;
        self.check(record, Some(public_key.clone()))
    }

    /// Read the label and check it against the key registered for its claim
    pub fn verify_with(&mut self, keys: &IssuerKeyRing) -> Result<VerifiedLabel> {
        let record = self.read_label()?;
        let public_key = keys.lookup(&record.claim).cloned();
        if public_key.is_none() {
            warn!(claim = %record.claim, "No issuer key registered for label");
        }
        self.check(record, public_key)
    }

    fn check(
        &self,
        record: LabelRecord,
        public_key: Option<IssuerPublicKey>,
    ) -> Result<VerifiedLabel> {
        let seed = self.seed(&record.claim);
        let verdict = match &public_key {
            None => Verdict::UnknownIssuer,
            Some(key) if key.verify(&seed, &record.signature)? => Verdict::Genuine,
            Some(_) => Verdict::Forged,
        };

        match verdict {
            Verdict::Genuine => info!(claim = %record.claim, "Label is genuine"),
            _ => warn!(claim = %record.claim, ?verdict, "Label did not verify"),
        }

        Ok(VerifiedLabel {
            record,
            seed,
            public_key,
            verdict,
        })
    }

    /// Access controller for this tag
    pub fn access(&mut self) -> AccessController<'_, T> {
        AccessController::new(&mut self.transport, self.profile, self.identity.uid)
    }

    /// Current protection state
    pub fn access_state(&mut self) -> Result<AccessState> {
        self.access().state()
    }

    /// See [`AccessController::protect`]
    pub fn protect(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        self.access().protect(passphrase)
    }

    /// See [`AccessController::authenticate`]
    pub fn authenticate(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        self.access().authenticate(passphrase)
    }

    /// See [`AccessController::unlock`]
    pub fn unlock(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        self.access().unlock(passphrase)
    }

    /// See [`AccessController::erase`]
    pub fn erase(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        self.access().erase(passphrase)
    }
}
