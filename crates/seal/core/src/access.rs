//! Password protection of the tag memory
//!
//! NTAG21x chips guard writes with a 32-bit password and answer a successful
//! PWD_AUTH with a 16-bit PACK. Both are derived per tag:
//!
//! ```text
//! SHA-256(passphrase || uid) = password(4) || pack(2) || ...
//! ```
//!
//! The controller keeps no protection state of its own. Every operation reads
//! the configuration block from the tag first.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::chip::ChipProfile;
use crate::label::{LABEL_AREA_LEN, LABEL_PAGE};
use crate::seed::Uid;
use crate::transport::TagTransport;
use crate::vendor::{self, PWD_AUTH, RESPONSE_DATA_OFFSET, RESPONSE_STATUS_OFFSET};
use crate::{AuthFailure, Error, Result};

/// Width of the configuration block (CFG0 and CFG1)
pub const CONFIG_LEN: u16 = 8;
/// Index of AUTH0 within the configuration block
pub const AUTH0_INDEX: usize = 3;
/// Index of ACCESS within the configuration block
pub const ACCESS_INDEX: usize = 4;
/// AUTH0 value meaning no page is protected
pub const AUTH0_UNPROTECTED: u8 = 0xFF;
/// First page protected by [`AccessController::protect`]
pub const PROTECT_FROM_PAGE: u8 = 0x04;

/// Width of the password
pub const PASSWORD_LEN: usize = 4;
/// Width of the PACK
pub const PACK_LEN: usize = 2;

/// `D5 43 00` + PACK + `90 00`
pub const PWD_AUTH_RESPONSE_LEN: usize = RESPONSE_DATA_OFFSET + PACK_LEN + 2;

/// Per-tag password and PACK
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessSecret {
    password: [u8; PASSWORD_LEN],
    pack: [u8; PACK_LEN],
}

impl AccessSecret {
    /// Derive the secret of the tag with `uid` from a shared passphrase
    pub fn derive(passphrase: impl AsRef<[u8]>, uid: &Uid) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(passphrase.as_ref());
        hasher.update(uid.as_bytes());
        let mut digest = hasher.finalize();

        let mut secret = Self {
            password: [0; PASSWORD_LEN],
            pack: [0; PACK_LEN],
        };
        secret.password.copy_from_slice(&digest[..PASSWORD_LEN]);
        secret
            .pack
            .copy_from_slice(&digest[PASSWORD_LEN..PASSWORD_LEN + PACK_LEN]);
        digest.as_mut_slice().zeroize();

        secret
    }

    /// Password written to the password register
    pub const fn password(&self) -> &[u8; PASSWORD_LEN] {
        &self.password
    }

    /// PACK written to the PACK register and expected back from PWD_AUTH
    pub const fn pack(&self) -> &[u8; PACK_LEN] {
        &self.pack
    }
}

impl fmt::Debug for AccessSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessSecret(..)")
    }
}

/// Protection state of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// AUTH0 is the unprotected sentinel
    Unprotected,
    /// Pages from `auth0` onward require the password
    Protected {
        /// First protected page
        auth0: u8,
    },
    /// The password was accepted in the current RF session
    Authenticated,
}

impl AccessState {
    /// Interpret an 8-byte configuration block
    pub fn from_config(config: &[u8]) -> Result<Self> {
        let auth0 = *config
            .get(AUTH0_INDEX)
            .ok_or(Error::field_length("config", CONFIG_LEN as usize, config.len()))?;
        Ok(if auth0 == AUTH0_UNPROTECTED {
            Self::Unprotected
        } else {
            Self::Protected { auth0 }
        })
    }

    /// Whether any page requires the password
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Protected { .. })
    }
}

/// Build the PWD_AUTH command for `password`
pub fn pwd_auth_command(password: &[u8; PASSWORD_LEN]) -> bytes::Bytes {
    let mut command = [0u8; 1 + PASSWORD_LEN];
    command[0] = PWD_AUTH;
    command[1..].copy_from_slice(password);
    let framed = vendor::direct_transmit(&command);
    command.zeroize();
    framed
}

/// Check a PWD_AUTH answer against the expected PACK
pub fn check_pwd_auth_response(response: &[u8], pack: &[u8; PACK_LEN]) -> Result<()> {
    let status = *response
        .get(RESPONSE_STATUS_OFFSET)
        .ok_or(Error::AuthenticationFailed(AuthFailure::ShortResponse(response.len())))?;
    if status != 0x00 {
        return Err(Error::AuthenticationFailed(AuthFailure::Rejected(status)));
    }
    if response.len() < PWD_AUTH_RESPONSE_LEN {
        return Err(Error::AuthenticationFailed(AuthFailure::ShortResponse(
            response.len(),
        )));
    }

    let received = [response[RESPONSE_DATA_OFFSET], response[RESPONSE_DATA_OFFSET + 1]];
    if &received != pack {
        return Err(Error::AuthenticationFailed(AuthFailure::PackMismatch {
            expected: *pack,
            received,
        }));
    }
    Ok(())
}

/// Password protection operations on one presented tag
#[derive(Debug)]
pub struct AccessController<'a, T: TagTransport + ?Sized> {
    transport: &'a mut T,
    profile: ChipProfile,
    uid: Uid,
}

impl<'a, T: TagTransport + ?Sized> AccessController<'a, T> {
    /// Create a controller for the tag behind `transport`
    pub const fn new(transport: &'a mut T, profile: ChipProfile, uid: Uid) -> Self {
        Self {
            transport,
            profile,
            uid,
        }
    }

    /// Read the configuration block
    pub fn read_config(&mut self) -> Result<[u8; CONFIG_LEN as usize]> {
        let data = self
            .transport
            .read_pages(self.profile.config_page, CONFIG_LEN)?;
        data.get(..CONFIG_LEN as usize)
            .and_then(|config| config.try_into().ok())
            .ok_or(Error::field_length("config", CONFIG_LEN as usize, data.len()))
    }

    /// Current protection state, read from the tag
    pub fn state(&mut self) -> Result<AccessState> {
        let config = self.read_config()?;
        AccessState::from_config(&config)
    }

    /// Lock writes to every page from 4 onward behind a password derived from `passphrase`
    ///
    /// Fails with [`Error::AlreadyProtected`] and writes nothing if AUTH0 is not the
    /// unprotected sentinel. A failure part way through leaves the tag in an
    /// intermediate state that needs manual recovery.
    pub fn protect(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        let mut config = self.read_config()?;
        let auth0 = config[AUTH0_INDEX];
        if auth0 != AUTH0_UNPROTECTED {
            warn!(auth0, "Tag is already protected");
            return Err(Error::AlreadyProtected(auth0));
        }

        let secret = AccessSecret::derive(passphrase, &self.uid);

        debug!(page = self.profile.password_page, "Writing password");
        self.transport
            .write_pages(self.profile.password_page, secret.password())?;

        debug!(page = self.profile.pack_page, "Writing PACK");
        let mut pack_page = [0u8; 4];
        pack_page[..PACK_LEN].copy_from_slice(secret.pack());
        self.transport
            .write_pages(self.profile.pack_page, &pack_page)?;

        // Write access needs the password; read access stays open
        config[AUTH0_INDEX] = PROTECT_FROM_PAGE;
        config[ACCESS_INDEX] = 0x00;
        debug!(page = self.profile.config_page, "Writing config");
        self.transport
            .write_pages(self.profile.config_page, &config)?;

        info!(uid = %self.uid, "Tag protected");
        Ok(AccessState::Protected {
            auth0: PROTECT_FROM_PAGE,
        })
    }

    /// Present the password derived from `passphrase` to the tag
    ///
    /// The tag must answer with status 0 and the PACK derived from the same
    /// passphrase. Authentication lasts until the tag leaves the field.
    pub fn authenticate(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        let secret = AccessSecret::derive(passphrase, &self.uid);

        debug!("Authenticating");
        let response = self
            .transport
            .transceive(&pwd_auth_command(secret.password()), PWD_AUTH_RESPONSE_LEN)?;

        if let Err(e) = check_pwd_auth_response(&response, secret.pack()) {
            warn!(error = %e, "Password authentication failed");
            return Err(e);
        }

        info!(uid = %self.uid, "Authenticated");
        Ok(AccessState::Authenticated)
    }

    /// Authenticate only if the tag is protected
    ///
    /// An unprotected tag is left alone, since its factory password would reject
    /// the derived one.
    pub fn unlock(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        match self.state()? {
            AccessState::Unprotected => Ok(AccessState::Unprotected),
            _ => self.authenticate(passphrase),
        }
    }

    /// Remove protection if present and zero the label area
    ///
    /// A protected tag is authenticated first, then AUTH0 and ACCESS are reset.
    /// The label area is zeroed in every case.
    pub fn erase(&mut self, passphrase: impl AsRef<[u8]>) -> Result<AccessState> {
        let mut config = self.read_config()?;

        if config[AUTH0_INDEX] != AUTH0_UNPROTECTED {
            self.authenticate(passphrase)?;

            config[AUTH0_INDEX] = AUTH0_UNPROTECTED;
            config[ACCESS_INDEX] = 0x00;
            debug!(page = self.profile.config_page, "Removing protection");
            self.transport
                .write_pages(self.profile.config_page, &config)?;
        }

        debug!(page = LABEL_PAGE, length = LABEL_AREA_LEN, "Zeroing label area");
        self.transport
            .write_pages(LABEL_PAGE, &[0u8; LABEL_AREA_LEN as usize])?;

        info!(uid = %self.uid, "Tag erased");
        Ok(AccessState::Unprotected)
    }
}
