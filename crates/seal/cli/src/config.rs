use std::path::{Path, PathBuf};

use eyre::{OptionExt, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use nfc_seal::{IssuerKey, IssuerKeyRing, IssuerPublicKey};
use nfc_seal_pcsc::{PcscConfig, ShareMode};
use serde::{Deserialize, Serialize};

/// CLI configuration, from `~/.nfc-seal/nfc-seal.toml` and `NFC_SEAL_*` variables
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Config {
    /// Reader to use instead of the first one with a tag
    pub reader: Option<String>,
    /// Shared passphrase the per-tag passwords are derived from
    pub passphrase: Option<String>,
    /// Hex encoded issuer signing key
    pub private_key: Option<String>,
    /// Issuer ID written into new labels
    pub issuer_id: Option<u64>,
    /// Verification keys by issuer and sequence range
    #[serde(default)]
    pub issuers: Vec<IssuerEntry>,
    /// Reader connection options
    #[serde(default)]
    pub pcsc: PcscSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IssuerEntry {
    pub issuer_id: u64,
    pub seq_start: u64,
    pub seq_end: u64,
    pub public_key: String,
}

/// `[pcsc]` section
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PcscSettings {
    pub share_mode: ShareModeSetting,
    pub auto_reconnect: bool,
}

impl Default for PcscSettings {
    fn default() -> Self {
        Self {
            share_mode: ShareModeSetting::Shared,
            auto_reconnect: true,
        }
    }
}

impl PcscSettings {
    pub fn pcsc_config(&self) -> PcscConfig {
        PcscConfig::new()
            .with_share_mode(self.share_mode.into())
            .with_auto_reconnect(self.auto_reconnect)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShareModeSetting {
    Exclusive,
    Shared,
    Direct,
}

impl From<ShareModeSetting> for ShareMode {
    fn from(mode: ShareModeSetting) -> Self {
        match mode {
            ShareModeSetting::Exclusive => Self::Exclusive,
            ShareModeSetting::Shared => Self::Shared,
            ShareModeSetting::Direct => Self::Direct,
        }
    }
}

impl Config {
    /// Build the verification key ring from the `[[issuers]]` entries
    pub fn key_ring(&self) -> eyre::Result<IssuerKeyRing> {
        let mut ring = IssuerKeyRing::new();
        for entry in &self.issuers {
            let public_key = IssuerPublicKey::from_hex(&entry.public_key)
                .wrap_err_with(|| format!("invalid public key for issuer {}", entry.issuer_id))?;
            ring.insert(entry.issuer_id, entry.seq_start, entry.seq_end, public_key)?;
        }
        Ok(ring)
    }

    /// Signing key from the command line, falling back to the config
    pub fn signing_key(&self, key: Option<&str>) -> eyre::Result<IssuerKey> {
        let key = key
            .or(self.private_key.as_deref())
            .ok_or_eyre("no issuer key given, pass --key or set private_key")?;
        Ok(IssuerKey::from_hex(key)?)
    }

    /// Passphrase from the command line, falling back to the config
    pub fn passphrase<'a>(&'a self, passphrase: Option<&'a str>) -> eyre::Result<&'a str> {
        passphrase
            .or(self.passphrase.as_deref())
            .ok_or_eyre("no passphrase given, pass --passphrase or set passphrase")
    }
}

/// Returns the base config directory. It also creates the directory if it
/// doesn't exist yet.
pub fn config_dir() -> eyre::Result<PathBuf> {
    let dir = std::env::home_dir()
        .ok_or_eyre("home directory not found")?
        .join(".nfc-seal");
    if !dir.exists() {
        std::fs::create_dir(&dir)?
    }
    Ok(dir)
}

pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("NFC_SEAL_"))
}

pub fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_dir()?.join("nfc-seal.toml"),
    };
    figment(&path)
        .extract()
        .wrap_err_with(|| format!("failed to load config from {}", path.display()))
}
