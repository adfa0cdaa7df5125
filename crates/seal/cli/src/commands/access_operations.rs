//! Commands for tag password protection

use colored::Colorize;
use nfc_seal::{AccessState, TagSession, TagTransport};

use crate::config::Config;

/// Password protect the tag
pub fn protect_command<T: TagTransport>(
    session: &mut TagSession<T>,
    config: &Config,
    passphrase: Option<&str>,
) -> eyre::Result<()> {
    let passphrase = config.passphrase(passphrase)?;
    session.protect(passphrase)?;
    println!("{}", "Tag protected".green());
    Ok(())
}

/// Authenticate against a protected tag
pub fn auth_command<T: TagTransport>(
    session: &mut TagSession<T>,
    config: &Config,
    passphrase: Option<&str>,
) -> eyre::Result<()> {
    let passphrase = config.passphrase(passphrase)?;
    session.authenticate(passphrase)?;
    println!("{}", "Passphrase accepted".green());
    Ok(())
}

/// Remove protection and zero the label area
pub fn erase_command<T: TagTransport>(
    session: &mut TagSession<T>,
    config: &Config,
    passphrase: Option<&str>,
) -> eyre::Result<()> {
    // An unprotected tag is erased without authenticating
    let passphrase = match session.access_state()? {
        AccessState::Unprotected => config.passphrase(passphrase).unwrap_or_default(),
        _ => config.passphrase(passphrase)?,
    };
    session.erase(passphrase)?;
    println!("{}", "Tag erased".green());
    Ok(())
}
