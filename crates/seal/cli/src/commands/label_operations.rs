//! Commands for reading, writing and verifying labels

use colored::Colorize;
use eyre::{bail, eyre};
use nfc_seal::{Error, IssuerPublicKey, LabelClaim, LabelRecord, TagSession, TagTransport, Verdict};
use tracing::debug;

use crate::config::Config;

/// Show what is known about the tag
pub fn info_command<T: TagTransport>(session: &mut TagSession<T>) -> eyre::Result<()> {
    let identity = *session.identity();
    println!("Chip:             {}", session.profile().model);
    println!("UID:              {}", identity.uid);
    println!("Vendor signature: {}", identity.vendor_signature);
    println!("Protection:       {:?}", session.access_state()?);

    match session.read_label() {
        Ok(record) => print_record(&record),
        Err(Error::NoLabel) => println!("Label:            none"),
        Err(e) if e.is_tamper_evidence() => {
            println!("Label:            {} ({e})", "INVALID".red().bold());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Sign a label for the tag and write it
pub fn write_command<T: TagTransport>(
    session: &mut TagSession<T>,
    config: &Config,
    issuer_id: Option<u64>,
    sequence_number: u64,
    key: Option<&str>,
    passphrase: Option<&str>,
    protect: bool,
) -> eyre::Result<()> {
    let issuer_id = issuer_id
        .or(config.issuer_id)
        .ok_or_else(|| eyre!("no issuer ID given, pass --issuer-id or set issuer_id"))?;
    let key = config.signing_key(key)?;

    let passphrase = config.passphrase(passphrase).ok();
    if let Some(passphrase) = passphrase {
        debug!("Unlocking before write");
        session.unlock(passphrase)?;
    }

    let claim = LabelClaim::from_u64(issuer_id, sequence_number);
    let record = session.write_label(claim, &key)?;
    println!("{}", "Label written".green());
    print_record(&record);

    if protect {
        let passphrase = passphrase
            .ok_or_else(|| eyre!("no passphrase given, pass --passphrase or set passphrase"))?;
        session.protect(passphrase)?;
        println!("{}", "Tag protected".green());
    }

    Ok(())
}

/// Read and decode the label
pub fn read_command<T: TagTransport>(session: &mut TagSession<T>) -> eyre::Result<()> {
    match session.read_label() {
        Ok(record) => {
            print_record(&record);
            Ok(())
        }
        Err(Error::NoLabel) => bail!("No label on the tag"),
        Err(e) if e.is_tamper_evidence() => {
            println!("{}", "Label present but invalid, possible tampering".red().bold());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Verify the label against a public key or the configured issuers
pub fn verify_command<T: TagTransport>(
    session: &mut TagSession<T>,
    config: &Config,
    public_key: Option<&str>,
) -> eyre::Result<()> {
    let verified = match public_key {
        Some(public_key) => session.verify_label(&IssuerPublicKey::from_hex(public_key)?)?,
        None => {
            let ring = config.key_ring()?;
            if ring.is_empty() {
                bail!("no public key given, pass --public-key or configure [[issuers]]");
            }
            session.verify_with(&ring)?
        }
    };

    print_record(&verified.record);
    match verified.verdict {
        Verdict::Genuine => {
            println!("Verdict:          {}", "GENUINE".green().bold());
            Ok(())
        }
        Verdict::Forged => {
            println!("Verdict:          {}", "FORGED".red().bold());
            bail!("signature does not match the issuer key")
        }
        Verdict::UnknownIssuer => {
            println!("Verdict:          {}", "UNKNOWN ISSUER".yellow().bold());
            bail!("no key registered for {}", verified.record.claim)
        }
    }
}

fn print_record(record: &LabelRecord) {
    println!("Issuer ID:        {:#018x}", record.claim.issuer_id_u64());
    println!("Sequence number:  {}", record.claim.sequence_number_u64());
    println!("Signature:        {}", record.signature);
    println!("Signature hash:   {}", hex::encode(record.signature_hash()));
}
