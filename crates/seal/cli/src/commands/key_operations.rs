//! Commands for issuer keys

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use nfc_seal::IssuerKey;
use tracing::info;

/// Generate a new issuer key pair
pub fn keygen_command(output: Option<&PathBuf>) -> eyre::Result<()> {
    let key = IssuerKey::random(&mut rand_v8::thread_rng());
    let secret = key.to_hex();

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            writeln!(file, "{}", secret.as_str())?;
            info!("Secret key written to {}", path.display());
        }
        None => println!("Private key: {}", secret.as_str()),
    }
    println!("Public key:  {}", key.public_key());

    Ok(())
}
