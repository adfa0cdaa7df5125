use std::path::PathBuf;

use clap::Subcommand;

mod access_operations;
mod key_operations;
mod label_operations;

pub use access_operations::*;
pub use key_operations::*;
pub use label_operations::*;

use crate::utils::parse_u64;

/// Define subcommands for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// List available readers
    List,

    /// Show the chip, identity and protection state of a tag
    Info,

    /// Sign a label for the tag and write it
    Write {
        /// Issuer ID (decimal or 0x hex, defaults to issuer_id from the config)
        #[arg(long, value_parser = parse_u64)]
        issuer_id: Option<u64>,

        /// Sequence number (decimal or 0x hex)
        #[arg(long, value_parser = parse_u64)]
        seq: u64,

        /// Issuer signing key in hex (defaults to private_key from the config)
        #[arg(long)]
        key: Option<String>,

        /// Passphrase, to authenticate first on a protected tag
        #[arg(long)]
        passphrase: Option<String>,

        /// Password protect the tag after writing
        #[arg(long)]
        protect: bool,
    },

    /// Read and decode the label without verifying it
    Read,

    /// Verify the label against an issuer public key
    Verify {
        /// Issuer public key in hex (defaults to the [[issuers]] from the config)
        #[arg(long)]
        public_key: Option<String>,
    },

    /// Password protect the tag
    Protect {
        /// Passphrase the tag password is derived from
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Check the passphrase against a protected tag
    Auth {
        /// Passphrase the tag password is derived from
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Remove protection and zero the label area
    Erase {
        /// Passphrase the tag password is derived from
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Generate a new issuer key pair
    Keygen {
        /// Write the secret key to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    /// Whether the command talks to a tag
    pub const fn needs_tag(&self) -> bool {
        !matches!(self, Self::List | Self::Keygen { .. })
    }
}
