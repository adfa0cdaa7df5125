use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use nfc_seal_pcsc::PcscDeviceManager;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod commands;
mod config;
mod utils;

use commands::*;
use utils::reader::{self, ReaderSelection};

#[derive(Parser)]
#[command(version, about = "Write, verify and protect anti-counterfeiting NFC seals")]
struct Cli {
    /// Optional reader name to use (will auto-detect if not specified)
    #[arg(short, long)]
    reader: Option<String>,

    /// Wait for a tag to be presented instead of failing
    #[arg(short, long)]
    wait: bool,

    /// Give up waiting after this many seconds
    #[arg(long, requires = "wait")]
    timeout: Option<u64>,

    /// Config file (defaults to ~/.nfc-seal/nfc-seal.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;
    debug!(reader = ?config.reader, issuers = config.issuers.len(), "Loaded config");

    if let Commands::Keygen { output } = &cli.command {
        return keygen_command(output.as_ref());
    }

    let manager = PcscDeviceManager::new()?;
    if !cli.command.needs_tag() {
        return reader::list_readers(&manager);
    }

    let selection = ReaderSelection {
        reader: cli.reader.clone().or_else(|| config.reader.clone()),
        wait: cli.wait,
        timeout: cli.timeout.map(Duration::from_secs),
        pcsc: config.pcsc.pcsc_config(),
    };
    let mut session = reader::open_session(&manager, &selection)?;

    match &cli.command {
        Commands::List | Commands::Keygen { .. } => unreachable!(), // Already handled above
        Commands::Info => info_command(&mut session)?,
        Commands::Write {
            issuer_id,
            seq,
            key,
            passphrase,
            protect,
        } => write_command(
            &mut session,
            &config,
            *issuer_id,
            *seq,
            key.as_deref(),
            passphrase.as_deref(),
            *protect,
        )?,
        Commands::Read => read_command(&mut session)?,
        Commands::Verify { public_key } => {
            verify_command(&mut session, &config, public_key.as_deref())?
        }
        Commands::Protect { passphrase } => {
            protect_command(&mut session, &config, passphrase.as_deref())?
        }
        Commands::Auth { passphrase } => auth_command(&mut session, &config, passphrase.as_deref())?,
        Commands::Erase { passphrase } => {
            erase_command(&mut session, &config, passphrase.as_deref())?
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, directives.as_deref()))
        .with_ansi(true)
        .init();
}

/// `RUST_LOG` style directives on top of the level picked by `--verbose`
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}
