use std::time::Duration;

use eyre::{OptionExt, bail};
use nfc_seal::TagSession;
use nfc_seal_pcsc::{PcscConfig, PcscDeviceManager, PcscReader, PcscTransport};
use tracing::info;

/// Find a reader with a specific name
pub fn find_reader_by_name(
    manager: &PcscDeviceManager,
    reader_name: &str,
) -> eyre::Result<PcscReader> {
    manager
        .list_readers()?
        .into_iter()
        .find(|r| r.name() == reader_name)
        .ok_or_else(|| eyre::eyre!("Reader '{reader_name}' not found"))
}

/// Find a reader with a tag in the field
pub fn find_reader_with_card(manager: &PcscDeviceManager) -> eyre::Result<PcscReader> {
    manager
        .list_readers()?
        .into_iter()
        .find(PcscReader::has_card)
        .ok_or_eyre("No tag found on any reader!")
}

/// List all available readers
pub fn list_readers(manager: &PcscDeviceManager) -> eyre::Result<()> {
    let readers = manager.list_readers()?;

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        let status = if reader.has_card() {
            "tag present"
        } else {
            "no tag"
        };
        println!("{}. {} ({})", i + 1, reader.name(), status);
    }

    Ok(())
}

/// How to pick the reader and whether to wait for a tag
#[derive(Debug, Clone, Default)]
pub struct ReaderSelection {
    pub reader: Option<String>,
    pub wait: bool,
    pub timeout: Option<Duration>,
    pub pcsc: PcscConfig,
}

/// Pick a reader, optionally wait for a tag, and open a session on it
pub fn open_session(
    manager: &PcscDeviceManager,
    selection: &ReaderSelection,
) -> eyre::Result<TagSession<PcscTransport>> {
    let reader = match (&selection.reader, selection.wait) {
        (Some(name), _) => find_reader_by_name(manager, name)?,
        (None, false) => find_reader_with_card(manager)?,
        (None, true) => manager
            .list_readers()?
            .into_iter()
            .next()
            .ok_or_eyre("No readers found!")?,
    };

    if selection.wait {
        manager.wait_for_card(reader.name(), selection.timeout)?;
    } else if !reader.has_card() {
        bail!("No tag on reader '{}', use --wait to wait for one", reader.name());
    }

    info!("Using reader: {}", reader.name());
    let transport = manager.open_reader_with_config(reader.name(), selection.pcsc.clone())?;
    Ok(TagSession::open(transport)?)
}
