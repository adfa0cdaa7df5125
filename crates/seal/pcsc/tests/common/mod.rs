//! Common test utilities

use nfc_seal_pcsc::{PcscDeviceManager, PcscTransport};

/// Try to get the name of a reader with a tag in the field
pub fn get_reader_with_tag() -> Option<String> {
    let manager = PcscDeviceManager::new().ok()?;
    manager
        .list_readers()
        .ok()?
        .into_iter()
        .find(|reader| reader.has_card())
        .map(|reader| reader.name().to_string())
}

/// Try to get a real transport for tests
pub fn get_test_transport() -> Option<PcscTransport> {
    let manager = PcscDeviceManager::new().ok()?;
    let reader_name = get_reader_with_tag()?;
    manager.open_reader(&reader_name).ok()
}
