//! Device manager for PC/SC operations

use std::ffi::CString;
use std::time::{Duration, Instant};

use pcsc::{Context, ReaderState, Scope, State};
use tracing::{debug, info};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::reader::{PcscReader, is_present};
use crate::transport::PcscTransport;

/// Manager for PC/SC device operations
#[allow(missing_debug_implementations)]
pub struct PcscDeviceManager {
    /// PC/SC context
    context: Context,
}

impl PcscDeviceManager {
    /// Create a new PC/SC device manager
    pub fn new() -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// List all available readers
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let readers = self.context.list_readers_owned()?;
        if readers.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        let mut result = Vec::with_capacity(readers.len());
        for reader_name in readers {
            let mut reader_states = vec![ReaderState::new(reader_name.as_c_str(), State::UNAWARE)];

            match self.context.get_status_change(None, &mut reader_states) {
                Ok(()) => result.push(PcscReader::from_reader_state(&reader_states[0])),
                // If we can't get status, assume no tag
                Err(_) => result.push(PcscReader::new(
                    reader_name.to_string_lossy().into_owned(),
                    false,
                    None,
                )),
            }
        }

        Ok(result)
    }

    /// Open a connection to a specific reader
    pub fn open_reader(&self, reader_name: &str) -> Result<PcscTransport, PcscError> {
        self.open_reader_with_config(reader_name, PcscConfig::default())
    }

    /// Open a connection to a specific reader with custom configuration
    pub fn open_reader_with_config(
        &self,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<PcscTransport, PcscError> {
        PcscTransport::new(self.context.clone(), reader_name, config)
    }

    /// Block until a tag is in the field of `reader_name`
    ///
    /// Returns immediately if a tag is already present. `None` waits forever.
    pub fn wait_for_card(
        &self,
        reader_name: &str,
        timeout: Option<Duration>,
    ) -> Result<PcscReader, PcscError> {
        let name = CString::new(reader_name)
            .map_err(|_| PcscError::ReaderNotFound(reader_name.to_string()))?;
        let mut reader_states = vec![ReaderState::new(name, State::UNAWARE)];
        let deadline = timeout.map(|t| Instant::now() + t);

        info!(reader = reader_name, "Waiting for a tag");
        loop {
            let remaining = deadline
                .map(|deadline| {
                    deadline
                        .checked_duration_since(Instant::now())
                        .ok_or_else(|| PcscError::Timeout(reader_name.to_string()))
                })
                .transpose()?;

            match self.context.get_status_change(remaining, &mut reader_states) {
                Ok(()) => {}
                Err(pcsc::Error::Timeout) => {
                    return Err(PcscError::Timeout(reader_name.to_string()));
                }
                Err(pcsc::Error::UnknownReader) => {
                    return Err(PcscError::ReaderNotFound(reader_name.to_string()));
                }
                Err(e) => return Err(e.into()),
            }

            let state = &reader_states[0];
            if is_present(state.event_state()) {
                debug!(atr = %hex::encode(state.atr()), "Tag present");
                return Ok(PcscReader::from_reader_state(state));
            }
            reader_states[0].sync_current_state();
        }
    }
}
