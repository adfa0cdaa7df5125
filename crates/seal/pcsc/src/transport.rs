//! PC/SC tag transport

use std::ffi::CString;
use std::fmt;

use bytes::{Bytes, BytesMut};
use nfc_seal::{TagTransport, TransportError};
use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE};
use tracing::debug;

use crate::frame::{self, MAX_READ_LEN, PAGE_LEN};
use crate::{config::PcscConfig, error::PcscError};

/// Tag transport over a PC/SC reader
pub struct PcscTransport {
    /// PC/SC context
    context: Context,
    /// Card connection, if established
    card: Option<Card>,
    /// Reader name
    reader_name: String,
    /// Configuration
    config: PcscConfig,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .field("has_card", &self.card.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl PcscTransport {
    /// Create a new PC/SC transport for the specified reader
    pub(crate) fn new(
        context: Context,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<Self, PcscError> {
        let mut transport = Self {
            context,
            card: None,
            reader_name: reader_name.to_string(),
            config,
        };

        // A missing tag is reported on first use
        if let Err(e) = transport.connect_card() {
            debug!(error = %e, "No tag connected yet");
        }

        Ok(transport)
    }

    /// Try to connect to the tag
    fn connect_card(&mut self) -> Result<(), PcscError> {
        if self.card.is_some() {
            return Ok(());
        }

        let reader_cstr = CString::new(self.reader_name.clone())
            .map_err(|_| PcscError::ReaderNotFound(self.reader_name.clone()))?;

        match self.context.connect(
            &reader_cstr,
            self.config.share_mode.into(),
            self.config.protocols,
        ) {
            Ok(card) => {
                self.card = Some(card);
                Ok(())
            }
            Err(pcsc::Error::NoSmartcard) => Err(PcscError::NoCard(self.reader_name.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Transmit a command and return the full response, status word included
    fn transmit_command(&mut self, command: &[u8]) -> Result<Bytes, PcscError> {
        self.connect_card()?;

        let card = self
            .card
            .as_mut()
            .ok_or_else(|| PcscError::NoCard(self.reader_name.clone()))?;

        let mut response_buffer = [0u8; MAX_BUFFER_SIZE];
        match card.transmit(command, &mut response_buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(e) => {
                if matches!(e, pcsc::Error::ResetCard | pcsc::Error::RemovedCard) {
                    self.card = None;

                    if self.config.auto_reconnect
                        && e == pcsc::Error::ResetCard
                        && self.connect_card().is_ok()
                    {
                        return self.transmit_command(command);
                    }
                }

                Err(e.into())
            }
        }
    }

    /// Transmit a reader pseudo-APDU and strip its status word
    fn transmit_checked(&mut self, command: &[u8]) -> Result<Bytes, PcscError> {
        let response = self.transmit_command(command)?;
        let data = frame::check_status(&response)?;
        Ok(response.slice(..data.len()))
    }

    fn read(&mut self, page: u16, length: u16) -> Result<Bytes, PcscError> {
        let length = length as usize;
        let mut buffer = BytesMut::with_capacity(length);

        while buffer.len() < length {
            let chunk = (length - buffer.len()).min(MAX_READ_LEN);
            let page = frame::page_byte(page as usize + buffer.len() / PAGE_LEN)?;

            let data = self.transmit_checked(&frame::read_binary(page, chunk as u8))?;
            if data.len() < chunk {
                return Err(PcscError::ShortRead {
                    expected: chunk,
                    actual: data.len(),
                });
            }
            buffer.extend_from_slice(&data[..chunk]);
        }

        Ok(buffer.freeze())
    }

    fn write(&mut self, page: u16, data: &[u8]) -> Result<(), PcscError> {
        for (i, chunk) in data.chunks(PAGE_LEN).enumerate() {
            let page = frame::page_byte(page as usize + i)?;
            self.transmit_checked(&frame::update_binary(page, chunk))?;
        }
        Ok(())
    }
}

impl TagTransport for PcscTransport {
    fn uid(&mut self) -> Result<Bytes, TransportError> {
        self.transmit_checked(&frame::get_uid())
            .map_err(TransportError::from)
    }

    fn do_read_pages(&mut self, page: u16, length: u16) -> Result<Bytes, TransportError> {
        self.read(page, length).map_err(TransportError::from)
    }

    fn do_write_pages(&mut self, page: u16, data: &[u8]) -> Result<(), TransportError> {
        self.write(page, data).map_err(TransportError::from)
    }

    fn do_transceive(
        &mut self,
        command: &[u8],
        _response_len: usize,
    ) -> Result<Bytes, TransportError> {
        // Passed through untouched; the caller interprets the tunnelled answer
        self.transmit_command(command)
            .map_err(TransportError::from)
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        if let Some(card) = self.card.take() {
            let _ = card.disconnect(Disposition::LeaveCard);
        }
    }
}
