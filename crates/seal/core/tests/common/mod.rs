//! Common test utilities

#![allow(dead_code, unreachable_pub)]

use bytes::Bytes;
use nfc_seal::{TagTransport, TransportError};

const PAGE_LEN: usize = 4;

/// In-memory NTAG21x behind an ACR122U-style reader
///
/// Honours AUTH0 for writes, answers READ_SIG and PWD_AUTH through the direct
/// transmit tunnel, and returns zeros when the password or PACK pages are read.
#[derive(Debug, Clone)]
pub struct NtagSimulator {
    pub uid: [u8; 7],
    pub memory: Vec<u8>,
    pub vendor_signature: Option<[u8; 32]>,
    pub config_page: u16,
    pub authenticated: bool,
    pub writes: usize,
}

impl NtagSimulator {
    fn new(uid: [u8; 7], code: u8, pages: usize, config_page: u16) -> Self {
        let mut memory = vec![0u8; pages * PAGE_LEN];
        memory[..7].copy_from_slice(&uid);
        memory[12..16].copy_from_slice(&[0xE1, 0x10, code, 0x00]);

        let config = config_page as usize * PAGE_LEN;
        memory[config..config + 8]
            .copy_from_slice(&[0x04, 0x00, 0x00, 0xFF, 0x00, 0x05, 0x00, 0x00]);
        // Factory password is FF FF FF FF
        memory[config + 8..config + 12].copy_from_slice(&[0xFF; 4]);

        Self {
            uid,
            memory,
            vendor_signature: Some([0x3C; 32]),
            config_page,
            authenticated: false,
            writes: 0,
        }
    }

    pub fn ntag213(uid: [u8; 7]) -> Self {
        Self::new(uid, 0x12, 45, 0x29)
    }

    pub fn ntag215(uid: [u8; 7]) -> Self {
        Self::new(uid, 0x3E, 135, 0x83)
    }

    pub fn ntag216(uid: [u8; 7]) -> Self {
        Self::new(uid, 0x6D, 231, 0xE3)
    }

    /// Tag without READ_SIG support
    pub fn without_vendor_signature(mut self) -> Self {
        self.vendor_signature = None;
        self
    }

    /// Take the tag out of the field and present it again
    pub fn represent(&mut self) {
        self.authenticated = false;
    }

    pub fn config(&self) -> [u8; 8] {
        let offset = self.config_page as usize * PAGE_LEN;
        self.memory[offset..offset + 8].try_into().unwrap()
    }

    pub fn auth0(&self) -> u8 {
        self.config()[3]
    }

    fn password(&self) -> &[u8] {
        let offset = (self.config_page as usize + 2) * PAGE_LEN;
        &self.memory[offset..offset + 4]
    }

    fn pack(&self) -> &[u8] {
        let offset = (self.config_page as usize + 3) * PAGE_LEN;
        &self.memory[offset..offset + 2]
    }

    pub fn page_data(&self, page: u16, length: usize) -> &[u8] {
        let offset = page as usize * PAGE_LEN;
        &self.memory[offset..offset + length]
    }

    pub fn page_data_mut(&mut self, page: u16, length: usize) -> &mut [u8] {
        let offset = page as usize * PAGE_LEN;
        &mut self.memory[offset..offset + length]
    }
}

fn tunnelled(status: u8, data: &[u8]) -> Bytes {
    let mut response = vec![0xD5, 0x43, status];
    response.extend_from_slice(data);
    response.extend([0x90, 0x00]);
    response.into()
}

impl TagTransport for NtagSimulator {
    fn uid(&mut self) -> Result<Bytes, TransportError> {
        Ok(Bytes::copy_from_slice(&self.uid))
    }

    fn do_read_pages(&mut self, page: u16, length: u16) -> Result<Bytes, TransportError> {
        let start = page as usize * PAGE_LEN;
        let end = start + length as usize;
        if end > self.memory.len() {
            return Err(TransportError::status_word_bytes(0x6A, 0x82));
        }

        let mut data = self.memory[start..end].to_vec();
        let secret_start = (self.config_page as usize + 2) * PAGE_LEN;
        for (i, byte) in data.iter_mut().enumerate() {
            if (secret_start..secret_start + 2 * PAGE_LEN).contains(&(start + i)) {
                *byte = 0;
            }
        }
        Ok(data.into())
    }

    fn do_write_pages(&mut self, page: u16, data: &[u8]) -> Result<(), TransportError> {
        for (i, chunk) in data.chunks(PAGE_LEN).enumerate() {
            let page = page as usize + i;
            let start = page * PAGE_LEN;
            if start + PAGE_LEN > self.memory.len() {
                return Err(TransportError::status_word_bytes(0x6A, 0x82));
            }
            if page >= self.auth0() as usize && !self.authenticated {
                return Err(TransportError::status_word_bytes(0x63, 0x00));
            }

            let mut padded = [0u8; PAGE_LEN];
            padded[..chunk.len()].copy_from_slice(chunk);
            self.memory[start..start + PAGE_LEN].copy_from_slice(&padded);
            self.writes += 1;
        }
        Ok(())
    }

    fn do_transceive(
        &mut self,
        command: &[u8],
        _response_len: usize,
    ) -> Result<Bytes, TransportError> {
        if command.len() < 8
            || command[..4] != [0xFF, 0x00, 0x00, 0x00]
            || command[5..7] != [0xD4, 0x42]
        {
            return Err(TransportError::status_word_bytes(0x6A, 0x81));
        }

        match (command[7], &command[8..]) {
            (0x3C, [0x00]) => Ok(match self.vendor_signature {
                Some(signature) => tunnelled(0x00, &signature),
                None => tunnelled(0x01, &[]),
            }),
            (0x1B, password) if password == self.password() => {
                self.authenticated = true;
                Ok(tunnelled(0x00, self.pack()))
            }
            (0x1B, _) => Ok(tunnelled(0x01, &[])),
            _ => Err(TransportError::status_word_bytes(0x6A, 0x81)),
        }
    }
}

pub fn key(byte: u8) -> nfc_seal::IssuerKey {
    nfc_seal::IssuerKey::from_slice(&[byte; 32]).unwrap()
}
