//! Reader pseudo-APDUs for Type 2 tag memory
//!
//! ```text
//! GET DATA       FF CA 00 00 00
//! READ BINARY    FF B0 00 <page> <len>
//! UPDATE BINARY  FF D6 00 <page> 04 <4 bytes>
//! ```
//!
//! Every answer ends with a status word; `90 00` is success.

use bytes::{BufMut, Bytes, BytesMut};

use crate::PcscError;

/// Bytes per page
pub const PAGE_LEN: usize = 4;
/// Most bytes a single READ BINARY returns
pub const MAX_READ_LEN: usize = 16;

const CLA: u8 = 0xFF;
const INS_GET_DATA: u8 = 0xCA;
const INS_READ_BINARY: u8 = 0xB0;
const INS_UPDATE_BINARY: u8 = 0xD6;

/// GET DATA for the UID of the tag in the field
pub const fn get_uid() -> [u8; 5] {
    [CLA, INS_GET_DATA, 0x00, 0x00, 0x00]
}

/// READ BINARY of `length` bytes (at most [`MAX_READ_LEN`]) from `page`
pub const fn read_binary(page: u8, length: u8) -> [u8; 5] {
    [CLA, INS_READ_BINARY, 0x00, page, length]
}

/// UPDATE BINARY of one page, zero padding a short `data`
pub fn update_binary(page: u8, data: &[u8]) -> Bytes {
    let mut buffer = BytesMut::with_capacity(5 + PAGE_LEN);
    buffer.put_slice(&[CLA, INS_UPDATE_BINARY, 0x00, page, PAGE_LEN as u8]);

    let mut padded = [0u8; PAGE_LEN];
    let len = data.len().min(PAGE_LEN);
    padded[..len].copy_from_slice(&data[..len]);
    buffer.put_slice(&padded);

    buffer.freeze()
}

/// Strip a trailing `90 00`, failing on any other status word
pub fn check_status(response: &[u8]) -> Result<&[u8], PcscError> {
    let Some((data, sw)) = response.split_last_chunk::<2>() else {
        return Err(PcscError::ShortRead {
            expected: 2,
            actual: response.len(),
        });
    };

    match *sw {
        [0x90, 0x00] => Ok(data),
        [sw1, sw2] => Err(PcscError::StatusWord(u16::from_be_bytes([sw1, sw2]))),
    }
}

/// Page numbers on these tags fit a single P2 byte
pub fn page_byte(page: usize) -> Result<u8, PcscError> {
    u8::try_from(page).map_err(|_| PcscError::Other(format!("page {page} out of range")))
}
