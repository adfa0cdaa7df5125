//! Minimal NDEF record codec and the Type 2 Tag TLV framing around it
//!
//! Only what a seal needs: one record per message, short or normal payload
//! length, optional id. Chunked records are rejected.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, FormatError, Result};

/// NDEF message TLV tag
pub const TLV_NDEF: u8 = 0x03;
/// NULL TLV tag
pub const TLV_NULL: u8 = 0x00;
/// Terminator TLV tag
pub const TLV_TERMINATOR: u8 = 0xFE;
/// Largest NDEF message that fits the one byte TLV length form
pub const TLV_MAX_SHORT_LEN: usize = 254;

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Type Name Format of an NDEF record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tnf {
    /// Empty record
    Empty = 0x00,
    /// NFC Forum well-known type
    WellKnown = 0x01,
    /// RFC 2046 media type
    Media = 0x02,
    /// Absolute URI
    AbsoluteUri = 0x03,
    /// NFC Forum external type
    External = 0x04,
    /// Unknown type, no type field
    Unknown = 0x05,
    /// Unchanged (middle and last chunks)
    Unchanged = 0x06,
    /// Reserved
    Reserved = 0x07,
}

impl From<u8> for Tnf {
    fn from(value: u8) -> Self {
        match value & TNF_MASK {
            0x00 => Self::Empty,
            0x01 => Self::WellKnown,
            0x02 => Self::Media,
            0x03 => Self::AbsoluteUri,
            0x04 => Self::External,
            0x05 => Self::Unknown,
            0x06 => Self::Unchanged,
            _ => Self::Reserved,
        }
    }
}

/// A single NDEF record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    /// Type name format
    pub tnf: Tnf,
    /// Record type
    pub record_type: Bytes,
    /// Record id
    pub id: Bytes,
    /// Payload
    pub payload: Bytes,
}

impl NdefRecord {
    /// Create a record of unknown type, the generic record type used by seals
    pub fn unknown(id: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            tnf: Tnf::Unknown,
            record_type: Bytes::new(),
            id: id.into(),
            payload: payload.into(),
        }
    }

    /// Serialize as the only record of a message
    pub fn to_bytes(&self) -> Bytes {
        let short = self.payload.len() <= u8::MAX as usize;
        let has_id = !self.id.is_empty();

        let mut header = FLAG_MB | FLAG_ME | self.tnf as u8;
        if short {
            header |= FLAG_SR;
        }
        if has_id {
            header |= FLAG_IL;
        }

        let mut buffer = BytesMut::with_capacity(
            6 + self.record_type.len() + self.id.len() + self.payload.len(),
        );
        buffer.put_u8(header);
        buffer.put_u8(self.record_type.len() as u8);
        if short {
            buffer.put_u8(self.payload.len() as u8);
        } else {
            buffer.put_u32(self.payload.len() as u32);
        }
        if has_id {
            buffer.put_u8(self.id.len() as u8);
        }
        buffer.put_slice(&self.record_type);
        buffer.put_slice(&self.id);
        buffer.put_slice(&self.payload);

        buffer.freeze()
    }

    /// Parse the first record of an NDEF message
    pub fn parse(message: &[u8]) -> Result<Self> {
        let mut buf = message;

        let header = take_u8(&mut buf)?;
        if header & FLAG_MB == 0 {
            return Err(FormatError::MalformedRecord("first record lacks message begin flag").into());
        }
        if header & FLAG_CF != 0 {
            return Err(FormatError::MalformedRecord("chunked records are not supported").into());
        }

        let type_len = take_u8(&mut buf)? as usize;
        let payload_len = if header & FLAG_SR != 0 {
            take_u8(&mut buf)? as usize
        } else {
            need(buf, 4)?;
            buf.get_u32() as usize
        };
        let id_len = if header & FLAG_IL != 0 {
            take_u8(&mut buf)? as usize
        } else {
            0
        };

        let record_type = take(&mut buf, type_len)?;
        let id = take(&mut buf, id_len)?;
        let payload = take(&mut buf, payload_len)?;

        Ok(Self {
            tnf: Tnf::from(header),
            record_type,
            id,
            payload,
        })
    }
}

/// Frame an NDEF message as a TLV block padded to whole 4-byte pages
///
/// ```text
/// 03 <len> <message> FE 00..
/// ```
pub fn wrap_tlv(message: &[u8]) -> Result<Bytes> {
    if message.len() > TLV_MAX_SHORT_LEN {
        return Err(Error::RecordTooLarge(message.len()));
    }

    let framed_len = 2 + message.len() + 1;
    let padded_len = framed_len.div_ceil(4) * 4;

    let mut buffer = BytesMut::with_capacity(padded_len);
    buffer.put_u8(TLV_NDEF);
    buffer.put_u8(message.len() as u8);
    buffer.put_slice(message);
    buffer.put_u8(TLV_TERMINATOR);
    buffer.resize(padded_len, 0);

    Ok(buffer.freeze())
}

/// Locate the NDEF message in a block of tag memory
///
/// A blank area (NULL TLV, terminator, or an empty NDEF message) is [`Error::NoLabel`].
pub fn unwrap_tlv(data: &[u8]) -> Result<&[u8]> {
    let tag = *data.first().ok_or(Error::NoLabel)?;
    match tag {
        TLV_NDEF => {}
        TLV_NULL | TLV_TERMINATOR => return Err(Error::NoLabel),
        other => return Err(FormatError::UnexpectedTlv(other).into()),
    }

    let len = *data.get(1).ok_or(FormatError::Truncated {
        needed: 2,
        available: data.len(),
    })?;
    if len == 0xFF {
        return Err(FormatError::ExtendedLength.into());
    }
    if len == 0 {
        return Err(Error::NoLabel);
    }

    let len = len as usize;
    let terminator = *data.get(2 + len).ok_or(FormatError::Truncated {
        needed: 3 + len,
        available: data.len(),
    })?;
    if terminator != TLV_TERMINATOR {
        return Err(FormatError::MissingTerminator(terminator).into());
    }

    Ok(&data[2..2 + len])
}

fn need(buf: &[u8], len: usize) -> Result<()> {
    if buf.len() < len {
        return Err(FormatError::MalformedRecord("record shorter than its header declares").into());
    }
    Ok(())
}

fn take_u8(buf: &mut &[u8]) -> Result<u8> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn take(buf: &mut &[u8], len: usize) -> Result<Bytes> {
    need(buf, len)?;
    let out = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(len);
    Ok(out)
}
