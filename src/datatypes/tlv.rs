use crate::codec::{CodecError, decode_u16};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Optional parameter tags this client recognises by name. Everything else is carried opaquely.
pub mod tags {
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const MESSAGE_STATE: u16 = 0x0427;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tlv {
    /// The Tag field is used to uniquely identify the particular optional parameter in question.
    pub tag: u16,

    /// The Value field contains the actual data for the optional parameter in question.
    /// Its length is written as the Length field on the wire.
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len()).map_err(|_| {
            CodecError::TlvError(format!(
                "value of tag {:#06x} is {} octets",
                self.tag,
                self.value.len()
            ))
        })?;

        buf.put_u16(self.tag);
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let tag = decode_u16(buf)?;
        let length = decode_u16(buf)? as usize;

        if buf.remaining() < length {
            return Err(CodecError::TlvError(format!(
                "tag {tag:#06x} declares {length} octets, {} remain",
                buf.remaining()
            )));
        }

        Ok(Self {
            tag,
            value: buf.copy_to_bytes(length),
        })
    }

    /// Decode every TLV up to the end of the PDU.
    pub fn decode_all(buf: &mut Cursor<&[u8]>) -> Result<Vec<Self>, CodecError> {
        let mut tlvs = Vec::new();
        while buf.has_remaining() {
            tlvs.push(Self::decode(buf)?);
        }
        Ok(tlvs)
    }

    /// The value as a NUL-terminated string, e.g. receipted_message_id.
    pub fn value_as_cstring(&self) -> Option<String> {
        let end = self
            .value
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.value.len());
        String::from_utf8(self.value[..end].to_vec()).ok()
    }
}
