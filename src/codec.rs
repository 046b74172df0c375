// SMPP v3.4 Codec - Separates parsing/encoding logic from domain models
//
// Each PDU implements Encodable/Decodable; the PduRegistry maps a decoded header
// to the decoder of the matching PDU so that the session never touches field layouts.

use crate::datatypes::{
    BindTransceiver, BindTransceiverResponse, CommandId, CommandStatus, DeliverSm,
    DeliverSmResponse, EnquireLink, EnquireLinkResponse, GenericNack, SubmitMulti,
    SubmitMultiResponse, SubmitSm, SubmitSmResponse, Unbind, UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Default upper bound on a declared command_length.
pub const MAX_PDU_SIZE: usize = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Header for an outbound PDU. command_length is patched by `Encodable::to_bytes`.
    pub fn new(command_id: CommandId, command_status: CommandStatus, sequence_number: u32) -> Self {
        Self {
            command_length: 0,
            command_id,
            command_status,
            sequence_number,
        }
    }

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_status = CommandStatus::from(buf.get_u32());
        let sequence_number = buf.get_u32();

        if (command_length as usize) < Self::SIZE {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
            });
        }

        let command_id =
            CommandId::try_from(command_id_raw).map_err(|_| CodecError::InvalidCommandId {
                command_id: command_id_raw,
                sequence_number,
            })?;

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status.code());
        buf.put_u32(self.sequence_number);
    }
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode the complete PDU, header included, into the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Encode into a fresh buffer and fix the command_length field.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;

        let length = buf.len() as u32;
        buf[0..4].copy_from_slice(&length.to_be_bytes());

        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Sized {
    /// Decode this PDU from the buffer after header
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// Return the expected command_id for this PDU type
    fn command_id() -> CommandId;

    /// Validate the header is appropriate for this PDU type
    fn validate_header(header: &PduHeader) -> Result<(), CodecError> {
        if header.command_id != Self::command_id() {
            return Err(CodecError::UnexpectedCommandId {
                expected: Self::command_id(),
                actual: header.command_id,
            });
        }
        Ok(())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid command_id: {command_id:#x} (sequence {sequence_number})")]
    InvalidCommandId {
        command_id: u32,
        sequence_number: u32,
    },

    #[error("Invalid PDU length: {length}, must be at least {min}")]
    InvalidPduLength { length: u32, min: u32 },

    #[error("Unexpected command_id: expected {expected:?}, got {actual:?}")]
    UnexpectedCommandId {
        expected: CommandId,
        actual: CommandId,
    },

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Convert codec errors to appropriate SMPP command_status codes
impl CodecError {
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::InvalidPduLength { .. } => CommandStatus::InvalidCommandLength,
            CodecError::InvalidCommandId { .. } => CommandStatus::InvalidCommandId,
            CodecError::FieldValidation { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" => CommandStatus::InvalidMsgLength,
                "esm_class" => CommandStatus::InvalidEsmClassFieldData,
                _ => CommandStatus::SystemError,
            },
            _ => CommandStatus::SystemError,
        }
    }
}

/// Decode a C-Octet String: at most `max_len` octets including the NUL terminator.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field_name: &'static str,
) -> Result<String, CodecError> {
    let chunk = buf.chunk();
    let window = &chunk[..chunk.len().min(max_len)];

    let end = match window.iter().position(|&b| b == 0) {
        Some(end) => end,
        None if chunk.len() < max_len => return Err(CodecError::Incomplete),
        None => {
            return Err(CodecError::FieldValidation {
                field: field_name,
                reason: format!("missing NUL terminator within {max_len} octets"),
            });
        }
    };

    let value = window[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|e| CodecError::Utf8Error {
        field: field_name,
        source: e,
    })
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Decode a 32-bit big-endian integer
pub fn decode_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Encode a C-Octet String; `max_len` counts the NUL terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    let bytes = value.as_bytes();
    if bytes.len() >= max_len {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {}", bytes.len(), max_len - 1),
        });
    }
    if bytes.contains(&0) {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: "embedded NUL".to_string(),
        });
    }

    buf.put_slice(bytes);
    buf.put_u8(0);
    Ok(())
}

/// Every PDU a transceiver session sends or receives
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    // Bind PDUs
    BindTransceiver(BindTransceiver),
    BindTransceiverResp(BindTransceiverResponse),

    // Session management PDUs
    Unbind(Unbind),
    UnbindResp(UnbindResponse),

    // Keep-alive PDUs
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),

    // Message PDUs
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    SubmitMulti(Box<SubmitMulti>),
    SubmitMultiResp(SubmitMultiResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),

    GenericNack(GenericNack),
}

/// Registry of PDU decoders for extensible parsing
type DecoderFn =
    Box<dyn Fn(PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

impl PduRegistry {
    /// Create a new registry with every transceiver PDU registered
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        registry.register_pdu::<BindTransceiver, _>(Frame::BindTransceiver);
        registry.register_pdu::<BindTransceiverResponse, _>(Frame::BindTransceiverResp);
        registry.register_pdu::<Unbind, _>(Frame::Unbind);
        registry.register_pdu::<UnbindResponse, _>(Frame::UnbindResp);
        registry.register_pdu::<EnquireLink, _>(Frame::EnquireLink);
        registry.register_pdu::<EnquireLinkResponse, _>(Frame::EnquireLinkResp);
        registry.register_pdu::<GenericNack, _>(Frame::GenericNack);

        // Large message bodies are boxed
        registry.register_pdu::<SubmitSm, _>(|pdu| Frame::SubmitSm(Box::new(pdu)));
        registry.register_pdu::<SubmitSmResponse, _>(Frame::SubmitSmResp);
        registry.register_pdu::<SubmitMulti, _>(|pdu| Frame::SubmitMulti(Box::new(pdu)));
        registry.register_pdu::<SubmitMultiResponse, _>(Frame::SubmitMultiResp);
        registry.register_pdu::<DeliverSm, _>(|pdu| Frame::DeliverSm(Box::new(pdu)));
        registry.register_pdu::<DeliverSmResponse, _>(Frame::DeliverSmResp);

        registry
    }

    fn register_pdu<T, F>(&mut self, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Send + Sync + 'static,
    {
        let command_id = T::command_id();
        let decoder = Box::new(move |header: PduHeader, buf: &mut Cursor<&[u8]>| {
            let pdu = T::decode(header, buf)?;
            Ok(frame_constructor(pdu))
        });
        self.decoders.insert(command_id, decoder);
    }

    /// Decode a PDU given its header and body
    pub fn decode_pdu(
        &self,
        header: PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Frame, CodecError> {
        match self.decoders.get(&header.command_id) {
            Some(decoder) => decoder(header, buf),
            None => Err(CodecError::InvalidCommandId {
                command_id: header.command_id as u32,
                sequence_number: header.sequence_number,
            }),
        }
    }

    /// Decode one complete frame (length prefix included).
    pub fn decode_frame(&self, frame: &[u8]) -> Result<Frame, CodecError> {
        let mut cursor = Cursor::new(frame);
        let header = PduHeader::decode(&mut cursor)?;
        self.decode_pdu(header, &mut cursor)
    }

    /// Check if a command_id is registered
    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Get the command_id for this frame
    pub fn command_id(&self) -> CommandId {
        match self {
            Frame::BindTransceiver(_) => CommandId::BindTransceiver,
            Frame::BindTransceiverResp(_) => CommandId::BindTransceiverResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::SubmitMulti(_) => CommandId::SubmitMulti,
            Frame::SubmitMultiResp(_) => CommandId::SubmitMultiResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
        }
    }

    /// Get the sequence number for this frame
    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::BindTransceiver(pdu) => pdu.sequence_number,
            Frame::BindTransceiverResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::SubmitMulti(pdu) => pdu.sequence_number,
            Frame::SubmitMultiResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
        }
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }
}

impl Encodable for Frame {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Frame::BindTransceiver(pdu) => pdu.encode(buf),
            Frame::BindTransceiverResp(pdu) => pdu.encode(buf),
            Frame::Unbind(pdu) => pdu.encode(buf),
            Frame::UnbindResp(pdu) => pdu.encode(buf),
            Frame::EnquireLink(pdu) => pdu.encode(buf),
            Frame::EnquireLinkResp(pdu) => pdu.encode(buf),
            Frame::SubmitSm(pdu) => pdu.encode(buf),
            Frame::SubmitSmResp(pdu) => pdu.encode(buf),
            Frame::SubmitMulti(pdu) => pdu.encode(buf),
            Frame::SubmitMultiResp(pdu) => pdu.encode(buf),
            Frame::DeliverSm(pdu) => pdu.encode(buf),
            Frame::DeliverSmResp(pdu) => pdu.encode(buf),
            Frame::GenericNack(pdu) => pdu.encode(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu_header_encode_decode() {
        let header = PduHeader {
            command_length: 16,
            command_id: CommandId::EnquireLink,
            command_status: CommandStatus::Ok,
            sequence_number: 42,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn decode_cstring_variable_length() {
        let data = b"hello\0world\0";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(decode_cstring(&mut cursor, 16, "a").unwrap(), "hello");
        assert_eq!(cursor.position(), 6);
        assert_eq!(decode_cstring(&mut cursor, 16, "b").unwrap(), "world");
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn decode_cstring_empty_is_single_nul() {
        let data = [0u8, 0x34];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(decode_cstring(&mut cursor, 6, "service_type").unwrap(), "");
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn decode_cstring_rejects_overlong_field() {
        let data = b"abcdefgh\0";
        let mut cursor = Cursor::new(&data[..]);
        let result = decode_cstring(&mut cursor, 6, "service_type");
        assert!(matches!(
            result,
            Err(CodecError::FieldValidation {
                field: "service_type",
                ..
            })
        ));
    }

    #[test]
    fn encode_cstring_is_nul_terminated_without_padding() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "hello", 16, "system_id").unwrap();
        assert_eq!(buf.as_ref(), b"hello\0");

        let mut buf = BytesMut::new();
        assert!(encode_cstring(&mut buf, "0123456789abcdef", 16, "system_id").is_err());
    }

    #[test]
    fn pdu_header_rejects_short_length() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x08, // command_length too small
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let mut cursor = Cursor::new(data);

        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::InvalidPduLength { .. })));
    }

    #[test]
    fn unknown_command_id_keeps_sequence_number() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x02, // bind_transmitter
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x07, // sequence_number
        ];

        let result = PduRegistry::new().decode_frame(data);
        match result {
            Err(err @ CodecError::InvalidCommandId { .. }) => {
                assert_eq!(err.to_command_status(), CommandStatus::InvalidCommandId);
                assert!(matches!(
                    err,
                    CodecError::InvalidCommandId {
                        command_id: 2,
                        sequence_number: 7
                    }
                ));
            }
            other => panic!("Expected InvalidCommandId, got {other:?}"),
        }
    }

    #[test]
    fn registry_decodes_header_only_pdus() {
        let registry = PduRegistry::new();

        let bytes = EnquireLink::new(1).to_bytes().unwrap();
        assert_eq!(
            registry.decode_frame(&bytes).unwrap(),
            Frame::EnquireLink(EnquireLink::new(1))
        );

        let bytes = Unbind::new(2).to_bytes().unwrap();
        assert!(matches!(
            registry.decode_frame(&bytes).unwrap(),
            Frame::Unbind(_)
        ));

        let bytes = GenericNack::invalid_command_id(3).to_bytes().unwrap();
        let frame = registry.decode_frame(&bytes).unwrap();
        assert_eq!(frame.command_id(), CommandId::GenericNack);
        assert_eq!(frame.sequence_number(), 3);
        assert!(frame.is_response());
    }

    #[test]
    fn registry_has_every_transceiver_pdu() {
        let registry = PduRegistry::new();
        for id in [
            CommandId::BindTransceiver,
            CommandId::BindTransceiverResp,
            CommandId::Unbind,
            CommandId::UnbindResp,
            CommandId::EnquireLink,
            CommandId::EnquireLinkResp,
            CommandId::SubmitSm,
            CommandId::SubmitSmResp,
            CommandId::SubmitMulti,
            CommandId::SubmitMultiResp,
            CommandId::DeliverSm,
            CommandId::DeliverSmResp,
            CommandId::GenericNack,
        ] {
            assert!(registry.is_registered(id), "{id:?} not registered");
        }
    }

    #[test]
    fn to_bytes_fixes_command_length() {
        let frame = Frame::EnquireLinkResp(EnquireLinkResponse::new(9));
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x00, 0x10]);
        assert_eq!(bytes.len(), 16);
    }
}
