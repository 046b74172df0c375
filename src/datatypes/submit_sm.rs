use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::tlv::Tlv;
use crate::datatypes::{Address, CommandId, CommandStatus, DataCoding, EsmClass, PriorityFlag};
use crate::macros::builder_setters;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// 4.1.18 short_message is limited to 254 octets; longer content is segmented.
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;

pub(crate) const SERVICE_TYPE_MAX: usize = 6;
pub(crate) const TIME_MAX: usize = 17;
pub(crate) const MESSAGE_ID_MAX: usize = 65;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME).
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Mandatory parameters
    /// 4.1.1 service_type: SMS application service associated with the message.
    ///       NULL for the SMSC default. Max length: 5 octets (6 with null terminator).
    pub service_type: String,

    /// 4.1.2-4.1.4 source_addr_ton, source_addr_npi, source_addr
    pub source: Address,

    /// 4.1.5-4.1.7 dest_addr_ton, dest_addr_npi, destination_addr
    pub destination: Address,

    /// 4.1.8 esm_class: message mode, message type and GSM features (UDHI).
    pub esm_class: EsmClass,

    /// 4.1.9 protocol_id: Network specific field. Set to NULL if not applicable.
    pub protocol_id: u8,

    /// 4.1.10 priority_flag
    pub priority_flag: PriorityFlag,

    /// 4.1.11 schedule_delivery_time: NULL for immediate delivery.
    pub schedule_delivery_time: String,

    /// 4.1.12 validity_period: NULL for the SMSC default validity period.
    pub validity_period: String,

    /// 4.1.13 registered_delivery: bits 0-1 request an SMSC delivery receipt.
    pub registered_delivery: u8,

    /// 4.1.14 replace_if_present_flag
    pub replace_if_present_flag: u8,

    /// 4.1.15 data_coding: encoding scheme of the short message user data.
    pub data_coding: DataCoding,

    /// 4.1.16 sm_default_msg_id: index of a canned message, 0 if not used.
    pub sm_default_msg_id: u8,

    /// 4.1.18 short_message: up to 254 octets of user data, including any UDH.
    /// sm_length is derived from it when encoding.
    pub short_message: Bytes,

    /// Optional parameters in wire order
    pub tlvs: Vec<Tlv>,
}

impl SubmitSm {
    /// Creates a builder for constructing SubmitSm PDUs
    pub fn builder() -> SubmitSmBuilder {
        SubmitSmBuilder::new()
    }
}

/// Builder for SubmitSm PDUs with sensible defaults
pub struct SubmitSmBuilder {
    sequence_number: u32,
    service_type: String,
    source: Address,
    destination: Address,
    esm_class: EsmClass,
    protocol_id: u8,
    priority_flag: PriorityFlag,
    registered_delivery: u8,
    data_coding: DataCoding,
    short_message: Bytes,
    tlvs: Vec<Tlv>,
}

impl Default for SubmitSmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitSmBuilder {
    pub fn new() -> Self {
        Self {
            sequence_number: 1,
            service_type: String::new(),
            source: Address::default(),
            destination: Address::default(),
            esm_class: EsmClass::default(),
            protocol_id: 0,
            priority_flag: PriorityFlag::Level0,
            registered_delivery: 0,
            data_coding: DataCoding::default(),
            short_message: Bytes::new(),
            tlvs: Vec::new(),
        }
    }

    builder_setters! {
        sequence_number: u32,
        service_type: String,
        source: Address,
        destination: Address,
        esm_class: EsmClass,
        protocol_id: u8,
        priority_flag: PriorityFlag,
        registered_delivery: u8,
        data_coding: DataCoding,
        short_message: Bytes,
        tlvs: Vec<Tlv>,
    }

    pub fn build(self) -> SubmitSm {
        SubmitSm {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            service_type: self.service_type,
            source: self.source,
            destination: self.destination,
            esm_class: self.esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority_flag,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: self.registered_delivery,
            replace_if_present_flag: 0,
            data_coding: self.data_coding,
            sm_default_msg_id: 0,
            short_message: self.short_message,
            tlvs: self.tlvs,
        }
    }
}

/// sm_length followed by the user data.
pub(crate) fn encode_short_message(buf: &mut BytesMut, message: &[u8]) -> Result<(), CodecError> {
    if message.len() > MAX_SHORT_MESSAGE_LENGTH {
        return Err(CodecError::FieldValidation {
            field: "short_message",
            reason: format!(
                "{} octets exceeds maximum of {}",
                message.len(),
                MAX_SHORT_MESSAGE_LENGTH
            ),
        });
    }
    buf.put_u8(message.len() as u8);
    buf.put_slice(message);
    Ok(())
}

pub(crate) fn decode_short_message(buf: &mut Cursor<&[u8]>) -> Result<Bytes, CodecError> {
    let sm_length = decode_u8(buf)? as usize;
    if buf.remaining() < sm_length {
        return Err(CodecError::FieldValidation {
            field: "short_message",
            reason: format!(
                "sm_length {sm_length} exceeds remaining {} octets",
                buf.remaining()
            ),
        });
    }
    Ok(buf.copy_to_bytes(sm_length))
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(CommandId::SubmitSm, CommandStatus::Ok, self.sequence_number).encode(buf);

        encode_cstring(buf, &self.service_type, SERVICE_TYPE_MAX, "service_type")?;
        self.source.encode(buf, "source_addr")?;
        self.destination.encode(buf, "destination_addr")?;
        buf.put_u8(self.esm_class.to_byte());
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag as u8);
        encode_cstring(
            buf,
            &self.schedule_delivery_time,
            TIME_MAX,
            "schedule_delivery_time",
        )?;
        encode_cstring(buf, &self.validity_period, TIME_MAX, "validity_period")?;
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        buf.put_u8(self.data_coding.to_byte());
        buf.put_u8(self.sm_default_msg_id);
        encode_short_message(buf, &self.short_message)?;

        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for SubmitSm {
    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let service_type = decode_cstring(buf, SERVICE_TYPE_MAX, "service_type")?;
        let source = Address::decode(buf, "source_addr")?;
        let destination = Address::decode(buf, "destination_addr")?;
        let esm_class = EsmClass::from_byte(decode_u8(buf)?);
        let protocol_id = decode_u8(buf)?;
        let priority_flag = PriorityFlag::try_from(decode_u8(buf)?).unwrap_or_default();
        let schedule_delivery_time = decode_cstring(buf, TIME_MAX, "schedule_delivery_time")?;
        let validity_period = decode_cstring(buf, TIME_MAX, "validity_period")?;
        let registered_delivery = decode_u8(buf)?;
        let replace_if_present_flag = decode_u8(buf)?;
        let data_coding = DataCoding::from_byte(decode_u8(buf)?);
        let sm_default_msg_id = decode_u8(buf)?;
        let short_message = decode_short_message(buf)?;
        let tlvs = Tlv::decode_all(buf)?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type,
            source,
            destination,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}

/// submit_sm_resp (4.4.2). The message_id is the SMSC's handle for the accepted message.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // body
    pub message_id: String,
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, command_status: CommandStatus, message_id: &str) -> Self {
        Self {
            command_status,
            sequence_number,
            message_id: message_id.to_string(),
        }
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            CommandId::SubmitSmResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        encode_cstring(buf, &self.message_id, MESSAGE_ID_MAX, "message_id")
    }
}

impl Decodable for SubmitSmResponse {
    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        // The body is omitted when command_status is non-zero
        let message_id = if buf.has_remaining() {
            decode_cstring(buf, MESSAGE_ID_MAX, "message_id")?
        } else {
            String::new()
        };

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}
