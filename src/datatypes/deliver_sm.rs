use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::submit_sm::{
    MESSAGE_ID_MAX, SERVICE_TYPE_MAX, TIME_MAX, decode_short_message, encode_short_message,
};
use crate::datatypes::tlv::{Tlv, tags};
use crate::datatypes::{Address, CommandId, CommandStatus, DataCoding, EsmClass, PriorityFlag};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// This operation is used by the SMSC to deliver a short message to an ESME.
/// The deliver_sm PDU carries both mobile originated messages and delivery
/// receipts; `esm_class` tells them apart.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Mandatory parameters
    /// 4.6.1 service_type
    pub service_type: String,

    /// Originating handset of an MO message, or the recipient of the original MT for a receipt
    pub source: Address,

    pub destination: Address,

    /// Message type bits 5-2 select MO vs. the kind of delivery report
    pub esm_class: EsmClass,

    pub protocol_id: u8,
    pub priority_flag: PriorityFlag,

    /// NULL on deliver_sm
    pub schedule_delivery_time: String,

    /// NULL on deliver_sm
    pub validity_period: String,

    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,

    /// MO text, or the receipt text (`id:... stat:...`) for delivery reports
    pub short_message: Bytes,

    pub tlvs: Vec<Tlv>,
}

impl DeliverSm {
    /// A deliver_sm with NULL/default options around the given addressing and payload.
    pub fn new(
        sequence_number: u32,
        source: Address,
        destination: Address,
        esm_class: EsmClass,
        short_message: Bytes,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            service_type: String::new(),
            source,
            destination,
            esm_class,
            protocol_id: 0,
            priority_flag: PriorityFlag::Level0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            replace_if_present_flag: 0,
            data_coding: DataCoding::default(),
            sm_default_msg_id: 0,
            short_message,
            tlvs: Vec::new(),
        }
    }

    /// The SMSC message id a delivery receipt refers to, from the receipted_message_id TLV.
    pub fn receipted_message_id(&self) -> Option<String> {
        self.tlvs
            .iter()
            .find(|tlv| tlv.tag == tags::RECEIPTED_MESSAGE_ID)
            .and_then(Tlv::value_as_cstring)
    }
}

impl Encodable for DeliverSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(CommandId::DeliverSm, CommandStatus::Ok, self.sequence_number).encode(buf);

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

impl Decodable for DeliverSm {
    fn command_id() -> CommandId {
        CommandId::DeliverSm
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

/// The deliver_sm_resp PDU is used to provide a response to the deliver_sm request.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Body
    /// 4.6.2 message_id: Set to NULL. Not used for deliver_sm_resp.
    pub message_id: String,
}

impl DeliverSmResponse {
    pub fn new(sequence_number: u32, command_status: CommandStatus) -> Self {
        Self {
            command_status,
            sequence_number,
            message_id: String::new(),
        }
    }
}

impl Encodable for DeliverSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            CommandId::DeliverSmResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        encode_cstring(buf, &self.message_id, MESSAGE_ID_MAX, "message_id")
    }
}

impl Decodable for DeliverSmResponse {
    fn command_id() -> CommandId {
        CommandId::DeliverSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

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
