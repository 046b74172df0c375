use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, decode_u32,
    encode_cstring,
};
use crate::datatypes::submit_sm::{
    MESSAGE_ID_MAX, SERVICE_TYPE_MAX, TIME_MAX, decode_short_message, encode_short_message,
};
use crate::datatypes::tlv::Tlv;
use crate::datatypes::{Address, CommandId, CommandStatus, DataCoding, EsmClass, PriorityFlag};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// SMPP v3.4 destination address types for submit_multi
#[derive(Clone, Debug, PartialEq)]
pub enum DestinationAddress {
    /// dest_flag 1: an SME address
    SmeAddress(Address),
    /// dest_flag 2: a distribution list held on the SMSC
    DistributionList(String),
}

impl DestinationAddress {
    const SME_ADDRESS: u8 = 1;
    const DISTRIBUTION_LIST: u8 = 2;
    const DL_NAME_MAX: usize = 21;

    pub fn dest_flag(&self) -> u8 {
        match self {
            DestinationAddress::SmeAddress(_) => Self::SME_ADDRESS,
            DestinationAddress::DistributionList(_) => Self::DISTRIBUTION_LIST,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(self.dest_flag());
        match self {
            DestinationAddress::SmeAddress(address) => address.encode(buf, "destination_addr"),
            DestinationAddress::DistributionList(dl_name) => {
                encode_cstring(buf, dl_name, Self::DL_NAME_MAX, "dl_name")
            }
        }
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        match decode_u8(buf)? {
            Self::SME_ADDRESS => Ok(DestinationAddress::SmeAddress(Address::decode(
                buf,
                "destination_addr",
            )?)),
            Self::DISTRIBUTION_LIST => Ok(DestinationAddress::DistributionList(decode_cstring(
                buf,
                Self::DL_NAME_MAX,
                "dl_name",
            )?)),
            dest_flag => Err(CodecError::FieldValidation {
                field: "dest_flag",
                reason: format!("Invalid destination flag: {dest_flag}, expected 1 or 2"),
            }),
        }
    }
}

impl From<Address> for DestinationAddress {
    fn from(address: Address) -> Self {
        DestinationAddress::SmeAddress(address)
    }
}

/// SMPP v3.4 submit_multi PDU (Section 4.5.1)
///
/// Submits one short message to up to 254 destinations. The body matches submit_sm except
/// that the single destination is replaced by `number_of_dests` followed by the list.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitMulti {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    pub service_type: String,
    pub source: Address,
    pub destinations: Vec<DestinationAddress>,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: PriorityFlag,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,
    pub tlvs: Vec<Tlv>,
}

impl SubmitMulti {
    pub const MAX_DESTINATIONS: usize = 254;

    /// A submit_multi with default options for every field but the addressing and payload.
    pub fn new(
        sequence_number: u32,
        source: Address,
        destinations: Vec<DestinationAddress>,
        short_message: Bytes,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            service_type: String::new(),
            source,
            destinations,
            esm_class: EsmClass::default(),
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
}

impl Encodable for SubmitMulti {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.destinations.is_empty() || self.destinations.len() > Self::MAX_DESTINATIONS {
            return Err(CodecError::FieldValidation {
                field: "number_of_dests",
                reason: format!(
                    "{} destinations, must be 1-{}",
                    self.destinations.len(),
                    Self::MAX_DESTINATIONS
                ),
            });
        }

        PduHeader::new(CommandId::SubmitMulti, CommandStatus::Ok, self.sequence_number)
            .encode(buf);

        encode_cstring(buf, &self.service_type, SERVICE_TYPE_MAX, "service_type")?;
        self.source.encode(buf, "source_addr")?;
        buf.put_u8(self.destinations.len() as u8);
        for destination in &self.destinations {
            destination.encode(buf)?;
        }
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

impl Decodable for SubmitMulti {
    fn command_id() -> CommandId {
        CommandId::SubmitMulti
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let service_type = decode_cstring(buf, SERVICE_TYPE_MAX, "service_type")?;
        let source = Address::decode(buf, "source_addr")?;
        let number_of_dests = decode_u8(buf)?;
        let destinations = (0..number_of_dests)
            .map(|_| DestinationAddress::decode(buf))
            .collect::<Result<Vec<_>, _>>()?;

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
            destinations,
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

/// A destination the SMSC refused, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsuccessSmeAddress {
    pub address: Address,
    pub error_status_code: CommandStatus,
}

impl UnsuccessSmeAddress {
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.address.encode(buf, "destination_addr")?;
        buf.put_u32(self.error_status_code.code());
        Ok(())
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let address = Address::decode(buf, "destination_addr")?;
        let error_status_code = CommandStatus::from(decode_u32(buf)?);
        Ok(Self {
            address,
            error_status_code,
        })
    }
}

/// SMPP v3.4 submit_multi_resp PDU (Section 4.5.2)
///
/// A non-empty `unsuccess_sme` list means the message was accepted for the other
/// destinations only.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitMultiResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    pub message_id: String,
    pub unsuccess_sme: Vec<UnsuccessSmeAddress>,
}

impl SubmitMultiResponse {
    pub fn new(sequence_number: u32, command_status: CommandStatus, message_id: &str) -> Self {
        Self {
            command_status,
            sequence_number,
            message_id: message_id.to_string(),
            unsuccess_sme: Vec::new(),
        }
    }
}

impl Encodable for SubmitMultiResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let no_unsuccess = u8::try_from(self.unsuccess_sme.len()).map_err(|_| {
            CodecError::FieldValidation {
                field: "no_unsuccess",
                reason: format!("{} unsuccessful addresses", self.unsuccess_sme.len()),
            }
        })?;

        PduHeader::new(
            CommandId::SubmitMultiResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        encode_cstring(buf, &self.message_id, MESSAGE_ID_MAX, "message_id")?;
        buf.put_u8(no_unsuccess);
        for unsuccess in &self.unsuccess_sme {
            unsuccess.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for SubmitMultiResponse {
    fn command_id() -> CommandId {
        CommandId::SubmitMultiResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        if !buf.has_remaining() {
            return Ok(Self::new(
                header.sequence_number,
                header.command_status,
                "",
            ));
        }

        let message_id = decode_cstring(buf, MESSAGE_ID_MAX, "message_id")?;
        let no_unsuccess = if buf.has_remaining() {
            decode_u8(buf)?
        } else {
            0
        };
        let unsuccess_sme = (0..no_unsuccess)
            .map(|_| UnsuccessSmeAddress::decode(buf))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            unsuccess_sme,
        })
    }
}
