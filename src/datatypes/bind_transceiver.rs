use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::tlv::Tlv;
use crate::datatypes::{CommandId, CommandStatus, NumericPlanIndicator, TypeOfNumber};
use crate::macros::builder_setters;
use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;

/// SMPP protocol version carried in bind requests and the `sc_interface_version` TLV.
#[derive(TryFromPrimitive, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum InterfaceVersion {
    SmppV33 = 0x33,
    #[default]
    SmppV34 = 0x34,
}

/// BindTransceiver is used to bind a transceiver ESME to the SMSC.
/// A transceiver ESME can both send and receive messages through a single connection.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiver {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Body
    /// 5.2.1 system_id: identification of the ESME requesting to bind, up to
    ///       15 characters.
    pub system_id: String,

    /// 5.2.2 password: up to 8 characters. An empty password is sent as a
    ///       single NULL octet.
    pub password: String,

    /// 5.2.3 system_type: categorizes the type of ESME binding to the SMSC,
    ///       up to 12 characters (e.g. "VMS", "OTA").
    pub system_type: String,

    /// 5.2.4 interface_version: Interface version level supported by the ESME.
    pub interface_version: InterfaceVersion,

    /// 5.2.5 addr_ton: Type of Number format of the ESME address(es) served
    ///       via this SMPP.
    pub addr_ton: TypeOfNumber,

    /// 5.2.6 addr_npi: Numbering Plan Indicator of the ESME address(es) served
    ///       via this SMPP.
    pub addr_npi: NumericPlanIndicator,

    /// 5.2.7 address_range: range of SME addresses serviced by the ESME, up
    ///       to 40 characters.
    pub address_range: String,
}

impl BindTransceiver {
    pub const SYSTEM_ID_MAX: usize = 16;
    pub const PASSWORD_MAX: usize = 9;
    pub const SYSTEM_TYPE_MAX: usize = 13;
    pub const ADDRESS_RANGE_MAX: usize = 41;

    /// Creates a builder for constructing BindTransceiver PDUs
    pub fn builder() -> BindTransceiverBuilder {
        BindTransceiverBuilder::new()
    }
}

/// Builder for BindTransceiver PDUs with sensible defaults
pub struct BindTransceiverBuilder {
    sequence_number: u32,
    system_id: String,
    password: String,
    system_type: String,
    interface_version: InterfaceVersion,
    addr_ton: TypeOfNumber,
    addr_npi: NumericPlanIndicator,
    address_range: String,
}

impl Default for BindTransceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BindTransceiverBuilder {
    pub fn new() -> Self {
        Self {
            sequence_number: 1,
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        }
    }

    builder_setters! {
        sequence_number: u32,
        interface_version: InterfaceVersion,
        addr_ton: TypeOfNumber,
        addr_npi: NumericPlanIndicator,
    }

    pub fn system_id(mut self, system_id: &str) -> Self {
        self.system_id = system_id.to_string();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn system_type(mut self, system_type: &str) -> Self {
        self.system_type = system_type.to_string();
        self
    }

    pub fn address_range(mut self, range: &str) -> Self {
        self.address_range = range.to_string();
        self
    }

    /// Build the BindTransceiver, checking field lengths
    pub fn build(self) -> Result<BindTransceiver, CodecError> {
        let bind_transceiver = BindTransceiver {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            system_id: self.system_id,
            password: self.password,
            system_type: self.system_type,
            interface_version: self.interface_version,
            addr_ton: self.addr_ton,
            addr_npi: self.addr_npi,
            address_range: self.address_range,
        };

        // Encoding enforces every length limit
        bind_transceiver.to_bytes()?;
        Ok(bind_transceiver)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiverResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    // body
    pub system_id: String,
    pub tlvs: Vec<Tlv>,
}

impl BindTransceiverResponse {
    pub fn new(sequence_number: u32, command_status: CommandStatus, system_id: &str) -> Self {
        Self {
            command_status,
            sequence_number,
            system_id: system_id.to_string(),
            tlvs: Vec::new(),
        }
    }
}

impl Encodable for BindTransceiver {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        // Request PDUs must have command_status = 0
        PduHeader::new(CommandId::BindTransceiver, CommandStatus::Ok, self.sequence_number)
            .encode(buf);

        encode_cstring(buf, &self.system_id, Self::SYSTEM_ID_MAX, "system_id")?;
        encode_cstring(buf, &self.password, Self::PASSWORD_MAX, "password")?;
        encode_cstring(buf, &self.system_type, Self::SYSTEM_TYPE_MAX, "system_type")?;
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(
            buf,
            &self.address_range,
            Self::ADDRESS_RANGE_MAX,
            "address_range",
        )?;
        Ok(())
    }
}

impl Decodable for BindTransceiver {
    fn command_id() -> CommandId {
        CommandId::BindTransceiver
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let system_id = decode_cstring(buf, Self::SYSTEM_ID_MAX, "system_id")?;
        let password = decode_cstring(buf, Self::PASSWORD_MAX, "password")?;
        let system_type = decode_cstring(buf, Self::SYSTEM_TYPE_MAX, "system_type")?;

        let version = decode_u8(buf)?;
        let interface_version =
            InterfaceVersion::try_from(version).map_err(|_| CodecError::FieldValidation {
                field: "interface_version",
                reason: format!("unsupported version {version:#04x}"),
            })?;
        let addr_ton = TypeOfNumber::try_from(decode_u8(buf)?).unwrap_or_default();
        let addr_npi = NumericPlanIndicator::try_from(decode_u8(buf)?).unwrap_or_default();
        let address_range = decode_cstring(buf, Self::ADDRESS_RANGE_MAX, "address_range")?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

impl Encodable for BindTransceiverResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            CommandId::BindTransceiverResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        encode_cstring(
            buf,
            &self.system_id,
            BindTransceiver::SYSTEM_ID_MAX,
            "system_id",
        )?;
        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for BindTransceiverResponse {
    fn command_id() -> CommandId {
        CommandId::BindTransceiverResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        use bytes::Buf;

        Self::validate_header(&header)?;

        // A failed bind may come back header-only
        if !buf.has_remaining() {
            return Ok(Self {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                system_id: String::new(),
                tlvs: Vec::new(),
            });
        }

        let system_id = decode_cstring(buf, BindTransceiver::SYSTEM_ID_MAX, "system_id")?;
        let tlvs = Tlv::decode_all(buf)?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            tlvs,
        })
    }
}
