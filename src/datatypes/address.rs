// ABOUTME: SME address triple (TON, NPI, digits) shared by submit_sm, submit_multi and deliver_sm
// ABOUTME: Encodes as two octets followed by a C-Octet String of at most 20 characters

use crate::codec::{CodecError, decode_cstring, decode_u8, encode_cstring};
use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::fmt;
use std::io::Cursor;

/// Type of Number (TON) of an SME address.
#[derive(TryFromPrimitive, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeOfNumber {
    #[default]
    Unknown = 0x00,
    International = 0x01,
    National = 0x02,
    NetworkSpecific = 0x03,
    SubscriberNumber = 0x04,
    Alphanumeric = 0x05,
    Abbreviated = 0x06,
}

/// Numbering Plan Indicator (NPI) of an SME address.
#[derive(TryFromPrimitive, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum NumericPlanIndicator {
    #[default]
    Unknown = 0x00,
    Isdn = 0x01,
    Data = 0x03,
    Telex = 0x04,
    LandMobile = 0x06,
    National = 0x08,
    Private = 0x09,
    Ermes = 0x0A,
    Internet = 0x0E,
    WapClientId = 0x12,
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
    pub addr: String,
}

impl Address {
    /// Octets including the NUL terminator
    pub const MAX_LEN: usize = 21;

    pub fn new(ton: TypeOfNumber, npi: NumericPlanIndicator, addr: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            addr: addr.into(),
        }
    }

    /// International ISDN (E.164) number, the common case for MSISDNs.
    pub fn international(addr: impl Into<String>) -> Self {
        Self::new(TypeOfNumber::International, NumericPlanIndicator::Isdn, addr)
    }

    pub fn encode(&self, buf: &mut BytesMut, field: &'static str) -> Result<(), CodecError> {
        buf.put_u8(self.ton as u8);
        buf.put_u8(self.npi as u8);
        encode_cstring(buf, &self.addr, Self::MAX_LEN, field)
    }

    /// Unknown TON/NPI values decode as `Unknown` rather than failing the PDU.
    pub fn decode(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<Self, CodecError> {
        let ton = TypeOfNumber::try_from(decode_u8(buf)?).unwrap_or_default();
        let npi = NumericPlanIndicator::try_from(decode_u8(buf)?).unwrap_or_default();
        let addr = decode_cstring(buf, Self::MAX_LEN, field)?;
        Ok(Self { ton, npi, addr })
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}/{:?}", self.addr, self.ton, self.npi)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}
