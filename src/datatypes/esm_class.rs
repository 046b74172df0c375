// ABOUTME: SMPP esm_class bitfield: message mode, message type and GSM feature bits
// ABOUTME: Classifies inbound deliver_sm PDUs into mobile-originated messages and delivery reports

use std::fmt;
use thiserror::Error;

/// The esm_class octet of submit_sm / deliver_sm.
///
/// ```text
///  7 6 | 5 4 3 2 | 1 0
///  GSM | type    | mode
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EsmClass(u8);

impl EsmClass {
    /// Bits 1-0
    pub const MESSAGE_MODE_MASK: u8 = 0b0000_0011;
    /// Bits 5-2
    pub const MESSAGE_TYPE_MASK: u8 = 0b0011_1100;
    /// User Data Header Indicator (bit 6)
    pub const UDHI: u8 = 0b0100_0000;
    /// Reply path (bit 7)
    pub const REPLY_PATH: u8 = 0b1000_0000;

    pub const fn from_byte(value: u8) -> Self {
        Self(value)
    }

    pub const fn to_byte(&self) -> u8 {
        self.0
    }

    /// Adds UDHI (User Data Header Indicator) feature
    pub fn with_udhi(mut self) -> Self {
        self.0 |= Self::UDHI;
        self
    }

    /// Returns true if UDHI (User Data Header Indicator) is set
    pub fn has_udhi(&self) -> bool {
        self.0 & Self::UDHI != 0
    }

    pub fn message_type_bits(&self) -> u8 {
        self.0 & Self::MESSAGE_TYPE_MASK
    }

    /// Classifies a deliver_sm by its message type bits.
    pub fn delivery_kind(&self) -> Result<DeliveryKind, EsmClassError> {
        match self.message_type_bits() {
            0b0000_0000 => Ok(DeliveryKind::MobileOriginated),
            0b0000_0100 => Ok(DeliveryKind::DeliveryReport(ReportType::SmscDeliveryReceipt)),
            0b0000_1000 => Ok(DeliveryKind::DeliveryReport(ReportType::SmeDeliveryAck)),
            0b0001_0000 => Ok(DeliveryKind::DeliveryReport(ReportType::SmeManualAck)),
            0b0010_0000 => Ok(DeliveryKind::DeliveryReport(
                ReportType::IntermediateNotification,
            )),
            bits => Err(EsmClassError::UnrecognizedMessageType(bits)),
        }
    }
}

/// What an inbound deliver_sm carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryKind {
    MobileOriginated,
    DeliveryReport(ReportType),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportType {
    SmscDeliveryReceipt,
    SmeDeliveryAck,
    SmeManualAck,
    IntermediateNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EsmClassError {
    #[error("unrecognized esm_class message type bits: {0:#04x}")]
    UnrecognizedMessageType(u8),
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EsmClass({:#04x})", self.0)
    }
}

impl From<u8> for EsmClass {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
