use num_enum::TryFromPrimitive;

/// The command_id field identifies the SMPP PDU. Response PDUs carry the request id with
/// the high bit set.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    // Reserved 0x0000000C - 0x00000014
    //          0x8000000B - 0x80000014
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,
}

impl CommandId {
    /// Check if this command_id represents a response PDU
    pub fn is_response(&self) -> bool {
        (*self as u32) & 0x8000_0000 != 0
    }

    /// Requests whose responses resolve a `pendingAcks` entry.
    pub fn is_submit_class(&self) -> bool {
        matches!(
            self,
            CommandId::SubmitSm
                | CommandId::SubmitSmResp
                | CommandId::SubmitMulti
                | CommandId::SubmitMultiResp
        )
    }
}
