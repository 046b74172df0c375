use crate::datatypes::CommandId;
use crate::datatypes::CommandStatus;
use crate::macros::impl_complete_header_only_pdu;

/// enquire_link (4.11.1): liveness probe, valid in any bind state.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    // Always NULL on the wire; kept so the header-only codec stays uniform
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

/// enquire_link_resp (4.11.2)
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp);
