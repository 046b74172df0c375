use num_enum::{FromPrimitive, IntoPrimitive};

/// The command_status field of an SMPP message response indicates the success
/// or failure of an SMPP request. It is relevant only in the SMPP response
/// message and should be set to NULL in SMPP request messages.
///
/// Only the codes this client reacts to are named; vendor specific and reserved
/// values decode into `Other` so that an unfamiliar status never fails a frame.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// No Error
    Ok = 0x0000_0000,

    /// Message Length is invalid
    InvalidMsgLength = 0x0000_0001,

    /// Command Length is invalid
    InvalidCommandLength = 0x0000_0002,

    /// Invalid Command ID
    InvalidCommandId = 0x0000_0003,

    /// Incorrect BIND Status for given command
    IncorrectBindStatus = 0x0000_0004,

    /// ESME Already in Bound State
    AlreadyBoundState = 0x0000_0005,

    /// System Error
    SystemError = 0x0000_0008,

    /// Invalid Source Address
    InvalidSourceAddress = 0x0000_000A,

    /// Invalid Dest Addr
    InvalidDestinationAddress = 0x0000_000B,

    /// Bind Failed
    BindFailed = 0x0000_000D,

    /// Invalid Password
    InvalidPassword = 0x0000_000E,

    /// Invalid System ID
    InvalidSystemId = 0x0000_000F,

    /// Message Queue Full
    MessageQueueFull = 0x0000_0014,

    /// Invalid esm_class field data
    InvalidEsmClassFieldData = 0x0000_0043,

    /// submit_sm or submit_multi failed
    SubmitFailed = 0x0000_0045,

    /// Throttling error (ESME has exceeded allowed message limits)
    ThrottlingError = 0x0000_0058,

    /// ESME Receiver Temporary App Error Code
    ReceiverTemporaryAppError = 0x0000_0064,

    /// ESME Receiver Permanent App Error Code
    ReceiverPermanentAppError = 0x0000_0065,

    /// Unknown Error
    UnknownError = 0x0000_00FF,

    /// Any status without a named variant (reserved or SMSC vendor specific)
    #[num_enum(catch_all)]
    Other(u32),
}

impl CommandStatus {
    pub fn is_ok(&self) -> bool {
        *self == CommandStatus::Ok
    }

    /// Raw wire value
    pub fn code(&self) -> u32 {
        u32::from(*self)
    }
}
