mod address;
mod bind_transceiver;
mod command_id;
mod command_status;
mod data_coding;
mod deliver_sm;
mod enquire_link;
mod esm_class;
mod generic_nack;
mod priority_flag;
mod submit_multi;
mod submit_sm;
pub mod tlv;
mod unbind;

pub use address::{Address, NumericPlanIndicator, TypeOfNumber};
pub use bind_transceiver::{
    BindTransceiver, BindTransceiverBuilder, BindTransceiverResponse, InterfaceVersion,
};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::DataCoding;
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use esm_class::{DeliveryKind, EsmClass, EsmClassError, ReportType};
pub use generic_nack::GenericNack;
pub use priority_flag::PriorityFlag;
pub use submit_multi::{DestinationAddress, SubmitMulti, SubmitMultiResponse, UnsuccessSmeAddress};
pub use submit_sm::{MAX_SHORT_MESSAGE_LENGTH, SubmitSm, SubmitSmBuilder, SubmitSmResponse};
pub use tlv::Tlv;
pub use unbind::{Unbind, UnbindResponse};
