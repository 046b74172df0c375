// ABOUTME: Observer contract for terminal session events
// ABOUTME: Every notification has a no-op default so implementors pick only what they need

use crate::datatypes::{CommandId, CommandStatus, DeliverSm, ReportType};
use crate::error::SmppError;
use crate::session::Correlation;

/// Receives session events. Called synchronously from inside the session, in order.
///
/// ```rust
/// use smpp_transceiver::{Correlation, SessionDelegate};
///
/// struct Accepted(Vec<u64>);
///
/// impl SessionDelegate for Accepted {
///     fn on_message_accepted(&mut self, correlation: &Correlation, _message_id: &str) {
///         self.0.push(correlation.message_id());
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait SessionDelegate: Send {
    /// Bind completed. `system_id` is the SMSC's identifier from the bind response.
    fn on_bound(&mut self, system_id: &str) {}

    /// The connection closed; outstanding requests were dropped unreported.
    fn on_unbound(&mut self) {}

    fn on_mo_received(&mut self, pdu: &DeliverSm) {}

    fn on_delivery_report_received(&mut self, pdu: &DeliverSm, report_type: ReportType) {}

    /// A submit_sm or submit_multi was accepted. `message_id` is SMSC-assigned.
    fn on_message_accepted(&mut self, correlation: &Correlation, message_id: &str) {}

    fn on_message_rejected(&mut self, correlation: &Correlation, status: CommandStatus) {}

    fn on_invalid_credentials(&mut self) {}

    fn on_invalid_system_id(&mut self) {}

    fn on_unexpected_pdu(&mut self, command_id: CommandId, sequence_number: u32) {}

    fn on_unexpected_error(&mut self, error: &SmppError) {}

    /// No response arrived in time. `correlation` is set for submit-class requests.
    fn on_timeout(&mut self, sequence_number: u32, correlation: Option<&Correlation>) {}
}

impl SessionDelegate for () {}

impl<D: SessionDelegate + ?Sized> SessionDelegate for Box<D> {
    fn on_bound(&mut self, system_id: &str) {
        (**self).on_bound(system_id)
    }

    fn on_unbound(&mut self) {
        (**self).on_unbound()
    }

    fn on_mo_received(&mut self, pdu: &DeliverSm) {
        (**self).on_mo_received(pdu)
    }

    fn on_delivery_report_received(&mut self, pdu: &DeliverSm, report_type: ReportType) {
        (**self).on_delivery_report_received(pdu, report_type)
    }

    fn on_message_accepted(&mut self, correlation: &Correlation, message_id: &str) {
        (**self).on_message_accepted(correlation, message_id)
    }

    fn on_message_rejected(&mut self, correlation: &Correlation, status: CommandStatus) {
        (**self).on_message_rejected(correlation, status)
    }

    fn on_invalid_credentials(&mut self) {
        (**self).on_invalid_credentials()
    }

    fn on_invalid_system_id(&mut self) {
        (**self).on_invalid_system_id()
    }

    fn on_unexpected_pdu(&mut self, command_id: CommandId, sequence_number: u32) {
        (**self).on_unexpected_pdu(command_id, sequence_number)
    }

    fn on_unexpected_error(&mut self, error: &SmppError) {
        (**self).on_unexpected_error(error)
    }

    fn on_timeout(&mut self, sequence_number: u32, correlation: Option<&Correlation>) {
        (**self).on_timeout(sequence_number, correlation)
    }
}
