// ABOUTME: Sans-IO transceiver session: bind state machine, dispatch, correlation and send API
// ABOUTME: Fed bytes and instants by a driver, it queues outbound PDUs and reports to a delegate

//! Transceiver session state object.
//!
//! The session performs no I/O and never reads the clock. A driver feeds it
//! with four entry points and drains what it wants written:
//!
//! * [`Session::on_connected`] once the socket is up (sends the bind)
//! * [`Session::on_bytes_received`] for every read
//! * [`Session::on_timer_fired`] whenever [`Session::poll_timeout`] has passed
//! * [`Session::on_closed`] once the socket is gone
//!
//! After each call the driver writes everything [`Session::poll_transmit`] yields and
//! closes the socket once [`Session::is_close_requested`] turns true.
//!
//! ```rust
//! use smpp_transceiver::{Session, SessionConfig, SessionState};
//! use std::time::Instant;
//!
//! let mut session = Session::new(SessionConfig::new("esme", "secret"), ());
//! session.on_connected(Instant::now()).unwrap();
//!
//! let bind = session.poll_transmit().unwrap();
//! assert_eq!(&bind[4..8], &[0x00, 0x00, 0x00, 0x09]);
//! assert_eq!(session.state(), SessionState::Unbound);
//! ```

mod correlation;
mod delegate;
mod keepalive;
mod state;

pub use correlation::{Correlation, CorrelationManager, Expired, MAX_SEQUENCE_NUMBER, PendingTimer, Resolved};
pub use delegate::SessionDelegate;
pub use keepalive::{KeepAliveConfig, KeepAliveHook, KeepAliveScheduler, KeepAliveStatus, Tick};
pub use state::{Health, SessionState};

use crate::codec::{CodecError, Encodable, Frame, PduHeader, PduRegistry};
use crate::config::SessionConfig;
use crate::datatypes::{
    Address, BindTransceiverResponse, CommandId, CommandStatus, DeliverSm, DeliverSmResponse,
    DeliveryKind, DestinationAddress, EnquireLink, EnquireLinkResponse, EsmClass, GenericNack,
    MAX_SHORT_MESSAGE_LENGTH, SubmitMulti, SubmitSm, Unbind, UnbindResponse,
};
use crate::error::{SmppError, SmppResult};
use crate::frame::FrameDecoder;
use crate::segmentation::{self, MessageOptions};
use bytes::Bytes;
use std::collections::VecDeque;
use std::fmt;
use std::io::Cursor;
use std::time::Instant;
use tracing::{Span, debug, error, info, info_span, trace, warn};

/// One SMPP transceiver session over one transport connection.
pub struct Session<D: SessionDelegate> {
    config: SessionConfig,
    delegate: D,
    span: Span,
    state: SessionState,
    health: Health,
    close_requested: bool,
    decoder: FrameDecoder,
    registry: PduRegistry,
    correlation: CorrelationManager,
    keepalive: KeepAliveScheduler,
    outbox: VecDeque<Bytes>,
}

impl<D: SessionDelegate> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("system_id", &self.config.system_id)
            .field("state", &self.state)
            .field("health", &self.health)
            .field("close_requested", &self.close_requested)
            .field("pending_requests", &self.correlation.pending_requests())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

impl<D: SessionDelegate> Session<D> {
    /// New session logging under an `smpp_session` span tagged with the system id.
    pub fn new(config: SessionConfig, delegate: D) -> Self {
        let span = info_span!("smpp_session", system_id = %config.system_id);
        Self::with_span(config, delegate, span)
    }

    /// New session logging under `span`.
    pub fn with_span(config: SessionConfig, delegate: D, span: Span) -> Self {
        Self {
            decoder: FrameDecoder::new(config.max_frame_len),
            keepalive: KeepAliveScheduler::new(config.keep_alive.clone()),
            config,
            delegate,
            span,
            state: SessionState::Unbound,
            health: Health::Healthy,
            close_requested: false,
            registry: PduRegistry::new(),
            correlation: CorrelationManager::new(),
            outbox: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn into_delegate(self) -> D {
        self.delegate
    }

    /// Outstanding requests and acknowledgements.
    pub fn correlation(&self) -> &CorrelationManager {
        &self.correlation
    }

    pub fn keepalive_status(&self) -> KeepAliveStatus {
        self.keepalive.status()
    }

    pub fn set_keepalive_hook(&mut self, hook: KeepAliveHook) {
        self.keepalive.set_hook(hook);
    }

    /// The transport is established: arm the keepalive and send the bind.
    pub fn on_connected(&mut self, now: Instant) -> SmppResult<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        info!("connected, binding as transceiver");
        self.keepalive.start(now);
        self.send_bind(now)?;
        Ok(())
    }

    /// Feed bytes read from the transport. Every complete frame is dispatched.
    pub fn on_bytes_received(&mut self, data: &[u8]) {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.close_requested {
            trace!(len = data.len(), "discarding bytes after close request");
            return;
        }

        self.decoder.extend(data);
        loop {
            match self.decoder.next_frame() {
                Ok(Some(frame)) => {
                    self.handle_frame(&frame);
                    if self.close_requested {
                        self.decoder.clear();
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    error!(%err, "unrecoverable framing error");
                    self.health.advance(Health::Errored);
                    self.decoder.clear();
                    self.delegate.on_unexpected_error(&SmppError::Frame(err));
                    self.request_close();
                    break;
                }
            }
        }
    }

    /// Expire overdue requests and run the keepalive tick if due.
    pub fn on_timer_fired(&mut self, now: Instant) {
        let span = self.span.clone();
        let _enter = span.enter();

        for expired in self.correlation.expired(now) {
            warn!(
                sequence_number = expired.sequence_number,
                command_id = ?expired.command_id,
                "no response within {:?}",
                self.config.response_timeout
            );
            self.delegate
                .on_timeout(expired.sequence_number, expired.correlation.as_ref());
            if matches!(expired.command_id, CommandId::BindTransceiver | CommandId::Unbind) {
                self.request_close();
            }
        }

        match self
            .keepalive
            .poll(now, self.health.is_healthy(), self.state.is_bound())
        {
            Some(Tick::Probe) => {
                if let Err(err) = self.send_enquire_link(now) {
                    warn!(%err, "could not send enquire_link");
                }
            }
            Some(Tick::Close) => {
                warn!(health = ?self.health, "transport unhealthy, closing");
                self.request_close();
            }
            Some(Tick::Skip) | None => {}
        }
    }

    /// A read or write on the transport failed.
    ///
    /// The session is marked `Errored`; the next keepalive tick closes it, or it closes at once
    /// when no keepalive is running.
    pub fn on_transport_error(&mut self, err: SmppError) {
        let span = self.span.clone();
        let _enter = span.enter();

        error!(%err, "transport error");
        self.health.advance(Health::Errored);
        self.delegate.on_unexpected_error(&err);
        if !self.keepalive.status().running {
            self.request_close();
        }
    }

    /// The transport is gone. Drops every outstanding request unreported and notifies `unbound`.
    pub fn on_closed(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.health == Health::Closed {
            return;
        }

        let dropped = self.correlation.pending_requests();
        if dropped > 0 {
            debug!(dropped, "dropping outstanding requests");
        }
        self.correlation.clear();
        self.keepalive.stop();
        self.outbox.clear();
        self.decoder.clear();
        self.health.advance(Health::Closed);
        self.close_requested = true;
        self.state = SessionState::Unbound;

        info!("connection closed");
        self.delegate.on_unbound();
    }

    /// Ask the driver to drop the connection without unbinding.
    pub fn close(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();
        self.request_close();
    }

    /// Next PDU to write, in order.
    pub fn poll_transmit(&mut self) -> Option<Bytes> {
        self.outbox.pop_front()
    }

    /// Earliest instant at which `on_timer_fired` has work to do.
    pub fn poll_timeout(&self) -> Option<Instant> {
        if self.health == Health::Closed {
            return None;
        }
        match (self.correlation.next_deadline(), self.keepalive.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_close_requested(&self) -> bool {
        self.close_requested
    }

    /// Send bind_transceiver with the configured credentials. Refused while bound.
    pub fn send_bind(&mut self, now: Instant) -> SmppResult<u32> {
        if self.state.is_bound() {
            return Err(SmppError::InvalidState("already bound".to_string()));
        }
        self.ensure_open()?;

        let sequence_number = self.correlation.next_sequence_number();
        let bytes = self.config.bind_pdu(sequence_number).to_bytes()?;
        self.track(sequence_number, CommandId::BindTransceiver, None, bytes, now);
        debug!(sequence_number, "bind_transceiver sent");
        Ok(sequence_number)
    }

    /// Send unbind. The connection closes when the response arrives.
    pub fn send_unbind(&mut self, now: Instant) -> SmppResult<u32> {
        self.ensure_bound()?;

        let sequence_number = self.correlation.next_sequence_number();
        let bytes = Unbind::new(sequence_number).to_bytes()?;
        self.track(sequence_number, CommandId::Unbind, None, bytes, now);
        debug!(sequence_number, "unbind sent");
        Ok(sequence_number)
    }

    /// Submit a message that fits in one short_message.
    ///
    /// Returns the sequence number; the outcome arrives through the delegate with
    /// `Correlation::Message { message_id }`.
    pub fn send_message(
        &mut self,
        message_id: u64,
        source: &str,
        destination: &str,
        text: &str,
        options: &MessageOptions,
        now: Instant,
    ) -> SmppResult<u32> {
        self.ensure_bound()?;

        let body = segmentation::encode_text(text, options);
        if body.len() > MAX_SHORT_MESSAGE_LENGTH {
            return Err(SmppError::InvalidData(format!(
                "{} octets does not fit one short_message, use send_long_message",
                body.len()
            )));
        }

        let sequence_number = self.correlation.next_sequence_number();
        let pdu = self.submit_sm(sequence_number, source, destination, body, options, false);
        let bytes = pdu.to_bytes()?;
        self.track(
            sequence_number,
            CommandId::SubmitSm,
            Some(Correlation::Message { message_id }),
            bytes,
            now,
        );
        debug!(sequence_number, message_id, "submit_sm sent");
        Ok(sequence_number)
    }

    /// Submit one message to several destinations with submit_multi.
    pub fn send_multi(
        &mut self,
        message_id: u64,
        source: &str,
        destinations: &[&str],
        text: &str,
        options: &MessageOptions,
        now: Instant,
    ) -> SmppResult<u32> {
        self.ensure_bound()?;

        let body = segmentation::encode_text(text, options);
        if body.len() > MAX_SHORT_MESSAGE_LENGTH {
            return Err(SmppError::InvalidData(format!(
                "{} octets does not fit one short_message",
                body.len()
            )));
        }

        let sequence_number = self.correlation.next_sequence_number();
        let destinations = destinations
            .iter()
            .map(|addr| {
                DestinationAddress::SmeAddress(Address::new(
                    options.dest_addr_ton,
                    options.dest_addr_npi,
                    *addr,
                ))
            })
            .collect();
        let mut pdu = SubmitMulti::new(sequence_number, self.source(source), destinations, body);
        pdu.registered_delivery = options.registered_delivery;
        pdu.data_coding = options.data_coding;

        let bytes = pdu.to_bytes()?;
        self.track(
            sequence_number,
            CommandId::SubmitMulti,
            Some(Correlation::Message { message_id }),
            bytes,
            now,
        );
        debug!(sequence_number, message_id, "submit_multi sent");
        Ok(sequence_number)
    }

    /// Segment `text` and submit every part. Returns the parts' sequence numbers in order.
    pub fn send_long_message(
        &mut self,
        message_id: u64,
        source: &str,
        destination: &str,
        text: &str,
        options: &MessageOptions,
        now: Instant,
    ) -> SmppResult<Vec<u32>> {
        let body = segmentation::encode_text(text, options);
        self.send_long_message_bytes(message_id, source, destination, &body, options, now)
    }

    /// As [`Session::send_long_message`] for a body already in its wire encoding.
    ///
    /// Either every part is queued or none is.
    pub fn send_long_message_bytes(
        &mut self,
        message_id: u64,
        source: &str,
        destination: &str,
        body: &[u8],
        options: &MessageOptions,
        now: Instant,
    ) -> SmppResult<Vec<u32>> {
        self.ensure_bound()?;

        let segments = segmentation::segment(message_id, body, options, self.config.udh_layout)?;

        let mut encoded = Vec::with_capacity(segments.len());
        for segment in segments {
            let sequence_number = self.correlation.next_sequence_number();
            let pdu = self.submit_sm(
                sequence_number,
                source,
                destination,
                segment.payload,
                options,
                segment.has_udh,
            );
            let correlation = if segment.total == 1 {
                Correlation::Message { message_id }
            } else {
                Correlation::Part {
                    message_id,
                    part: segment.index,
                    total: segment.total,
                }
            };
            encoded.push((sequence_number, pdu.to_bytes()?, correlation));
        }

        let total = encoded.len();
        let mut sequence_numbers = Vec::with_capacity(total);
        for (sequence_number, bytes, correlation) in encoded {
            self.track(sequence_number, CommandId::SubmitSm, Some(correlation), bytes, now);
            sequence_numbers.push(sequence_number);
        }
        debug!(message_id, parts = total, coding = %options.data_coding, "long message sent");
        Ok(sequence_numbers)
    }

    fn send_enquire_link(&mut self, now: Instant) -> SmppResult<u32> {
        let sequence_number = self.correlation.next_sequence_number();
        let bytes = EnquireLink::new(sequence_number).to_bytes()?;
        self.track(sequence_number, CommandId::EnquireLink, None, bytes, now);
        self.keepalive.on_ping_sent();
        Ok(sequence_number)
    }

    fn submit_sm(
        &self,
        sequence_number: u32,
        source: &str,
        destination: &str,
        short_message: Bytes,
        options: &MessageOptions,
        udhi: bool,
    ) -> SubmitSm {
        let esm_class = if udhi {
            EsmClass::default().with_udhi()
        } else {
            EsmClass::default()
        };

        SubmitSm::builder()
            .sequence_number(sequence_number)
            .source(self.source(source))
            .destination(Address::new(
                options.dest_addr_ton,
                options.dest_addr_npi,
                destination,
            ))
            .esm_class(esm_class)
            .registered_delivery(options.registered_delivery)
            .data_coding(options.data_coding)
            .short_message(short_message)
            .build()
    }

    fn source(&self, addr: &str) -> Address {
        Address::new(self.config.source_addr_ton, self.config.source_addr_npi, addr)
    }

    fn ensure_open(&self) -> SmppResult<()> {
        if self.close_requested || !self.health.is_healthy() {
            return Err(SmppError::InvalidState(format!(
                "connection is {:?}",
                self.health
            )));
        }
        Ok(())
    }

    fn ensure_bound(&self) -> SmppResult<()> {
        self.ensure_open()?;
        if !self.state.is_bound() {
            return Err(SmppError::InvalidState(format!(
                "session is {}",
                self.state
            )));
        }
        Ok(())
    }

    fn track(
        &mut self,
        sequence_number: u32,
        command_id: CommandId,
        correlation: Option<Correlation>,
        bytes: Bytes,
        now: Instant,
    ) {
        let deadline = now + self.config.response_timeout;
        self.correlation
            .register(sequence_number, command_id, correlation, deadline);
        self.outbox.push_back(bytes);
    }

    fn respond<P: Encodable>(&mut self, pdu: &P) {
        match pdu.to_bytes() {
            Ok(bytes) => self.outbox.push_back(bytes),
            Err(err) => error!(%err, "failed to encode response"),
        }
    }

    fn request_close(&mut self) {
        if !self.close_requested {
            debug!("close requested");
            self.close_requested = true;
            self.keepalive.stop();
        }
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        let mut cursor = Cursor::new(frame);
        let header = match PduHeader::decode(&mut cursor) {
            Ok(header) => header,
            Err(CodecError::InvalidCommandId {
                command_id,
                sequence_number,
            }) => {
                warn!(command_id, sequence_number, "unknown command_id");
                self.respond(&GenericNack::invalid_command_id(sequence_number));
                return;
            }
            Err(err) => {
                warn!(%err, "discarding frame with malformed header");
                return;
            }
        };

        trace!(command_id = ?header.command_id, sequence_number = header.sequence_number, "received");

        match self.registry.decode_pdu(header.clone(), &mut cursor) {
            Ok(pdu) => self.dispatch(pdu),
            Err(err) => self.on_decode_failure(&header, err),
        }
    }

    fn on_decode_failure(&mut self, header: &PduHeader, err: CodecError) {
        warn!(%err, command_id = ?header.command_id, sequence_number = header.sequence_number, "failed to decode PDU body");
        if header.command_id == CommandId::DeliverSm {
            self.respond(&DeliverSmResponse::new(
                header.sequence_number,
                CommandStatus::ReceiverTemporaryAppError,
            ));
        } else if !header.command_id.is_response() {
            self.respond(&GenericNack::new(
                err.to_command_status(),
                header.sequence_number,
            ));
        }
    }

    fn dispatch(&mut self, frame: Frame) {
        match frame {
            Frame::BindTransceiverResp(resp) => self.on_bind_response(resp),
            Frame::UnbindResp(resp) => {
                self.resolve_response(resp.sequence_number, CommandId::Unbind);
                info!("unbind acknowledged");
                self.state = SessionState::Unbound;
                self.request_close();
            }
            Frame::EnquireLinkResp(resp) => {
                let sequence_number = resp.sequence_number;
                match self.resolve_response(sequence_number, CommandId::EnquireLink) {
                    Some(_) => self.keepalive.on_pong(),
                    None => warn!(sequence_number, "enquire_link_resp for no pending request"),
                }
            }
            Frame::SubmitSmResp(resp) => self.on_submit_response(
                CommandId::SubmitSm,
                resp.sequence_number,
                resp.command_status,
                &resp.message_id,
            ),
            Frame::SubmitMultiResp(resp) => {
                for failed in &resp.unsuccess_sme {
                    warn!(
                        address = %failed.address,
                        status = ?failed.error_status_code,
                        "submit_multi destination rejected"
                    );
                }
                self.on_submit_response(
                    CommandId::SubmitMulti,
                    resp.sequence_number,
                    resp.command_status,
                    &resp.message_id,
                )
            }
            Frame::GenericNack(nack) => {
                error!(
                    status = ?nack.command_status,
                    sequence_number = nack.sequence_number,
                    "generic_nack from SMSC, closing"
                );
                self.correlation.resolve(nack.sequence_number);
                self.delegate
                    .on_unexpected_error(&SmppError::Protocol(nack.command_status));
                self.request_close();
            }
            Frame::EnquireLink(req) => {
                self.respond(&EnquireLinkResponse::new(req.sequence_number));
            }
            Frame::Unbind(req) => {
                info!("unbind requested by SMSC");
                self.respond(&UnbindResponse::new(req.sequence_number));
                self.state = SessionState::Unbound;
                self.request_close();
            }
            Frame::DeliverSm(pdu) => self.on_deliver_sm(&pdu),
            Frame::DeliverSmResp(resp) => {
                warn!(sequence_number = resp.sequence_number, "unexpected deliver_sm_resp");
                self.delegate
                    .on_unexpected_pdu(CommandId::DeliverSmResp, resp.sequence_number);
            }
            request @ (Frame::BindTransceiver(_) | Frame::SubmitSm(_) | Frame::SubmitMulti(_)) => {
                let command_id = request.command_id();
                let sequence_number = request.sequence_number();
                warn!(
                    ?command_id,
                    sequence_number,
                    "request not accepted from an SMSC, closing"
                );
                self.respond(&GenericNack::invalid_command_id(sequence_number));
                self.delegate.on_unexpected_pdu(command_id, sequence_number);
                self.request_close();
            }
        }
    }

    fn on_bind_response(&mut self, resp: BindTransceiverResponse) {
        let sequence_number = resp.sequence_number;

        if self.state.is_bound() {
            if resp.command_status.is_ok() {
                warn!(sequence_number, "bind_transceiver_resp while already bound");
                self.delegate
                    .on_unexpected_pdu(CommandId::BindTransceiverResp, sequence_number);
            } else {
                warn!(
                    sequence_number,
                    status = ?resp.command_status,
                    "bind failure while bound, closing"
                );
                self.delegate
                    .on_unexpected_error(&SmppError::Protocol(resp.command_status));
                self.request_close();
            }
            return;
        }

        if self
            .resolve_response(sequence_number, CommandId::BindTransceiver)
            .is_none()
        {
            warn!(sequence_number, "bind_transceiver_resp for no pending bind");
            self.delegate
                .on_unexpected_pdu(CommandId::BindTransceiverResp, sequence_number);
            return;
        }

        match resp.command_status {
            CommandStatus::Ok => {
                info!(smsc = %resp.system_id, "bound");
                self.state = SessionState::Bound;
                self.delegate.on_bound(&resp.system_id);
            }
            CommandStatus::InvalidPassword => {
                warn!("bind rejected: invalid password");
                self.delegate.on_invalid_credentials();
                self.request_close();
            }
            CommandStatus::InvalidSystemId => {
                warn!("bind rejected: invalid system_id");
                self.delegate.on_invalid_system_id();
                self.request_close();
            }
            status => {
                warn!(?status, "bind rejected");
                self.delegate
                    .on_unexpected_error(&SmppError::Protocol(status));
                self.request_close();
            }
        }
    }

    /// Resolve `sequence_number` only if it is pending as a `request`; a mismatch stays pending.
    fn resolve_response(&mut self, sequence_number: u32, request: CommandId) -> Option<Resolved> {
        match self.correlation.pending_command(sequence_number) {
            Some(pending) if pending != request => {
                warn!(
                    sequence_number,
                    ?pending,
                    expected = ?request,
                    "response does not match the pending request"
                );
                None
            }
            _ => self.correlation.resolve(sequence_number),
        }
    }

    fn on_submit_response(
        &mut self,
        request: CommandId,
        sequence_number: u32,
        status: CommandStatus,
        message_id: &str,
    ) {
        match self.resolve_response(sequence_number, request) {
            Some(Resolved {
                correlation: Some(correlation),
                ..
            }) => {
                if status.is_ok() {
                    debug!(sequence_number, message_id, "message accepted");
                    self.delegate.on_message_accepted(&correlation, message_id);
                } else {
                    debug!(sequence_number, ?status, "message rejected");
                    self.delegate.on_message_rejected(&correlation, status);
                }
            }
            _ if self.config.strict_correlation => {
                let err = SmppError::InvalidData(format!(
                    "submit response for unknown sequence number {sequence_number}"
                ));
                error!(%err, "correlation lost, closing");
                self.delegate.on_unexpected_error(&err);
                self.request_close();
            }
            _ => {
                warn!(sequence_number, ?status, "submit response for no pending request");
            }
        }
    }

    fn on_deliver_sm(&mut self, pdu: &DeliverSm) {
        let status = match pdu.esm_class.delivery_kind() {
            Ok(DeliveryKind::MobileOriginated) => {
                debug!(source = %pdu.source, "MO message received");
                self.delegate.on_mo_received(pdu);
                CommandStatus::Ok
            }
            Ok(DeliveryKind::DeliveryReport(report_type)) => {
                debug!(?report_type, source = %pdu.source, "delivery report received");
                self.delegate.on_delivery_report_received(pdu, report_type);
                CommandStatus::Ok
            }
            Err(err) => {
                warn!(%err, sequence_number = pdu.sequence_number, "rejecting deliver_sm");
                CommandStatus::ReceiverTemporaryAppError
            }
        };
        self.respond(&DeliverSmResponse::new(pdu.sequence_number, status));
    }
}

#[cfg(test)]
mod tests;
