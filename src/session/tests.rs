use super::*;
use crate::datatypes::{
    BindTransceiverResponse, CommandStatus, DeliverSmResponse, EnquireLinkResponse,
    NumericPlanIndicator, ReportType, SubmitMultiResponse, SubmitSmResponse, TypeOfNumber,
    UnbindResponse,
};
use crate::segmentation::UdhLayout;
use crate::tests::{Event, Recorder, bound_session, decode, deliver_sm, drain, encode, sequence_of};
use std::time::Duration;

fn connected(config: SessionConfig) -> (Session<Recorder>, Instant, u32) {
    let now = Instant::now();
    let mut session = Session::new(config, Recorder::default());
    session.on_connected(now).unwrap();
    let bind = session.poll_transmit().unwrap();
    (session, now, sequence_of(&bind))
}

#[test]
fn test_connect_sends_bind_with_credentials() {
    let config = SessionConfig::new("esme01", "pw")
        .with_system_type("VMA")
        .with_source_numbering(TypeOfNumber::Alphanumeric, NumericPlanIndicator::Unknown);
    let mut session = Session::new(config, Recorder::default());
    session.on_connected(Instant::now()).unwrap();

    let Frame::BindTransceiver(bind) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected bind_transceiver");
    };
    assert_eq!(bind.system_id, "esme01");
    assert_eq!(bind.password, "pw");
    assert_eq!(bind.system_type, "VMA");
    assert_eq!(bind.addr_ton, TypeOfNumber::Alphanumeric);
    assert_eq!(session.state(), SessionState::Unbound);
    assert_eq!(session.correlation().pending_requests(), 1);
    assert!(session.keepalive_status().running);
}

#[test]
fn test_bound_exactly_once() {
    let (mut session, _) = bound_session(SessionConfig::default());

    session.on_bytes_received(&encode(&BindTransceiverResponse::new(
        1,
        CommandStatus::Ok,
        "SMSC",
    )));

    assert_eq!(
        session.delegate().events,
        vec![
            Event::Bound("SMSC".to_string()),
            Event::UnexpectedPdu(CommandId::BindTransceiverResp, 1)
        ]
    );
    assert!(session.state().is_bound());
    assert_eq!(session.correlation().pending_requests(), 0);
}

#[test]
fn test_bind_rejections_close() {
    let cases = [
        (CommandStatus::InvalidPassword, Event::InvalidCredentials),
        (CommandStatus::InvalidSystemId, Event::InvalidSystemId),
        (
            CommandStatus::BindFailed,
            Event::UnexpectedError(SmppError::Protocol(CommandStatus::BindFailed).to_string()),
        ),
    ];

    for (status, expected) in cases {
        let (mut session, _, seq) = connected(SessionConfig::default());
        session.on_bytes_received(&encode(&BindTransceiverResponse::new(seq, status, "")));

        assert_eq!(session.delegate().events, vec![expected]);
        assert_eq!(session.state(), SessionState::Unbound);
        assert!(session.is_close_requested());
    }
}

#[test]
fn test_sends_while_unbound_write_nothing() {
    let (mut session, now, _) = connected(SessionConfig::default());
    let options = MessageOptions::default();

    let single = session.send_message(1, "a", "b", "hi", &options, now);
    let multi = session.send_multi(2, "a", &["b", "c"], "hi", &options, now);
    let long = session.send_long_message(3, "a", "b", &"z".repeat(400), &options, now);
    let unbind = session.send_unbind(now);

    assert!(matches!(single, Err(SmppError::InvalidState(_))));
    assert!(matches!(multi, Err(SmppError::InvalidState(_))));
    assert!(matches!(long, Err(SmppError::InvalidState(_))));
    assert!(matches!(unbind, Err(SmppError::InvalidState(_))));
    assert!(session.poll_transmit().is_none());
    assert_eq!(session.correlation().pending_acks(), 0);
}

#[test]
fn test_send_bind_refused_while_bound() {
    let (mut session, now) = bound_session(SessionConfig::default());
    assert!(matches!(
        session.send_bind(now),
        Err(SmppError::InvalidState(_))
    ));
    assert!(session.poll_transmit().is_none());
}

#[test]
fn test_submit_response_resolves_exactly_once() {
    let (mut session, now) = bound_session(SessionConfig::default());
    let options = MessageOptions::default();

    let accepted = session.send_message(7, "7726", "4477", "a", &options, now).unwrap();
    let rejected = session.send_message(8, "7726", "4477", "b", &options, now).unwrap();
    assert_eq!(session.correlation().pending_acks(), 2);
    drain(&mut session);

    session.on_bytes_received(&encode(&SubmitSmResponse::new(accepted, CommandStatus::Ok, "m-7")));
    session.on_bytes_received(&encode(&SubmitSmResponse::new(
        rejected,
        CommandStatus::ThrottlingError,
        "",
    )));
    // duplicate
    session.on_bytes_received(&encode(&SubmitSmResponse::new(accepted, CommandStatus::Ok, "m-7")));

    assert_eq!(
        session.delegate().events[1..],
        [
            Event::Accepted(Correlation::Message { message_id: 7 }, "m-7".to_string()),
            Event::Rejected(
                Correlation::Message { message_id: 8 },
                CommandStatus::ThrottlingError
            ),
        ]
    );
    assert_eq!(session.correlation().pending_acks(), 0);
    assert_eq!(session.correlation().pending_requests(), 0);
    assert!(!session.is_close_requested());
}

#[test]
fn test_strict_correlation_closes_on_unknown_submit_response() {
    let (mut session, _) = bound_session(SessionConfig::default().with_strict_correlation(true));

    session.on_bytes_received(&encode(&SubmitSmResponse::new(99, CommandStatus::Ok, "x")));

    assert!(matches!(
        session.delegate().events.last(),
        Some(Event::UnexpectedError(_))
    ));
    assert!(session.is_close_requested());
}

#[test]
fn test_timeout_fires_once_and_late_response_is_ignored() {
    let config = SessionConfig::default()
        .with_response_timeout(Duration::from_secs(10))
        .with_keep_alive(KeepAliveConfig::disabled());
    let (mut session, now) = bound_session(config);

    let seq = session
        .send_message(5, "7726", "4477", "hi", &MessageOptions::default(), now)
        .unwrap();
    assert_eq!(session.poll_timeout(), Some(now + Duration::from_secs(10)));

    session.on_timer_fired(now + Duration::from_secs(9));
    assert_eq!(session.delegate().events.len(), 1);

    session.on_timer_fired(now + Duration::from_secs(10));
    session.on_timer_fired(now + Duration::from_secs(11));
    session.on_bytes_received(&encode(&SubmitSmResponse::new(seq, CommandStatus::Ok, "late")));

    assert_eq!(
        session.delegate().events[1..],
        [Event::Timeout(seq, Some(Correlation::Message { message_id: 5 }))]
    );
    assert_eq!(session.poll_timeout(), None);
    assert!(!session.is_close_requested());
}

#[test]
fn test_enquire_link_timeout_releases_sequence_number() {
    let interval = Duration::from_secs(30);
    let timeout = Duration::from_secs(10);
    let config = SessionConfig::default()
        .with_enquire_link_interval(interval)
        .with_response_timeout(timeout);
    let (mut session, now) = bound_session(config);

    session.on_timer_fired(now + interval);
    let seq = sequence_of(&session.poll_transmit().unwrap());
    assert_eq!(session.correlation().pending_command(seq), Some(CommandId::EnquireLink));

    session.on_timer_fired(now + interval + timeout);

    assert_eq!(session.delegate().events.last(), Some(&Event::Timeout(seq, None)));
    assert!(!session.correlation().is_pending(seq));
    assert!(!session.is_close_requested());

    session.on_bytes_received(&encode(&EnquireLinkResponse::new(seq)));
    assert_eq!(session.keepalive_status().total_pongs, 0);
}

#[test]
fn test_unbind_timeout_releases_sequence_number_and_closes() {
    let (mut session, now) = bound_session(SessionConfig::default());
    let seq = session.send_unbind(now).unwrap();
    drain(&mut session);

    session.on_timer_fired(now + Duration::from_secs(10));

    assert_eq!(session.delegate().events.last(), Some(&Event::Timeout(seq, None)));
    assert!(!session.correlation().is_pending(seq));
    assert!(session.is_close_requested());
}

#[test]
fn test_submit_response_for_enquire_link_leaves_it_pending() {
    let interval = Duration::from_secs(30);
    let config = SessionConfig::default().with_enquire_link_interval(interval);
    let (mut session, now) = bound_session(config);

    session.on_timer_fired(now + interval);
    let seq = sequence_of(&session.poll_transmit().unwrap());

    session.on_bytes_received(&encode(&SubmitSmResponse::new(seq, CommandStatus::Ok, "x")));
    assert_eq!(session.delegate().events, vec![Event::Bound("SMSC".to_string())]);
    assert_eq!(session.correlation().pending_command(seq), Some(CommandId::EnquireLink));
    assert!(!session.is_close_requested());

    session.on_bytes_received(&encode(&EnquireLinkResponse::new(seq)));
    assert!(!session.correlation().is_pending(seq));
    assert_eq!(session.keepalive_status().total_pongs, 1);
}

#[test]
fn test_strict_correlation_rejects_submit_response_for_other_request() {
    let interval = Duration::from_secs(30);
    let config = SessionConfig::default()
        .with_enquire_link_interval(interval)
        .with_strict_correlation(true);
    let (mut session, now) = bound_session(config);

    session.on_timer_fired(now + interval);
    let seq = sequence_of(&session.poll_transmit().unwrap());
    session.on_bytes_received(&encode(&SubmitSmResponse::new(seq, CommandStatus::Ok, "x")));

    assert!(matches!(
        session.delegate().events.last(),
        Some(Event::UnexpectedError(_))
    ));
    assert!(session.is_close_requested());
}

#[test]
fn test_bind_failure_while_bound_closes() {
    let (mut session, _) = bound_session(SessionConfig::default());

    session.on_bytes_received(&encode(&BindTransceiverResponse::new(
        9,
        CommandStatus::SystemError,
        "SMSC",
    )));

    assert_eq!(
        session.delegate().events.last(),
        Some(&Event::UnexpectedError(
            SmppError::Protocol(CommandStatus::SystemError).to_string()
        ))
    );
    assert!(session.is_close_requested());
}

#[test]
fn test_bind_timeout_closes() {
    let (mut session, now, seq) = connected(SessionConfig::default());

    session.on_timer_fired(now + Duration::from_secs(10));

    assert_eq!(session.delegate().events, vec![Event::Timeout(seq, None)]);
    assert!(session.is_close_requested());
}

#[test]
fn test_deliver_sm_classification() {
    let (mut session, _) = bound_session(SessionConfig::default());

    session.on_bytes_received(&deliver_sm(20, 0x00, b"hello"));
    session.on_bytes_received(&deliver_sm(21, 0x08, b"ack"));
    session.on_bytes_received(&deliver_sm(22, 0x10, b"manual"));
    session.on_bytes_received(&deliver_sm(23, 0x20, b"intermediate"));
    session.on_bytes_received(&deliver_sm(24, 0x44, b"udhi report"));
    session.on_bytes_received(&deliver_sm(25, 0x3C, b"junk"));

    let statuses: Vec<(u32, CommandStatus)> = drain(&mut session)
        .iter()
        .map(|bytes| match decode(bytes) {
            Frame::DeliverSmResp(resp) => (resp.sequence_number, resp.command_status),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            (20, CommandStatus::Ok),
            (21, CommandStatus::Ok),
            (22, CommandStatus::Ok),
            (23, CommandStatus::Ok),
            (24, CommandStatus::Ok),
            (25, CommandStatus::ReceiverTemporaryAppError),
        ]
    );

    assert_eq!(
        session.delegate().events[1..],
        [
            Event::Mo(bytes::Bytes::from_static(b"hello")),
            Event::Report(ReportType::SmeDeliveryAck),
            Event::Report(ReportType::SmeManualAck),
            Event::Report(ReportType::IntermediateNotification),
            Event::Report(ReportType::SmscDeliveryReceipt),
        ]
    );
}

#[test]
fn test_malformed_deliver_sm_gets_temporary_error() {
    let (mut session, _) = bound_session(SessionConfig::default());

    // service_type without its NUL terminator
    let frame = [
        0x00, 0x00, 0x00, 0x11, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x09, 0x41,
    ];
    session.on_bytes_received(&frame);

    let responses = drain(&mut session);
    assert_eq!(responses.len(), 1);
    let Frame::DeliverSmResp(resp) = decode(&responses[0]) else {
        panic!("expected deliver_sm_resp");
    };
    assert_eq!(resp.sequence_number, 9);
    assert_eq!(resp.command_status, CommandStatus::ReceiverTemporaryAppError);
    assert!(!session.is_close_requested());
}

#[test]
fn test_enquire_link_answered_before_bind() {
    let (mut session, _, _) = connected(SessionConfig::default());

    session.on_bytes_received(&encode(&EnquireLink::new(77)));

    let Frame::EnquireLinkResp(resp) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected enquire_link_resp");
    };
    assert_eq!(resp.sequence_number, 77);
    assert_eq!(resp.command_status, CommandStatus::Ok);
}

#[test]
fn test_unbind_from_smsc() {
    let (mut session, _) = bound_session(SessionConfig::default());

    session.on_bytes_received(&encode(&Unbind::new(40)));

    let Frame::UnbindResp(resp) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected unbind_resp");
    };
    assert_eq!(resp.sequence_number, 40);
    assert_eq!(session.state(), SessionState::Unbound);
    assert!(session.is_close_requested());

    session.on_closed();
    assert_eq!(session.delegate().events.last(), Some(&Event::Unbound));
}

#[test]
fn test_local_unbind() {
    let (mut session, now) = bound_session(SessionConfig::default());

    let seq = session.send_unbind(now).unwrap();
    assert!(matches!(decode(&session.poll_transmit().unwrap()), Frame::Unbind(_)));
    assert!(!session.is_close_requested());

    session.on_bytes_received(&encode(&UnbindResponse::new(seq)));
    assert!(session.is_close_requested());
    assert_eq!(session.state(), SessionState::Unbound);
    assert_eq!(session.correlation().pending_requests(), 0);
}

#[test]
fn test_unknown_command_id_is_nacked() {
    let (mut session, _) = bound_session(SessionConfig::default());

    let frame = [
        0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x01, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x31,
    ];
    session.on_bytes_received(&frame);

    let Frame::GenericNack(nack) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected generic_nack");
    };
    assert_eq!(nack.command_status, CommandStatus::InvalidCommandId);
    assert_eq!(nack.sequence_number, 0x31);
    assert!(!session.is_close_requested());
}

#[test]
fn test_submit_from_smsc_is_unexpected() {
    let (mut session, _) = bound_session(SessionConfig::default());

    let submit = crate::datatypes::SubmitSm::builder().sequence_number(12).build();
    session.on_bytes_received(&encode(&submit));

    let Frame::GenericNack(nack) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected generic_nack");
    };
    assert_eq!(nack.sequence_number, 12);
    assert_eq!(
        session.delegate().events.last(),
        Some(&Event::UnexpectedPdu(CommandId::SubmitSm, 12))
    );
    assert!(session.is_close_requested());
}

#[test]
fn test_unexpected_deliver_sm_resp_keeps_session_open() {
    let (mut session, _) = bound_session(SessionConfig::default());

    session.on_bytes_received(&encode(&DeliverSmResponse::new(4, CommandStatus::Ok)));

    assert_eq!(
        session.delegate().events.last(),
        Some(&Event::UnexpectedPdu(CommandId::DeliverSmResp, 4))
    );
    assert!(!session.is_close_requested());
}

#[test]
fn test_generic_nack_closes() {
    let (mut session, now) = bound_session(SessionConfig::default());
    let seq = session
        .send_message(1, "a", "b", "c", &MessageOptions::default(), now)
        .unwrap();
    drain(&mut session);

    session.on_bytes_received(&encode(&GenericNack::new(CommandStatus::InvalidCommandLength, seq)));
    assert!(session.is_close_requested());
    assert_eq!(
        session.delegate().events.last(),
        Some(&Event::UnexpectedError(
            SmppError::Protocol(CommandStatus::InvalidCommandLength).to_string()
        ))
    );
    assert_eq!(session.correlation().pending_requests(), 0);

    session.on_bytes_received(&encode(&EnquireLink::new(3)));
    assert!(session.poll_transmit().is_none());

    let refused = session.send_message(2, "a", "b", "c", &MessageOptions::default(), now);
    assert!(matches!(refused, Err(SmppError::InvalidState(_))));
}

#[test]
fn test_frame_shorter_than_header_is_discarded() {
    let (mut session, _) = bound_session(SessionConfig::default());

    let mut data = vec![0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x15];
    data.extend_from_slice(&encode(&EnquireLink::new(5)));
    session.on_bytes_received(&data);

    let Frame::EnquireLinkResp(resp) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected enquire_link_resp");
    };
    assert_eq!(resp.sequence_number, 5);
    assert!(session.poll_transmit().is_none());
    assert_eq!(session.health(), Health::Healthy);
    assert!(!session.is_close_requested());
}

#[test]
fn test_length_below_prefix_is_fatal() {
    let (mut session, _) = bound_session(SessionConfig::default());

    session.on_bytes_received(&[0x00, 0x00, 0x00, 0x02]);

    assert_eq!(session.health(), Health::Errored);
    assert!(session.is_close_requested());
}

#[test]
fn test_oversized_frame_is_fatal() {
    let config = SessionConfig::default().with_max_frame_len(1024);
    let (mut session, _) = bound_session(config);

    session.on_bytes_received(&[0x00, 0x00, 0x10, 0x00]);

    assert_eq!(session.health(), Health::Errored);
    assert!(session.is_close_requested());
    assert!(matches!(
        session.delegate().events.last(),
        Some(Event::UnexpectedError(_))
    ));
}

#[test]
fn test_keepalive_probes_only_when_bound() {
    let interval = Duration::from_secs(30);
    let config = SessionConfig::default()
        .with_enquire_link_interval(interval)
        .with_response_timeout(Duration::from_secs(300));
    let (mut session, now, bind_seq) = connected(config);

    session.on_timer_fired(now + interval);
    assert!(session.poll_transmit().is_none());
    assert_eq!(session.keepalive_status().skipped_ticks, 1);

    session.on_bytes_received(&encode(&BindTransceiverResponse::new(
        bind_seq,
        CommandStatus::Ok,
        "SMSC",
    )));
    session.on_timer_fired(now + interval * 2);

    let probe = session.poll_transmit().unwrap();
    assert!(matches!(decode(&probe), Frame::EnquireLink(_)));
    session.on_bytes_received(&encode(&EnquireLinkResponse::new(sequence_of(&probe))));

    let status = session.keepalive_status();
    assert_eq!(status.total_pings, 1);
    assert_eq!(status.total_pongs, 1);
    assert_eq!(session.correlation().pending_requests(), 0);
}

#[test]
fn test_keepalive_hook_vetoes_probe() {
    let (mut session, now) = bound_session(SessionConfig::default());
    session.set_keepalive_hook(Box::new(|| false));

    session.on_timer_fired(now + Duration::from_secs(30));

    assert!(session.poll_transmit().is_none());
    assert_eq!(session.keepalive_status().skipped_ticks, 1);
    assert!(session.keepalive_status().running);
}

#[test]
fn test_transport_error_closes_on_next_tick() {
    let (mut session, now) = bound_session(SessionConfig::default());

    session.on_transport_error(SmppError::Connection(std::io::Error::from(
        std::io::ErrorKind::BrokenPipe,
    )));
    assert_eq!(session.health(), Health::Errored);
    assert!(!session.is_close_requested());

    let refused = session.send_message(1, "a", "b", "c", &MessageOptions::default(), now);
    assert!(matches!(refused, Err(SmppError::InvalidState(_))));

    session.on_timer_fired(now + Duration::from_secs(30));
    assert!(session.is_close_requested());
    assert!(session.poll_transmit().is_none());
}

#[test]
fn test_transport_error_without_keepalive_closes_at_once() {
    let (mut session, _) =
        bound_session(SessionConfig::default().with_keep_alive(KeepAliveConfig::disabled()));

    session.on_transport_error(SmppError::ConnectionClosed);

    assert!(session.is_close_requested());
}

#[test]
fn test_long_message_parts_resolve_individually() {
    let config = SessionConfig::default().with_udh_layout(UdhLayout::Concat16);
    let (mut session, now) = bound_session(config);
    let text = "y".repeat(200);

    let seqs = session
        .send_long_message(0x0102_0304, "7726", "4477", &text, &MessageOptions::default(), now)
        .unwrap();
    assert_eq!(seqs.len(), 2);

    let parts = drain(&mut session);
    let Frame::SubmitSm(first) = decode(&parts[0]) else {
        panic!("expected submit_sm");
    };
    assert_eq!(&first.short_message[..7], &[0x06, 0x08, 0x04, 0x03, 0x04, 0x02, 0x01]);

    session.on_bytes_received(&encode(&SubmitSmResponse::new(seqs[1], CommandStatus::Ok, "p2")));
    session.on_bytes_received(&encode(&SubmitSmResponse::new(
        seqs[0],
        CommandStatus::MessageQueueFull,
        "",
    )));

    assert_eq!(
        session.delegate().events[1..],
        [
            Event::Accepted(
                Correlation::Part {
                    message_id: 0x0102_0304,
                    part: 2,
                    total: 2
                },
                "p2".to_string()
            ),
            Event::Rejected(
                Correlation::Part {
                    message_id: 0x0102_0304,
                    part: 1,
                    total: 2
                },
                CommandStatus::MessageQueueFull
            ),
        ]
    );
}

#[test]
fn test_short_long_message_is_a_plain_submit() {
    let (mut session, now) = bound_session(SessionConfig::default());

    let seqs = session
        .send_long_message(3, "7726", "4477", "short", &MessageOptions::default(), now)
        .unwrap();
    let parts = drain(&mut session);
    assert_eq!(parts.len(), 1);
    let Frame::SubmitSm(pdu) = decode(&parts[0]) else {
        panic!("expected submit_sm");
    };
    assert!(!pdu.esm_class.has_udhi());
    assert_eq!(pdu.short_message.as_ref(), b"short");

    session.on_bytes_received(&encode(&SubmitSmResponse::new(seqs[0], CommandStatus::Ok, "m")));
    assert_eq!(
        session.delegate().events.last(),
        Some(&Event::Accepted(Correlation::Message { message_id: 3 }, "m".to_string()))
    );
}

#[test]
fn test_send_multi() {
    let (mut session, now) = bound_session(SessionConfig::default());
    let options = MessageOptions::default()
        .with_destination_numbering(TypeOfNumber::International, NumericPlanIndicator::Isdn)
        .with_registered_delivery(1);

    let seq = session
        .send_multi(11, "7726", &["447700900001", "447700900002"], "hi all", &options, now)
        .unwrap();

    let Frame::SubmitMulti(pdu) = decode(&session.poll_transmit().unwrap()) else {
        panic!("expected submit_multi");
    };
    assert_eq!(pdu.sequence_number, seq);
    assert_eq!(pdu.destinations.len(), 2);
    assert_eq!(pdu.registered_delivery, 1);

    session.on_bytes_received(&encode(&SubmitMultiResponse::new(seq, CommandStatus::Ok, "multi")));
    assert_eq!(
        session.delegate().events.last(),
        Some(&Event::Accepted(Correlation::Message { message_id: 11 }, "multi".to_string()))
    );
}

#[test]
fn test_send_message_rejects_oversized_body() {
    let (mut session, now) = bound_session(SessionConfig::default());

    let result = session.send_message(1, "a", "b", &"x".repeat(255), &MessageOptions::default(), now);

    assert!(matches!(result, Err(SmppError::InvalidData(_))));
    assert!(session.poll_transmit().is_none());
    assert_eq!(session.correlation().pending_requests(), 0);
}

#[test]
fn test_closed_drops_outstanding_without_reporting() {
    let (mut session, now) = bound_session(SessionConfig::default());
    session
        .send_long_message(1, "a", "b", &"q".repeat(400), &MessageOptions::default(), now)
        .unwrap();
    assert_eq!(session.correlation().pending_acks(), 3);

    session.on_closed();
    session.on_closed();

    assert_eq!(session.health(), Health::Closed);
    assert_eq!(session.state(), SessionState::Unbound);
    assert_eq!(session.correlation().pending_requests(), 0);
    assert!(session.poll_transmit().is_none());
    assert_eq!(session.poll_timeout(), None);
    assert_eq!(
        session.delegate().events,
        vec![Event::Bound("SMSC".to_string()), Event::Unbound]
    );

    session.on_timer_fired(now + Duration::from_secs(60));
    assert_eq!(session.delegate().events.len(), 2);
}
