// ABOUTME: Tracks outstanding requests by sequence number and expires them on deadline
// ABOUTME: Holds per-request timers and the submit-class acknowledgement metadata

use crate::datatypes::CommandId;
use std::collections::HashMap;
use std::time::Instant;
use tracing::trace;

/// Largest sequence number a request may carry.
pub const MAX_SEQUENCE_NUMBER: u32 = 0x7FFF_FFFF;

/// What a submit-class request was sending, handed back to the delegate with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    /// A message that fit in one PDU.
    Message { message_id: u64 },
    /// One part of a segmented message. `part` is 1-based.
    Part { message_id: u64, part: u8, total: u8 },
}

impl Correlation {
    pub fn message_id(&self) -> u64 {
        match self {
            Correlation::Message { message_id } | Correlation::Part { message_id, .. } => {
                *message_id
            }
        }
    }
}

/// A live per-request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub command_id: CommandId,
    pub deadline: Instant,
}

/// A response that matched an outstanding request.
#[derive(Debug)]
pub struct Resolved {
    pub timer: Option<PendingTimer>,
    pub correlation: Option<Correlation>,
}

/// A request whose deadline passed with no response.
#[derive(Debug)]
pub struct Expired {
    pub sequence_number: u32,
    pub command_id: CommandId,
    pub correlation: Option<Correlation>,
}

/// Sequence allocation and the pendingAcks/pendingTimers pair.
///
/// Every key in `pending_acks` is also a key in `pending_timers`; both are removed together,
/// whichever of response or expiry happens first.
#[derive(Debug, Default)]
pub struct CorrelationManager {
    last_sequence: u32,
    pending_acks: HashMap<u32, Correlation>,
    pending_timers: HashMap<u32, PendingTimer>,
}

impl CorrelationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number in `1..=0x7FFF_FFFF`, wrapping and skipping values still outstanding.
    pub fn next_sequence_number(&mut self) -> u32 {
        loop {
            self.last_sequence = if self.last_sequence >= MAX_SEQUENCE_NUMBER {
                1
            } else {
                self.last_sequence + 1
            };
            if !self.pending_timers.contains_key(&self.last_sequence) {
                return self.last_sequence;
            }
        }
    }

    /// Track an outbound request until `deadline`.
    pub fn register(
        &mut self,
        sequence_number: u32,
        command_id: CommandId,
        correlation: Option<Correlation>,
        deadline: Instant,
    ) {
        trace!(sequence_number, ?command_id, "tracking request");
        self.pending_timers.insert(
            sequence_number,
            PendingTimer {
                command_id,
                deadline,
            },
        );
        if let Some(correlation) = correlation {
            self.pending_acks.insert(sequence_number, correlation);
        }
    }

    /// Cancel the timer then take the ack entry. `None` when nothing was outstanding.
    pub fn resolve(&mut self, sequence_number: u32) -> Option<Resolved> {
        let timer = self.pending_timers.remove(&sequence_number);
        let correlation = self.pending_acks.remove(&sequence_number);
        if timer.is_none() && correlation.is_none() {
            return None;
        }
        Some(Resolved { timer, correlation })
    }

    /// Remove and return every request whose deadline is at or before `now`, oldest first.
    pub fn expired(&mut self, now: Instant) -> Vec<Expired> {
        let mut due: Vec<(u32, PendingTimer)> = self
            .pending_timers
            .iter()
            .filter(|(_, timer)| timer.deadline <= now)
            .map(|(seq, timer)| (*seq, *timer))
            .collect();
        due.sort_by_key(|(seq, timer)| (timer.deadline, *seq));

        due.into_iter()
            .map(|(sequence_number, timer)| {
                self.pending_timers.remove(&sequence_number);
                Expired {
                    sequence_number,
                    command_id: timer.command_id,
                    correlation: self.pending_acks.remove(&sequence_number),
                }
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_timers.values().map(|t| t.deadline).min()
    }

    /// Command of the request still outstanding under `sequence_number`.
    pub fn pending_command(&self, sequence_number: u32) -> Option<CommandId> {
        self.pending_timers
            .get(&sequence_number)
            .map(|timer| timer.command_id)
    }

    pub fn is_pending(&self, sequence_number: u32) -> bool {
        self.pending_timers.contains_key(&sequence_number)
    }

    pub fn pending_requests(&self) -> usize {
        self.pending_timers.len()
    }

    pub fn pending_acks(&self) -> usize {
        self.pending_acks.len()
    }

    /// Drop everything without reporting it.
    pub fn clear(&mut self) {
        self.pending_acks.clear();
        self.pending_timers.clear();
    }
}
