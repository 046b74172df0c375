use std::fmt;

/// Bind state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unbound,
    Bound,
}

impl SessionState {
    pub fn is_bound(&self) -> bool {
        matches!(self, SessionState::Bound)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unbound => write!(f, "unbound"),
            SessionState::Bound => write!(f, "bound"),
        }
    }
}

/// Transport health, checked by the keepalive tick and by every send.
///
/// Moves only forward: `Healthy` to `Errored` to `Closed`, or straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    #[default]
    Healthy,
    Errored,
    Closed,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }

    /// Advance to `next`, refusing to move backwards.
    pub(crate) fn advance(&mut self, next: Health) {
        if next as u8 > *self as u8 {
            *self = next;
        }
    }
}
