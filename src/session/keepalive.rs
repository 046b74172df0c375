// ABOUTME: Periodic enquire_link scheduling for a transceiver session
// ABOUTME: Decides on each tick whether to probe, skip or tear down, and keeps probe statistics

use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for the enquire_link keepalive
///
/// ```rust
/// use smpp_transceiver::KeepAliveConfig;
/// use std::time::Duration;
///
/// let config = KeepAliveConfig::new(Duration::from_secs(60));
/// assert!(config.enabled);
///
/// let config = KeepAliveConfig::disabled();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Interval between ticks (default: 30 seconds)
    pub interval: Duration,

    /// When false the timer never runs and no probe is sent
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Per-tick veto. Returning `false` skips the probe; the schedule is unaffected.
pub type KeepAliveHook = Box<dyn FnMut() -> bool + Send>;

/// Snapshot of keepalive statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepAliveStatus {
    /// Timer armed
    pub running: bool,
    /// enquire_link requests sent by the scheduler
    pub total_pings: u32,
    /// enquire_link_resp received
    pub total_pongs: u32,
    /// Ticks that sent nothing, unbound or vetoed
    pub skipped_ticks: u32,
}

/// Outcome of one keepalive tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Bound and healthy: send an enquire_link.
    Probe,
    /// Unbound or vetoed by the hook.
    Skip,
    /// Transport is broken: stop and close the connection.
    Close,
}

/// Single repeating timer driven by injected instants.
pub struct KeepAliveScheduler {
    config: KeepAliveConfig,
    hook: Option<KeepAliveHook>,
    next_tick: Option<Instant>,
    total_pings: u32,
    total_pongs: u32,
    skipped_ticks: u32,
}

impl fmt::Debug for KeepAliveScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeepAliveScheduler")
            .field("config", &self.config)
            .field("hook", &self.hook.is_some())
            .field("next_tick", &self.next_tick)
            .finish()
    }
}

impl KeepAliveScheduler {
    pub fn new(config: KeepAliveConfig) -> Self {
        Self {
            config,
            hook: None,
            next_tick: None,
            total_pings: 0,
            total_pongs: 0,
            skipped_ticks: 0,
        }
    }

    pub fn set_hook(&mut self, hook: KeepAliveHook) {
        self.hook = Some(hook);
    }

    /// Arm the timer one interval after `now`. No-op when disabled.
    pub fn start(&mut self, now: Instant) {
        if self.config.enabled {
            self.next_tick = Some(now + self.config.interval);
        }
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Run the tick if its deadline has passed. `None` when not yet due or not running.
    pub fn poll(&mut self, now: Instant, healthy: bool, bound: bool) -> Option<Tick> {
        let deadline = self.next_tick?;
        if now < deadline {
            return None;
        }

        if !healthy {
            self.stop();
            return Some(Tick::Close);
        }

        self.next_tick = Some(now + self.config.interval);

        if !bound {
            debug!("keepalive tick while unbound, skipping probe");
            self.skipped_ticks += 1;
            return Some(Tick::Skip);
        }

        if let Some(hook) = self.hook.as_mut() {
            if !hook() {
                debug!("keepalive probe vetoed by hook");
                self.skipped_ticks += 1;
                return Some(Tick::Skip);
            }
        }

        Some(Tick::Probe)
    }

    pub fn on_ping_sent(&mut self) {
        self.total_pings += 1;
        debug!(total = self.total_pings, "enquire_link sent");
    }

    pub fn on_pong(&mut self) {
        self.total_pongs += 1;
    }

    pub fn status(&self) -> KeepAliveStatus {
        KeepAliveStatus {
            running: self.next_tick.is_some(),
            total_pings: self.total_pings,
            total_pongs: self.total_pongs,
            skipped_ticks: self.skipped_ticks,
        }
    }
}
