// ABOUTME: Immutable connection parameters for one transceiver session
// ABOUTME: Credentials, numbering, timers and segmentation defaults with fluent setters

use crate::codec::MAX_PDU_SIZE;
use crate::datatypes::{BindTransceiver, InterfaceVersion, NumericPlanIndicator, TypeOfNumber};
use crate::segmentation::UdhLayout;
use crate::session::KeepAliveConfig;
use std::time::Duration;

/// Default window for a response to any request.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a transceiver session
///
/// ```rust
/// use smpp_transceiver::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("esme01", "secret")
///     .with_system_type("VMA")
///     .with_response_timeout(Duration::from_secs(5));
/// assert_eq!(config.system_id, "esme01");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identifies this ESME to the SMSC (max 15 characters)
    pub system_id: String,
    /// Max 8 characters
    pub password: String,
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    /// TON of the source address on submits, also sent as `addr_ton` in the bind
    pub source_addr_ton: TypeOfNumber,
    /// NPI of the source address on submits, also sent as `addr_npi` in the bind
    pub source_addr_npi: NumericPlanIndicator,
    pub address_range: String,
    /// How long any request may wait for its response
    pub response_timeout: Duration,
    pub keep_alive: KeepAliveConfig,
    /// UDH layout for segmented messages unless a message overrides it
    pub udh_layout: UdhLayout,
    /// Upper bound on a declared command_length
    pub max_frame_len: usize,
    /// Treat a submit response with no pending request as fatal
    pub strict_correlation: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: InterfaceVersion::SmppV34,
            source_addr_ton: TypeOfNumber::Unknown,
            source_addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            keep_alive: KeepAliveConfig::default(),
            udh_layout: UdhLayout::default(),
            max_frame_len: MAX_PDU_SIZE,
            strict_correlation: false,
        }
    }
}

impl SessionConfig {
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn with_source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.source_addr_ton = ton;
        self.source_addr_npi = npi;
        self
    }

    pub fn with_address_range(mut self, address_range: impl Into<String>) -> Self {
        self.address_range = address_range.into();
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Interval between enquire_link probes
    pub fn with_enquire_link_interval(mut self, interval: Duration) -> Self {
        self.keep_alive.interval = interval;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_udh_layout(mut self, layout: UdhLayout) -> Self {
        self.udh_layout = layout;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_strict_correlation(mut self, strict: bool) -> Self {
        self.strict_correlation = strict;
        self
    }

    /// The bind_transceiver request these credentials produce.
    pub fn bind_pdu(&self, sequence_number: u32) -> BindTransceiver {
        BindTransceiver {
            command_status: crate::datatypes::CommandStatus::Ok,
            sequence_number,
            system_id: self.system_id.clone(),
            password: self.password.clone(),
            system_type: self.system_type.clone(),
            interface_version: self.interface_version,
            addr_ton: self.source_addr_ton,
            addr_npi: self.source_addr_npi,
            address_range: self.address_range.clone(),
        }
    }
}
