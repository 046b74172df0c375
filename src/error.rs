// ABOUTME: SMPP client error types for every public operation of the session and its driver
// ABOUTME: Wraps I/O, codec and framing failures and the synchronous invalid-state refusal

use crate::codec::CodecError;
use crate::datatypes::CommandStatus;
use crate::frame::FrameError;
use std::io;
use thiserror::Error;

/// Error type for SMPP client operations
///
/// Only `InvalidState` and `InvalidData` are ever returned by the send API; everything that
/// happens after a PDU leaves is reported through the session delegate.
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// PDU could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The byte stream could not be split into frames
    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),

    /// SMPP protocol error indicated by command_status field
    #[error("Protocol error: {0:?}")]
    Protocol(CommandStatus),

    /// Data validation error (message too long to segment, malformed addresses, etc.)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// Connection closed, or the driver task is gone
    #[error("Connection closed")]
    ConnectionClosed,

    /// Session not in correct state for operation
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;
