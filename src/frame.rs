//! SMPP v3.4 stream framing
//!
//! Turns an arbitrary byte stream into complete length-prefixed PDUs. No protocol semantics:
//! a frame is handed out as raw bytes and decoded by the codec's `PduRegistry`.

use crate::codec::MAX_PDU_SIZE;
use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Fatal framing errors. After one of these the stream can no longer be resynchronised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("declared frame length {length} is smaller than its own {min} octet length prefix")]
    TooShort { length: u32, min: usize },

    #[error("declared frame length {length} exceeds maximum of {max}")]
    TooLong { length: u32, max: usize },
}

/// Octets in the command_length prefix, which counts itself.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Streaming, restartable length-prefix accumulator.
///
/// `extend` appends whatever the socket produced; `next_frame` hands out at most one complete
/// frame per call and never assumes alignment with read boundaries. A frame shorter than a PDU
/// header is still handed out whole; rejecting it is the codec's job.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    max_frame_len: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            // Allocate the buffer with 4kb of capacity.
            buffer: BytesMut::with_capacity(4 * 1024),
            max_frame_len,
        }
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Remove one complete frame, length prefix included, if the buffer holds one.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        if self.buffer.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let declared = (&self.buffer[..LENGTH_PREFIX_SIZE]).get_u32();
        let length = declared as usize;

        if length < LENGTH_PREFIX_SIZE {
            return Err(FrameError::TooShort {
                length: declared,
                min: LENGTH_PREFIX_SIZE,
            });
        }
        if length > self.max_frame_len {
            return Err(FrameError::TooLong {
                length: declared,
                max: self.max_frame_len,
            });
        }

        if self.buffer.len() < length {
            return Ok(None);
        }

        Ok(Some(self.buffer.split_to(length).freeze()))
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(MAX_PDU_SIZE)
    }
}
