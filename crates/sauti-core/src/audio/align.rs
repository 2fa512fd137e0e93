//! Sample alignment across arbitrary chunk boundaries

use bytes::{Bytes, BytesMut};
use tracing::debug;

/// Reassembles sample-aligned byte spans from arbitrarily split chunks.
///
/// Transport chunks can end mid-sample. The aligner holds the dangling
/// byte until the next chunk arrives and only ever emits spans whose
/// length is a whole number of 16-bit samples.
pub struct SampleAligner {
    carry: Option<u8>,
}

impl SampleAligner {
    pub fn new() -> Self {
        Self { carry: None }
    }

    /// Absorb one chunk and return the longest aligned span available.
    ///
    /// The returned span is always of even length. When the carried byte
    /// plus the chunk come to an odd total, the final byte is held back
    /// for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Bytes {
        let mut combined = BytesMut::with_capacity(chunk.len() + 1);
        if let Some(byte) = self.carry.take() {
            combined.extend_from_slice(&[byte]);
        }
        combined.extend_from_slice(chunk);

        if combined.len() % 2 != 0 {
            let tail = combined.split_off(combined.len() - 1);
            self.carry = Some(tail[0]);
        }
        combined.freeze()
    }

    /// End of stream: discard any dangling byte.
    ///
    /// A stream whose payload has odd total length loses its final byte
    /// here; half a sample cannot be decoded.
    pub fn finish(&mut self) {
        if let Some(byte) = self.carry.take() {
            debug!("Dropping unpaired trailing byte 0x{:02x}", byte);
        }
    }

    /// Whether a byte is currently held back.
    pub fn has_carry(&self) -> bool {
        self.carry.is_some()
    }
}

impl Default for SampleAligner {
    fn default() -> Self {
        Self::new()
    }
}
