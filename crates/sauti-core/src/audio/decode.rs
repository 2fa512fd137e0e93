//! PCM sample decoding and normalization

use std::time::Duration;

/// One decoded run of normalized samples, consumed by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSegment {
    pub samples: Vec<f32>,
}

impl SampleSegment {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration of this segment at the given sample rate.
    pub fn duration(&self, sample_rate: u32) -> Duration {
        if sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / sample_rate as f64)
    }
}

/// Decode an aligned span of little-endian 16-bit PCM into normalized f32.
///
/// Negative values divide by 32768 and non-negative values by 32767: the
/// full negative range is preserved and +1.0 is never exceeded.
pub fn decode_pcm16(span: &[u8]) -> SampleSegment {
    debug_assert!(span.len() % 2 == 0);
    let samples = span
        .chunks_exact(2)
        .map(|pair| {
            let value = i16::from_le_bytes([pair[0], pair[1]]);
            if value < 0 {
                f32::from(value) / 32768.0
            } else {
                f32::from(value) / 32767.0
            }
        })
        .collect();
    SampleSegment { samples }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_one_normalizes_over_32768() {
        let segment = decode_pcm16(&[0xFF, 0xFF]);
        assert_eq!(segment.samples, vec![-1.0 / 32768.0]);
    }

    #[test]
    fn positive_one_normalizes_over_32767() {
        let segment = decode_pcm16(&[0x01, 0x00]);
        assert_eq!(segment.samples, vec![1.0 / 32767.0]);
    }

    #[test]
    fn extremes_map_to_unit_range() {
        let segment = decode_pcm16(&[0x00, 0x80, 0xFF, 0x7F]);
        assert_eq!(segment.samples, vec![-1.0, 1.0]);
    }

    #[test]
    fn zero_is_zero() {
        let segment = decode_pcm16(&[0x00, 0x00]);
        assert_eq!(segment.samples, vec![0.0]);
    }

    #[test]
    fn decode_is_deterministic() {
        let span: Vec<u8> = (0..64u8).collect();
        assert_eq!(decode_pcm16(&span), decode_pcm16(&span));
        assert_eq!(decode_pcm16(&span).len(), 32);
    }

    #[test]
    fn empty_span_decodes_to_nothing() {
        assert!(decode_pcm16(&[]).is_empty());
    }

    #[test]
    fn duration_follows_sample_rate() {
        let segment = decode_pcm16(&[0u8; 48000]);
        assert_eq!(segment.duration(24000), Duration::from_secs(1));
    }
}
