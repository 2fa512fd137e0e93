//! Raw-chunk accumulation and the finalized audio artifact

use std::io::Cursor;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::{Error, Result};

/// Collects every raw chunk in arrival order for post-stream replay.
///
/// Chunks go in exactly as received, header bytes included; nothing is
/// reordered or transformed. Finalizing concatenates the lot and starts
/// the accumulator over.
pub struct ChunkAccumulator {
    parts: Vec<Bytes>,
    total_bytes: usize,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            total_bytes: 0,
        }
    }

    /// Append one raw chunk exactly as received.
    pub fn append(&mut self, chunk: Bytes) {
        self.total_bytes += chunk.len();
        self.parts.push(chunk);
    }

    /// Number of chunks retained so far.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total bytes retained so far.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Concatenate everything received into one artifact and reset.
    pub fn finalize(&mut self) -> Bytes {
        let mut joined = BytesMut::with_capacity(self.total_bytes);
        for part in self.parts.drain(..) {
            joined.extend_from_slice(&part);
        }
        self.total_bytes = 0;
        debug!("Finalized artifact: {} bytes", joined.len());
        joined.freeze()
    }

    /// Drop everything retained without producing an artifact.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.total_bytes = 0;
    }
}

impl Default for ChunkAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a completed stream.
#[derive(Debug, Clone)]
pub struct FinalizedAudio {
    /// Complete artifact bytes in arrival order, header included
    pub bytes: Bytes,
    /// Sample rate from the stream header, None if it never completed
    pub sample_rate: Option<u32>,
    /// Number of samples decoded over the stream's lifetime
    pub samples_decoded: usize,
    /// Wall-clock time from session start to stream end
    pub generation_time: Duration,
}

impl FinalizedAudio {
    /// Build a finalized artifact from a complete WAV body, for the
    /// non-streaming path where the whole file arrives at once.
    pub fn from_wav(bytes: Bytes, generation_time: Duration) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(bytes.as_ref()))
            .map_err(|e| Error::Artifact(format!("Failed to parse WAV body: {}", e)))?;
        let spec = reader.spec();
        let samples_decoded = reader.duration() as usize;
        Ok(Self {
            bytes,
            sample_rate: Some(spec.sample_rate),
            samples_decoded,
            generation_time,
        })
    }

    /// Audio duration implied by the decoded sample count.
    pub fn audio_duration(&self) -> Option<Duration> {
        match self.sample_rate {
            Some(rate) if rate > 0 => Some(Duration::from_secs_f64(
                self.samples_decoded as f64 / rate as f64,
            )),
            _ => None,
        }
    }

    /// Decode the artifact's WAV container into normalized samples, for
    /// seekable post-hoc replay.
    pub fn decoded_samples(&self) -> Result<Vec<f32>> {
        let mut reader = hound::WavReader::new(Cursor::new(self.bytes.as_ref()))
            .map_err(|e| Error::Artifact(format!("Failed to parse WAV artifact: {}", e)))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .filter_map(|s| s.ok())
                    .map(|s| s as f32 / max_val)
                    .collect()
            }
            hound::SampleFormat::Float => reader.samples::<f32>().filter_map(|s| s.ok()).collect(),
        };

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_fixture(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn finalize_equals_concatenation() {
        let chunks: Vec<&[u8]> = vec![&[1, 2, 3], &[4], &[], &[5, 6]];
        let mut accumulator = ChunkAccumulator::new();
        for chunk in &chunks {
            accumulator.append(Bytes::copy_from_slice(chunk));
        }
        assert_eq!(accumulator.len(), 4);
        assert_eq!(accumulator.total_bytes(), 6);

        let artifact = accumulator.finalize();
        assert_eq!(&artifact[..], &[1, 2, 3, 4, 5, 6]);
        assert!(accumulator.is_empty());
        assert!(accumulator.finalize().is_empty());
    }

    #[test]
    fn clear_discards_without_an_artifact() {
        let mut accumulator = ChunkAccumulator::new();
        accumulator.append(Bytes::from_static(&[1, 2]));
        accumulator.clear();
        assert!(accumulator.is_empty());
        assert_eq!(accumulator.total_bytes(), 0);
    }

    #[test]
    fn from_wav_reads_rate_and_sample_count() {
        let wav = wav_fixture(24000, &[0, 100, -100, 32767]);
        let artifact =
            FinalizedAudio::from_wav(Bytes::from(wav), Duration::from_millis(500)).unwrap();
        assert_eq!(artifact.sample_rate, Some(24000));
        assert_eq!(artifact.samples_decoded, 4);
    }

    #[test]
    fn from_wav_rejects_garbage() {
        let result = FinalizedAudio::from_wav(Bytes::from_static(&[0u8; 16]), Duration::ZERO);
        assert!(matches!(result, Err(Error::Artifact(_))));
    }

    #[test]
    fn decoded_samples_round_trip() {
        let wav = wav_fixture(22050, &[0, 16384, -16384]);
        let artifact = FinalizedAudio {
            bytes: Bytes::from(wav),
            sample_rate: Some(22050),
            samples_decoded: 3,
            generation_time: Duration::ZERO,
        };
        let samples = artifact.decoded_samples().unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 0.5);
        assert_eq!(samples[2], -0.5);
    }

    #[test]
    fn audio_duration_needs_a_sample_rate() {
        let artifact = FinalizedAudio {
            bytes: Bytes::new(),
            sample_rate: None,
            samples_decoded: 0,
            generation_time: Duration::ZERO,
        };
        assert_eq!(artifact.audio_duration(), None);

        let artifact = FinalizedAudio {
            sample_rate: Some(24000),
            samples_decoded: 12000,
            ..artifact
        };
        assert_eq!(artifact.audio_duration(), Some(Duration::from_millis(500)));
    }
}
