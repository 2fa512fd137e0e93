//! Audio output using cpal

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use sauti_core::{AudioBackend, AudioOutput, Error, Result};
use tracing::{debug, info, warn};

/// Samples queued for the device callback.
///
/// `written` is the device-clock frame where queued audio ends. The
/// callback feeds frames to the device from the front and emits silence
/// when the queue runs dry, so the frame counter keeps advancing through
/// an underrun exactly like the hardware clock it mirrors.
struct Shared {
    queue: VecDeque<f32>,
    written: u64,
}

/// Queue bookkeeping for one write: the silent frames to insert ahead of
/// the samples, and the frame where queued audio will end afterwards.
///
/// `played` can run past `written` after an underrun; new audio can never
/// land before either of them.
fn placement(written: u64, played: u64, start: u64, len: u64) -> (u64, u64) {
    let base = written.max(played);
    let target = start.max(base);
    (target - base, target + len)
}

/// Backend producing devices from the host's default output.
pub struct CpalBackend {
    device: Device,
}

impl CpalBackend {
    pub fn default_device() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::OutputUnavailable("No output device available".to_string()))?;
        if let Ok(name) = device.name() {
            debug!("Using output device: {}", name);
        }
        Ok(Self { device })
    }

    /// Pick a supported config at the exact sample rate, preferring the
    /// fewest channels and f32 samples. The stream rate is not negotiable;
    /// resampling is the service's job.
    fn pick_config(&self, sample_rate: u32) -> Result<cpal::SupportedStreamConfig> {
        let mut candidates: Vec<_> = self
            .device
            .supported_output_configs()
            .map_err(|e| Error::OutputUnavailable(format!("Failed to get device configs: {}", e)))?
            .filter(|config| {
                config.min_sample_rate().0 <= sample_rate
                    && config.max_sample_rate().0 >= sample_rate
            })
            .collect();
        candidates.sort_by_key(|config| {
            (config.channels(), config.sample_format() != SampleFormat::F32)
        });

        candidates
            .into_iter()
            .next()
            .map(|config| config.with_sample_rate(SampleRate(sample_rate)))
            .ok_or_else(|| {
                Error::OutputUnavailable(format!("No output config supports {} Hz", sample_rate))
            })
    }
}

impl AudioBackend for CpalBackend {
    fn open(&mut self, sample_rate: u32) -> Result<Box<dyn AudioOutput>> {
        let supported = self.pick_config(sample_rate)?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();

        let shared = Arc::new(Mutex::new(Shared {
            queue: VecDeque::new(),
            written: 0,
        }));
        let played = Arc::new(AtomicU64::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&self.device, &config, shared.clone(), played.clone())?
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&self.device, &config, shared.clone(), played.clone())?
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&self.device, &config, shared.clone(), played.clone())?
            }
            format => {
                return Err(Error::OutputUnavailable(format!(
                    "Unsupported sample format: {:?}",
                    format
                )))
            }
        };
        stream
            .play()
            .map_err(|e| Error::OutputUnavailable(format!("Failed to start stream: {}", e)))?;
        info!(
            "Output device open: {} Hz, {} channels, {:?}",
            sample_rate, config.channels, sample_format
        );

        Ok(Box::new(CpalOutput {
            stream,
            shared,
            played,
            sample_rate,
        }))
    }
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    shared: Arc<Mutex<Shared>>,
    played: Arc<AtomicU64>,
) -> Result<Stream> {
    let channels = config.channels as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut shared = shared.lock().unwrap();
                for frame in data.chunks_mut(channels) {
                    let value = shared.queue.pop_front().unwrap_or(0.0);
                    for slot in frame.iter_mut() {
                        *slot = T::from_sample(value);
                    }
                    played.fetch_add(1, Ordering::Relaxed);
                }
            },
            move |err| {
                warn!("Audio output error: {}", err);
            },
            None,
        )
        .map_err(|e| Error::OutputUnavailable(format!("Failed to build output stream: {}", e)))
}

/// An open cpal stream plus the mono frame queue feeding it.
struct CpalOutput {
    stream: Stream,
    shared: Arc<Mutex<Shared>>,
    played: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioOutput for CpalOutput {
    fn position(&self) -> Duration {
        let played = self.played.load(Ordering::Relaxed);
        Duration::from_secs_f64(played as f64 / self.sample_rate as f64)
    }

    fn write_at(&mut self, samples: &[f32], start: Duration) -> Result<()> {
        let start_frame = (start.as_secs_f64() * self.sample_rate as f64).round() as u64;
        let played = self.played.load(Ordering::Relaxed);

        let mut shared = self.shared.lock().unwrap();
        let (silence, written) = placement(
            shared.written,
            played,
            start_frame,
            samples.len() as u64,
        );
        for _ in 0..silence {
            shared.queue.push_back(0.0);
        }
        shared.queue.extend(samples.iter().copied());
        shared.written = written;
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause output stream: {}", e);
        }
    }

    fn resume(&mut self) {
        if let Err(e) = self.stream.play() {
            warn!("Failed to resume output stream: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_to_back_writes_need_no_silence() {
        assert_eq!(placement(1000, 400, 1000, 500), (0, 1500));
    }

    #[test]
    fn first_write_on_a_late_clock_starts_now() {
        assert_eq!(placement(0, 300, 300, 100), (0, 400));
    }

    #[test]
    fn a_gap_is_padded_with_silence() {
        assert_eq!(placement(1000, 400, 1200, 100), (200, 1300));
    }

    #[test]
    fn underrun_resyncs_to_the_played_frame() {
        assert_eq!(placement(1000, 1500, 1600, 200), (100, 1800));
    }

    #[test]
    fn a_start_in_the_past_clamps_forward() {
        assert_eq!(placement(1000, 400, 900, 100), (0, 1100));
    }
}
