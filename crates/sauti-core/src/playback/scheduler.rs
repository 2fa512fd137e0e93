//! Gapless placement of decoded segments on a device timeline

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::audio::SampleSegment;
use crate::error::{Error, Result};
use crate::playback::sink::{AudioBackend, AudioOutput};
use crate::playback::tap::AnalysisTap;

/// Lifecycle of a playback timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No device open
    Idle,
    /// Device open, clock running
    Active,
    /// Device open, clock frozen
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Active => write!(f, "active"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

struct Timeline {
    output: Box<dyn AudioOutput>,
    sample_rate: u32,
    next_start: Duration,
    paused: bool,
    segments_placed: usize,
    samples_placed: usize,
}

/// Places segments back to back on an output device.
///
/// Each segment starts at the later of the end of the previous one and
/// the current device position, so continuous arrivals play seamlessly
/// and an underrun restarts cleanly instead of scheduling into the past.
pub struct PlaybackScheduler {
    backend: Box<dyn AudioBackend>,
    tap: AnalysisTap,
    timeline: Option<Timeline>,
}

impl PlaybackScheduler {
    pub fn new(backend: Box<dyn AudioBackend>, tap: AnalysisTap) -> Self {
        Self {
            backend,
            tap,
            timeline: None,
        }
    }

    /// Open the output device and begin an empty timeline.
    pub fn start(&mut self, sample_rate: u32) -> Result<()> {
        if self.timeline.is_some() {
            return Err(Error::InvalidState("playback already started"));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidState("sample rate must be nonzero"));
        }
        let output = self.backend.open(sample_rate)?;
        let next_start = output.position();
        self.timeline = Some(Timeline {
            output,
            sample_rate,
            next_start,
            paused: false,
            segments_placed: 0,
            samples_placed: 0,
        });
        info!("Playback started at {} Hz", sample_rate);
        Ok(())
    }

    /// Place a segment immediately after everything already scheduled.
    pub fn schedule(&mut self, segment: &SampleSegment) -> Result<()> {
        let timeline = self
            .timeline
            .as_mut()
            .ok_or(Error::InvalidState("playback not started"))?;
        if segment.is_empty() {
            return Ok(());
        }

        let position = timeline.output.position();
        let start = timeline.next_start.max(position);
        if timeline.segments_placed > 0 && timeline.next_start < position {
            debug!(
                "Playback underrun: queue ran dry at {:?}, restarting at {:?}",
                timeline.next_start, position
            );
        }

        timeline.output.write_at(&segment.samples, start)?;
        timeline.next_start = start + segment.duration(timeline.sample_rate);
        timeline.segments_placed += 1;
        timeline.samples_placed += segment.len();
        self.tap.push(&segment.samples);
        Ok(())
    }

    /// Freeze the device clock. Scheduling may continue while paused.
    pub fn pause(&mut self) -> Result<()> {
        let timeline = self
            .timeline
            .as_mut()
            .ok_or(Error::InvalidState("playback not started"))?;
        if timeline.paused {
            return Ok(());
        }
        timeline.output.pause();
        timeline.paused = true;
        info!("Playback paused");
        Ok(())
    }

    /// Unfreeze the device clock; queued audio picks up where it stopped.
    pub fn resume(&mut self) -> Result<()> {
        let timeline = self
            .timeline
            .as_mut()
            .ok_or(Error::InvalidState("playback not started"))?;
        if !timeline.paused {
            return Ok(());
        }
        timeline.output.resume();
        timeline.paused = false;
        info!("Playback resumed");
        Ok(())
    }

    /// Release the device and return to idle. Safe to call when idle.
    pub fn stop(&mut self) {
        if let Some(timeline) = self.timeline.take() {
            info!(
                "Playback stopped: {} segments, {} samples placed",
                timeline.segments_placed, timeline.samples_placed
            );
        }
        self.tap.clear();
    }

    pub fn state(&self) -> PlaybackState {
        match &self.timeline {
            None => PlaybackState::Idle,
            Some(timeline) if timeline.paused => PlaybackState::Paused,
            Some(_) => PlaybackState::Active,
        }
    }

    /// Current device position, if a device is open.
    pub fn position(&self) -> Option<Duration> {
        self.timeline.as_ref().map(|t| t.output.position())
    }

    /// Where the next segment would land on the device clock.
    pub fn next_start(&self) -> Option<Duration> {
        self.timeline.as_ref().map(|t| t.next_start)
    }

    /// Scheduled audio not yet played out.
    pub fn pending(&self) -> Duration {
        match &self.timeline {
            Some(timeline) => timeline.next_start.saturating_sub(timeline.output.position()),
            None => Duration::ZERO,
        }
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.timeline.as_ref().map(|t| t.sample_rate)
    }

    pub fn tap(&self) -> AnalysisTap {
        self.tap.clone()
    }
}
