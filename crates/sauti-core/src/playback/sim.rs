//! Simulated output device with a controllable clock

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::playback::sink::{AudioBackend, AudioOutput};

/// Clock backing a simulated device. Clones share one time source.
#[derive(Clone)]
pub struct SimClock {
    inner: Arc<Mutex<ClockInner>>,
}

enum ClockInner {
    Monotonic(Instant),
    Manual(Duration),
}

impl SimClock {
    /// Clock that follows real time from the moment of creation.
    pub fn monotonic() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner::Monotonic(Instant::now()))),
        }
    }

    /// Clock that only moves when `advance` is called.
    pub fn manual() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner::Manual(Duration::ZERO))),
        }
    }

    pub fn now(&self) -> Duration {
        match *self.inner.lock().unwrap() {
            ClockInner::Monotonic(origin) => origin.elapsed(),
            ClockInner::Manual(now) => now,
        }
    }

    /// Move a manual clock forward. Monotonic clocks ignore this.
    pub fn advance(&self, by: Duration) {
        if let ClockInner::Manual(ref mut now) = *self.inner.lock().unwrap() {
            *now += by;
        }
    }
}

/// One write accepted by a simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Device-clock time the audio begins
    pub start: Duration,
    /// Length of the placed audio
    pub duration: Duration,
    /// Number of samples placed
    pub samples: usize,
}

/// Shared record of every placement a simulated device accepted.
#[derive(Clone, Default)]
pub struct PlacementLog {
    entries: Arc<Mutex<Vec<Placement>>>,
}

impl PlacementLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, placement: Placement) {
        self.entries.lock().unwrap().push(placement);
    }

    pub fn entries(&self) -> Vec<Placement> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

/// Backend producing simulated devices, for tests and headless runs.
pub struct SimBackend {
    clock: SimClock,
    log: PlacementLog,
    available: bool,
}

impl SimBackend {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            log: PlacementLog::new(),
            available: true,
        }
    }

    /// Backend whose device refuses to open, for failure-path tests.
    pub fn unavailable() -> Self {
        Self {
            clock: SimClock::manual(),
            log: PlacementLog::new(),
            available: false,
        }
    }

    /// Handle onto the placement record shared with opened devices.
    pub fn log(&self) -> PlacementLog {
        self.log.clone()
    }
}

impl AudioBackend for SimBackend {
    fn open(&mut self, sample_rate: u32) -> Result<Box<dyn AudioOutput>> {
        if !self.available {
            return Err(Error::OutputUnavailable(
                "Simulated device is absent".to_string(),
            ));
        }
        Ok(Box::new(SimOutput {
            clock: self.clock.clone(),
            log: self.log.clone(),
            sample_rate,
            paused_at: None,
            paused_total: Duration::ZERO,
        }))
    }
}

/// Device that records placements instead of producing sound.
///
/// The position is the shared clock minus all time spent paused, so
/// pausing freezes it exactly like a hardware stream clock.
struct SimOutput {
    clock: SimClock,
    log: PlacementLog,
    sample_rate: u32,
    paused_at: Option<Duration>,
    paused_total: Duration,
}

impl AudioOutput for SimOutput {
    fn position(&self) -> Duration {
        let now = self.paused_at.unwrap_or_else(|| self.clock.now());
        now.saturating_sub(self.paused_total)
    }

    fn write_at(&mut self, samples: &[f32], start: Duration) -> Result<()> {
        let duration = Duration::from_secs_f64(samples.len() as f64 / self.sample_rate as f64);
        self.log.record(Placement {
            start,
            duration,
            samples: samples.len(),
        });
        Ok(())
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.clock.now());
        }
    }

    fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += self.clock.now().saturating_sub(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_on_advance() {
        let clock = SimClock::manual();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn pause_freezes_the_position() {
        let clock = SimClock::manual();
        let mut backend = SimBackend::new(clock.clone());
        let mut output = backend.open(1000).unwrap();

        clock.advance(Duration::from_secs(5));
        output.pause();
        clock.advance(Duration::from_secs(4));
        assert_eq!(output.position(), Duration::from_secs(5));

        output.resume();
        clock.advance(Duration::from_secs(3));
        assert_eq!(output.position(), Duration::from_secs(8));
    }

    #[test]
    fn placements_are_recorded_in_order() {
        let mut backend = SimBackend::new(SimClock::manual());
        let log = backend.log();
        let mut output = backend.open(1000).unwrap();

        output.write_at(&[0.0; 125], Duration::ZERO).unwrap();
        output
            .write_at(&[0.0; 250], Duration::from_millis(125))
            .unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].duration, Duration::from_millis(125));
        assert_eq!(entries[1].start, Duration::from_millis(125));
        assert_eq!(entries[1].samples, 250);
    }

    #[test]
    fn unavailable_backend_refuses_to_open() {
        let mut backend = SimBackend::unavailable();
        assert!(matches!(
            backend.open(24000),
            Err(Error::OutputUnavailable(_))
        ));
    }
}
