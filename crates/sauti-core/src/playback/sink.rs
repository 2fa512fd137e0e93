//! Output device seam between the scheduler and concrete audio hardware

use std::time::Duration;

use crate::error::Result;

/// An open output device with its own playback clock.
///
/// Positions and start times are measured on the device clock, which
/// begins when the device opens and freezes while paused.
pub trait AudioOutput {
    /// Current position of the device clock.
    fn position(&self) -> Duration;

    /// Queue normalized samples to begin exactly at `start` on the device
    /// clock. `start` never precedes the current position.
    fn write_at(&mut self, samples: &[f32], start: Duration) -> Result<()>;

    /// Freeze the device clock, holding queued audio in place.
    fn pause(&mut self);

    /// Unfreeze the device clock.
    fn resume(&mut self);
}

/// Source of output devices, injected into the scheduler.
pub trait AudioBackend {
    /// Open a device playing mono samples at the given rate.
    fn open(&mut self, sample_rate: u32) -> Result<Box<dyn AudioOutput>>;
}
