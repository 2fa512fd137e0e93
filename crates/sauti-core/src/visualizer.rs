//! Fixed-cadence amplitude windows for rendering

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::playback::AnalysisTap;
use crate::session::StreamHandle;

/// Pulls sample windows off a session's tap at a fixed cadence.
///
/// Runs until the session goes inactive; the activity check happens at
/// the top of every tick, before any samples are read, so a cancelled
/// or completed stream stops the renderer within one interval.
pub struct VisualizerFeed {
    tap: AnalysisTap,
    handle: StreamHandle,
    window: usize,
    interval: Duration,
}

impl VisualizerFeed {
    pub(crate) fn new(
        tap: AnalysisTap,
        handle: StreamHandle,
        window: usize,
        interval: Duration,
    ) -> Self {
        Self {
            tap,
            handle,
            window,
            interval,
        }
    }

    /// Render until the stream goes inactive. Ticks with no samples
    /// available are skipped rather than rendered as silence.
    pub async fn run<F>(self, mut render: F)
    where
        F: FnMut(&[f32]),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames = 0usize;
        loop {
            ticker.tick().await;
            if !self.handle.is_active() {
                break;
            }
            let window = self.tap.drain(self.window);
            if window.is_empty() {
                continue;
            }
            frames += 1;
            render(&window);
        }
        debug!("Visualizer stopped after {} frames", frames);
    }
}
