//! Terminal presentation: spinner, live level meter, final summary

use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sauti_core::FinalizedAudio;

const METER_WIDTH: usize = 30;

/// How the player presents audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMode {
    /// Chunks arrive over an open connection; spinner, then live meter
    Live,
    /// The complete file arrives at once; spinner, then the summary
    Finalized,
}

/// Renders player state to the terminal. Meter and spinner go to stderr
/// so piped stdout stays clean.
#[derive(Clone)]
pub struct Presenter {
    mode: PlayerMode,
}

impl Presenter {
    pub fn new(mode: PlayerMode) -> Self {
        Self { mode }
    }

    pub fn is_live(&self) -> bool {
        self.mode == PlayerMode::Live
    }

    /// Spinner shown until audio is in hand.
    pub fn waiting_spinner(&self) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message(match self.mode {
            PlayerMode::Live => "Waiting for stream to start...",
            PlayerMode::Finalized => "Generating audio...",
        });
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Redraw the level meter in place from one window of samples.
    pub fn render_meter(&self, window: &[f32]) {
        let line = meter_line(peak_level(window), METER_WIDTH);
        eprint!("\r ▶ {} ", line);
        let _ = std::io::stderr().flush();
    }

    /// Blank the meter line before normal output resumes.
    pub fn clear_meter(&self) {
        eprint!("\r{}\r", " ".repeat(METER_WIDTH + 5));
        let _ = std::io::stderr().flush();
    }

    /// One-shot report once the artifact is in hand.
    pub fn summary(&self, artifact: &FinalizedAudio) {
        println!(
            "Generated {} bytes in {:.2}s",
            artifact.bytes.len(),
            artifact.generation_time.as_secs_f64()
        );
        if let (Some(rate), Some(duration)) = (artifact.sample_rate, artifact.audio_duration()) {
            println!(
                "Audio: {} samples at {} Hz ({})",
                artifact.samples_decoded,
                rate,
                format_clock(duration)
            );
        }
    }
}

/// Largest absolute sample in the window.
fn peak_level(window: &[f32]) -> f32 {
    window.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}

fn meter_line(level: f32, width: usize) -> String {
    let lit = (level.clamp(0.0, 1.0) * width as f32).round() as usize;
    let mut line = String::with_capacity(width * 3);
    for cell in 0..width {
        line.push(if cell < lit { '█' } else { '·' });
    }
    line
}

fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}
