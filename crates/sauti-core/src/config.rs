//! Configuration types for the streaming playback pipeline

use serde::{Deserialize, Serialize};

/// Stream pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Size of the one-time leading metadata block in bytes
    #[serde(default = "default_header_len")]
    pub header_len: usize,

    /// Byte offset of the little-endian u32 sample-rate field in the header
    #[serde(default = "default_sample_rate_offset")]
    pub sample_rate_offset: usize,

    /// Number of amplitude samples the visualizer window retains
    #[serde(default = "default_visualizer_window")]
    pub visualizer_window: usize,

    /// Interval between visualizer render ticks in milliseconds
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            header_len: default_header_len(),
            sample_rate_offset: default_sample_rate_offset(),
            visualizer_window: default_visualizer_window(),
            render_interval_ms: default_render_interval_ms(),
        }
    }
}

fn default_header_len() -> usize {
    44
}

fn default_sample_rate_offset() -> usize {
    24
}

fn default_visualizer_window() -> usize {
    128
}

fn default_render_interval_ms() -> u64 {
    16
}
