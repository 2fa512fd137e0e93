//! Sauti Core - Streaming TTS Playback Engine
//!
//! This crate turns a chunked byte stream of headered 16-bit PCM into
//! live, gapless audio playback plus a finalized artifact for replay.
//!
//! # Architecture
//!
//! Chunks flow through a fixed pipeline:
//! - Sample alignment across arbitrary chunk boundaries
//! - One-time header extraction for the sample rate
//! - PCM decoding into normalized f32 samples
//! - Back-to-back scheduling on an injected output device
//! - Raw-byte accumulation for the post-stream artifact
//!
//! # Example
//!
//! ```ignore
//! use sauti_core::{driver, StreamConfig, StreamSession};
//!
//! let mut session = StreamSession::new(StreamConfig::default(), backend);
//! let artifact = driver::pump(&mut session, chunk_stream).await?;
//! println!("decoded {} samples", artifact.samples_decoded);
//! ```

pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod playback;
pub mod session;
pub mod visualizer;

// Re-export main types
pub use audio::{
    decode_pcm16, ChunkAccumulator, FinalizedAudio, HeaderExtractor, SampleAligner,
    SampleSegment, StreamHeader,
};
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use playback::{
    AnalysisTap, AudioBackend, AudioOutput, Placement, PlacementLog, PlaybackScheduler,
    PlaybackState, SimBackend, SimClock,
};
pub use session::{StreamHandle, StreamSession};
pub use visualizer::VisualizerFeed;
