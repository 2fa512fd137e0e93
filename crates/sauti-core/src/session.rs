//! Per-stream session wiring the byte pipeline to playback

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::{
    decode_pcm16, ChunkAccumulator, FinalizedAudio, HeaderExtractor, SampleAligner,
};
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::playback::{AnalysisTap, AudioBackend, PlaybackScheduler, PlaybackState};
use crate::visualizer::VisualizerFeed;

/// Cancellation handle shared with tasks observing a stream.
///
/// Clones share one flag. The flag starts true and flips false exactly
/// once, either through `cancel` or when the stream ends.
#[derive(Clone)]
pub struct StreamHandle {
    active: Arc<AtomicBool>,
}

impl StreamHandle {
    pub(crate) fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Request cancellation; the session winds down at the next chunk.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_inactive(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// One audio stream from first chunk to finalized artifact.
///
/// Chunks pass through accumulation, sample alignment, header extraction
/// and PCM decoding, and the decoded segments are scheduled for playback
/// as they appear. The session owns every pipeline stage; the driver owns
/// the transport.
pub struct StreamSession {
    id: Uuid,
    config: StreamConfig,
    aligner: SampleAligner,
    header: HeaderExtractor,
    accumulator: ChunkAccumulator,
    scheduler: PlaybackScheduler,
    handle: StreamHandle,
    started_at: Instant,
    samples_decoded: usize,
    chunks_received: usize,
}

impl StreamSession {
    pub fn new(config: StreamConfig, backend: Box<dyn AudioBackend>) -> Self {
        let id = Uuid::new_v4();
        let tap = AnalysisTap::new(config.visualizer_window * 8);
        let header = HeaderExtractor::new(config.header_len, config.sample_rate_offset);
        debug!("Stream session {} created", id);
        Self {
            id,
            config,
            aligner: SampleAligner::new(),
            header,
            accumulator: ChunkAccumulator::new(),
            scheduler: PlaybackScheduler::new(backend, tap),
            handle: StreamHandle::new(),
            started_at: Instant::now(),
            samples_decoded: 0,
            chunks_received: 0,
        }
    }

    /// Ingest one transport chunk.
    ///
    /// The raw chunk is retained for the final artifact before any
    /// processing. Playback starts on the chunk that completes the
    /// header; decoded samples from then on are scheduled immediately.
    pub fn on_chunk(&mut self, chunk: Bytes) -> Result<()> {
        if !self.handle.is_active() {
            return Err(Error::Cancelled);
        }
        self.chunks_received += 1;
        self.accumulator.append(chunk.clone());

        let span = self.aligner.push(&chunk);
        let (header, payload) = self.header.extract(span);
        if let Some(header) = header {
            self.scheduler.start(header.sample_rate)?;
        }
        if payload.is_empty() {
            return Ok(());
        }

        let segment = decode_pcm16(&payload);
        self.samples_decoded += segment.len();
        self.scheduler.schedule(&segment)
    }

    /// Complete the stream and produce the finalized artifact.
    ///
    /// Scheduled audio keeps playing; stopping the device is left to the
    /// caller once the queue drains.
    pub fn on_stream_end(&mut self) -> FinalizedAudio {
        self.handle.mark_inactive();
        self.aligner.finish();

        let sample_rate = self.header.header().map(|h| h.sample_rate);
        if sample_rate.is_none() {
            warn!(
                "Stream {} ended before a complete header: {} bytes total",
                self.id,
                self.accumulator.total_bytes()
            );
        }

        let generation_time = self.started_at.elapsed();
        let bytes = self.accumulator.finalize();
        info!(
            "Stream {} complete: {} chunks, {} samples in {:.2}s",
            self.id,
            self.chunks_received,
            self.samples_decoded,
            generation_time.as_secs_f64()
        );
        FinalizedAudio {
            bytes,
            sample_rate,
            samples_decoded: self.samples_decoded,
            generation_time,
        }
    }

    /// Fail the stream: tear down playback and surface the cause.
    pub fn on_stream_error(&mut self, reason: String) -> Error {
        warn!("Stream {} failed: {}", self.id, reason);
        self.abort();
        Error::Transport(reason)
    }

    /// Cancel-style teardown: stop playback and discard accumulated bytes.
    pub fn abort(&mut self) {
        self.handle.mark_inactive();
        self.scheduler.stop();
        self.accumulator.clear();
        debug!(
            "Stream {} aborted after {} chunks",
            self.id, self.chunks_received
        );
    }

    pub fn pause(&mut self) -> Result<()> {
        self.scheduler.pause()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.scheduler.resume()
    }

    /// Release the output device once playback is no longer wanted.
    pub fn stop_playback(&mut self) {
        self.scheduler.stop();
    }

    /// Amplitude renderer bound to this session's tap and lifetime.
    pub fn visualizer(&self) -> VisualizerFeed {
        VisualizerFeed::new(
            self.scheduler.tap(),
            self.handle.clone(),
            self.config.visualizer_window,
            Duration::from_millis(self.config.render_interval_ms),
        )
    }

    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    pub fn tap(&self) -> AnalysisTap {
        self.scheduler.tap()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// Scheduled audio not yet played out.
    pub fn pending_playback(&self) -> Duration {
        self.scheduler.pending()
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.scheduler.sample_rate()
    }

    pub fn samples_decoded(&self) -> usize {
        self.samples_decoded
    }

    pub fn chunks_received(&self) -> usize {
        self.chunks_received
    }
}
