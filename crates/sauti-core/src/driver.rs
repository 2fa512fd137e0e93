//! Drives a chunk stream through a session to completion

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::audio::FinalizedAudio;
use crate::error::{Error, Result};
use crate::session::StreamSession;

/// Feed every chunk of `stream` through the session in arrival order.
///
/// Resolves with the finalized artifact when the transport ends cleanly.
/// A transport error or a failed chunk tears the session down and
/// returns the cause; cancellation is honored between chunks and
/// returns `Error::Cancelled`.
pub async fn pump<S>(session: &mut StreamSession, mut stream: S) -> Result<FinalizedAudio>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    while let Some(next) = stream.next().await {
        if !session.handle().is_active() {
            debug!("Stream {} cancelled by caller", session.id());
            session.abort();
            return Err(Error::Cancelled);
        }
        match next {
            Ok(chunk) => {
                if let Err(e) = session.on_chunk(chunk) {
                    session.abort();
                    return Err(e);
                }
            }
            Err(e) => return Err(session.on_stream_error(e.to_string())),
        }
    }

    if !session.handle().is_active() {
        session.abort();
        return Err(Error::Cancelled);
    }
    Ok(session.on_stream_end())
}

/// Wait until everything scheduled has played out on the device clock.
///
/// Progress depends on the device clock running; a caller that pauses
/// playback must resume it, or race this against its own shutdown
/// signal.
pub async fn drain(session: &StreamSession) {
    loop {
        let pending = session.pending_playback();
        if pending.is_zero() {
            return;
        }
        tokio::time::sleep(pending.min(Duration::from_millis(50))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::playback::{PlaybackState, PlacementLog, SimBackend, SimClock};

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio_stream::wrappers::ReceiverStream;

    fn header_chunk(sample_rate: u32) -> Bytes {
        let mut block = vec![0u8; 44];
        block[24..28].copy_from_slice(&sample_rate.to_le_bytes());
        Bytes::from(block)
    }

    fn sim_session() -> (StreamSession, PlacementLog) {
        let backend = SimBackend::new(SimClock::manual());
        let log = backend.log();
        let session = StreamSession::new(StreamConfig::default(), Box::new(backend));
        (session, log)
    }

    #[tokio::test]
    async fn pump_runs_a_stream_to_the_artifact() {
        let (mut session, log) = sim_session();
        let chunks = vec![
            Ok(header_chunk(16000)),
            Ok(Bytes::from(vec![0u8; 100])),
            Ok(Bytes::from(vec![0u8; 101])),
        ];

        let artifact = pump(&mut session, futures::stream::iter(chunks))
            .await
            .unwrap();
        assert_eq!(artifact.sample_rate, Some(16000));
        assert_eq!(artifact.samples_decoded, 100);
        assert_eq!(artifact.bytes.len(), 245);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn pump_handles_chunks_arriving_over_time() {
        let (mut session, _log) = sim_session();
        let (tx, rx) = tokio::sync::mpsc::channel(1);

        let feeder = tokio::spawn(async move {
            tx.send(Ok(header_chunk(24000))).await.unwrap();
            for _ in 0..3 {
                tokio::task::yield_now().await;
                tx.send(Ok(Bytes::from(vec![0u8; 64]))).await.unwrap();
            }
        });

        let artifact = pump(&mut session, ReceiverStream::new(rx)).await.unwrap();
        feeder.await.unwrap();
        assert_eq!(artifact.samples_decoded, 96);
    }

    #[tokio::test]
    async fn cancel_before_pumping_discards_the_stream() {
        let (mut session, log) = sim_session();
        session.handle().cancel();

        let chunks = vec![Ok(header_chunk(16000)), Ok(Bytes::from(vec![0u8; 100]))];
        let result = pump(&mut session, futures::stream::iter(chunks)).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(session.chunks_received(), 0);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn cancel_mid_stream_stops_at_the_next_chunk() {
        let (mut session, _log) = sim_session();
        let handle = session.handle();

        let seen = Arc::new(AtomicUsize::new(0));
        let chunks = vec![
            Ok(header_chunk(16000)),
            Ok(Bytes::from(vec![0u8; 100])),
            Ok(Bytes::from(vec![0u8; 100])),
        ];
        let stream = futures::stream::iter(chunks).inspect(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 1 {
                handle.cancel();
            }
        });

        let result = pump(&mut session, stream).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(session.chunks_received(), 1);
        assert_eq!(session.playback_state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn transport_error_tears_the_session_down() {
        let (mut session, _log) = sim_session();
        let chunks = vec![
            Ok(header_chunk(16000)),
            Err(Error::Transport("connection reset".to_string())),
        ];

        let result = pump(&mut session, futures::stream::iter(chunks)).await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(session.playback_state(), PlaybackState::Idle);
        assert!(!session.handle().is_active());
    }

    #[tokio::test]
    async fn drain_returns_once_nothing_is_pending() {
        let (session, _log) = sim_session();
        drain(&session).await;
    }
}
