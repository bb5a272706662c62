use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::CompletionSignal;
use crate::{
    audio::{
        constants::{FRAME_DURATION_MS, OPUS_SILENCE_FRAME},
        mix::FrameSource,
    },
    common::{Shared, TransportError},
};

/// Where encoded frames go once they leave the pump.
#[async_trait]
pub trait PacketSink: Send {
    async fn send_packet(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: PacketSink> PacketSink for Shared<T> {
    async fn send_packet(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.lock().await.send_packet(payload).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The source ran dry and the completion signal fired.
    Drained { frames: u64 },
    /// Stopped from outside before the source drained.
    Cancelled,
}

/// Pulls one frame per frame period and forwards it to a sink.
pub struct FramePump<S> {
    source: Arc<dyn FrameSource>,
    sink: S,
    trailing_silence: u32,
    cancel: CancellationToken,
}

impl<S: PacketSink> FramePump<S> {
    pub fn new(
        source: Arc<dyn FrameSource>,
        sink: S,
        trailing_silence: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            sink,
            trailing_silence,
            cancel,
        }
    }

    /// Runs until the source yields an empty frame, then sends the trailing
    /// silence frames and fires `on_finished`. The source is not polled again
    /// after it drains.
    pub async fn run(mut self, on_finished: CompletionSignal) -> PumpOutcome {
        let mut interval = tokio::time::interval(Duration::from_millis(FRAME_DURATION_MS));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut frames = 0u64;
        let mut failures = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Frame pump cancelled after {} frames", frames);
                    return PumpOutcome::Cancelled;
                }
                _ = interval.tick() => {
                    let frame = self.source.next_frame();
                    if frame.is_empty() {
                        break;
                    }
                    frames += 1;
                    if let Err(e) = self.sink.send_packet(&frame).await {
                        failures += 1;
                        if failures == 1 {
                            warn!("Failed to send voice frame: {}", e);
                        } else {
                            trace!("Failed to send voice frame: {}", e);
                        }
                    }
                }
            }
        }

        for _ in 0..self.trailing_silence {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return PumpOutcome::Cancelled,
                _ = interval.tick() => {
                    let _ = self.sink.send_packet(&OPUS_SILENCE_FRAME).await;
                }
            }
        }

        debug!(
            "Source drained after {} frames ({} send failures)",
            frames, failures
        );
        on_finished.fire();
        PumpOutcome::Drained { frames }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use super::*;

    /// Plays back a fixed list of frames, then drains.
    pub struct ScriptedSource {
        frames: Mutex<VecDeque<Bytes>>,
        pub polls_after_drain: Mutex<u32>,
    }

    impl ScriptedSource {
        pub fn new(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| Bytes::from(vec![i as u8 + 1; 4]))
                .collect();
            Self {
                frames: Mutex::new(frames),
                polls_after_drain: Mutex::new(0),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&self) -> Bytes {
            let next = self.frames.lock().pop_front();
            next.unwrap_or_else(|| {
                *self.polls_after_drain.lock() += 1;
                Bytes::new()
            })
        }

        fn is_encoded(&self) -> bool {
            true
        }

        fn release(&self) {
            self.frames.lock().clear();
        }
    }

    /// Forwards every packet into a channel.
    pub struct ChannelSink(pub flume::Sender<Vec<u8>>);

    #[async_trait]
    impl PacketSink for ChannelSink {
        async fn send_packet(&mut self, payload: &[u8]) -> Result<(), TransportError> {
            self.0
                .send(payload.to_vec())
                .map_err(|_| TransportError::Closed)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{
        testing::{ChannelSink, ScriptedSource},
        *,
    };

    fn counting_signal() -> (CompletionSignal, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let signal = CompletionSignal::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (signal, hits)
    }

    #[tokio::test(start_paused = true)]
    async fn drains_then_sends_silence_and_fires_once() {
        let source = Arc::new(ScriptedSource::new(3));
        let (tx, rx) = flume::unbounded();
        let (signal, hits) = counting_signal();

        let pump = FramePump::new(
            source.clone(),
            ChannelSink(tx),
            5,
            CancellationToken::new(),
        );
        let outcome = pump.run(signal).await;

        assert_eq!(outcome, PumpOutcome::Drained { frames: 3 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(*source.polls_after_drain.lock(), 1);

        let packets: Vec<_> = rx.drain().collect();
        assert_eq!(packets.len(), 8);
        assert_eq!(packets[0], vec![1; 4]);
        assert_eq!(packets[2], vec![3; 4]);
        assert!(packets[3..].iter().all(|p| p == &OPUS_SILENCE_FRAME));
    }

    #[tokio::test(start_paused = true)]
    async fn frames_are_paced_by_the_frame_period() {
        let source = Arc::new(ScriptedSource::new(10));
        let (tx, _rx) = flume::unbounded();
        let started = tokio::time::Instant::now();

        let pump = FramePump::new(source, ChannelSink(tx), 0, CancellationToken::new());
        pump.run(CompletionSignal::noop()).await;

        // First tick is immediate; the drain is detected on the eleventh.
        assert_eq!(
            started.elapsed(),
            Duration::from_millis(FRAME_DURATION_MS * 10)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_skips_completion() {
        let source = Arc::new(ScriptedSource::new(1000));
        let (tx, _rx) = flume::unbounded();
        let (signal, hits) = counting_signal();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(
            FramePump::new(source, ChannelSink(tx), 5, cancel.clone()).run(signal),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), PumpOutcome::Cancelled);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_pump_never_polls_or_fires() {
        for frames in [0, 3] {
            let source = Arc::new(ScriptedSource::new(frames));
            let (tx, rx) = flume::unbounded();
            let (signal, hits) = counting_signal();
            let cancel = CancellationToken::new();
            cancel.cancel();

            let outcome = FramePump::new(source.clone(), ChannelSink(tx), 5, cancel)
                .run(signal)
                .await;
            assert_eq!(outcome, PumpOutcome::Cancelled);
            assert_eq!(hits.load(Ordering::SeqCst), 0);
            assert_eq!(*source.polls_after_drain.lock(), 0);
            assert!(rx.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_trailing_silence_skips_completion() {
        let source = Arc::new(ScriptedSource::new(2));
        let (tx, rx) = flume::unbounded();
        let (signal, hits) = counting_signal();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(
            FramePump::new(source, ChannelSink(tx), 50, cancel.clone()).run(signal),
        );
        // Two audio frames plus the drain tick, then well into the silence.
        tokio::time::sleep(Duration::from_millis(FRAME_DURATION_MS * 10)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), PumpOutcome::Cancelled);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let packets: Vec<_> = rx.drain().collect();
        assert!(packets.len() > 2 && packets.len() < 52);
        assert!(packets[2..].iter().all(|p| p == &OPUS_SILENCE_FRAME));
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failures_do_not_stop_playback() {
        let source = Arc::new(ScriptedSource::new(4));
        let (tx, rx) = flume::unbounded();
        drop(rx);
        let (signal, hits) = counting_signal();

        let outcome = FramePump::new(source, ChannelSink(tx), 2, CancellationToken::new())
            .run(signal)
            .await;
        assert_eq!(outcome, PumpOutcome::Drained { frames: 4 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
