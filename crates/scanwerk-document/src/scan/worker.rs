// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-slot detection worker.
//
// Camera frames arrive far faster than boundary detection completes. The
// session keeps at most one detection in flight and at most one frame
// waiting; anything beyond that is dropped according to the configured
// `DropPolicy`. Frames are ephemeral: dropping one just means the next frame
// is the next attempt.
//
// A detection that overruns its time limit is reported and its result thrown
// away, but it keeps the slot until the vision call actually returns. The
// blocking pool therefore never runs more than one detection per session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::classify_error;
use scanwerk_core::{CameraFrame, DetectorConfig, DropPolicy, ErrorClass, SessionId};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::scan::analyzer::{Detection, FrameAnalyzer, OutputSpace};

/// Receives detection results.
///
/// Called on the worker task, one result at a time, in frame order. A slow
/// consumer holds up the next detection.
pub trait FrameConsumer: Send + Sync {
    fn on_detection(&self, detection: Detection);

    /// The session hit an unrecoverable error and has stopped.
    fn on_fatal(&self, _error: &ScanwerkError) {}
}

impl<F> FrameConsumer for F
where
    F: Fn(Detection) + Send + Sync,
{
    fn on_detection(&self, detection: Detection) {
        self(detection)
    }
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The frame is waiting for (or already has) the worker.
    Accepted,
    /// The mailbox was full and the incoming frame was discarded.
    Dropped,
    /// The incoming frame took the place of the waiting one.
    Replaced,
    /// The session has stopped.
    Closed,
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub submitted: u64,
    pub dropped: u64,
    pub processed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub stale: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    stale: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SessionStats {
        SessionStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the session handle and its worker task.
struct Shared {
    id: SessionId,
    policy: DropPolicy,
    target: OutputSpace,
    timeout: Duration,
    max_frame_age: Duration,
    mailbox: Mutex<Option<CameraFrame>>,
    frame_ready: Notify,
    shutdown: Notify,
    cancelled: AtomicBool,
    in_flight: AtomicBool,
    /// `true` while results may still be delivered. Held across delivery so
    /// that `stop` cannot return while a callback is running.
    delivery_open: tokio::sync::Mutex<bool>,
    counters: Counters,
    last_fatal: Mutex<Option<ScanwerkError>>,
}

impl Shared {
    fn take_frame(&self) -> Option<CameraFrame> {
        self.mailbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A running detection pipeline fed by [`submit`](Self::submit).
///
/// ```ignore
/// let analyzer = FrameAnalyzer::new(Arc::new(HoughVision::default()), &config);
/// let mut session = DetectionSession::start(analyzer, &config, OutputSpace::Native, |d: Detection| {
///     println!("{:?}", d.corners);
/// })?;
/// session.submit(frame);
/// session.stop().await?;
/// ```
pub struct DetectionSession {
    shared: Arc<Shared>,
    task_handle: Option<JoinHandle<()>>,
}

impl DetectionSession {
    /// Validate `config` and spawn the worker on the current tokio runtime.
    pub fn start(
        analyzer: FrameAnalyzer,
        config: &DetectorConfig,
        target: OutputSpace,
        consumer: impl FrameConsumer + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ScanwerkError::Resource(format!("detection session needs a tokio runtime: {e}"))
        })?;

        let shared = Arc::new(Shared {
            id: SessionId::new(),
            policy: config.drop_policy,
            target,
            timeout: config.detection_timeout(),
            max_frame_age: config.max_frame_age(),
            mailbox: Mutex::new(None),
            frame_ready: Notify::new(),
            shutdown: Notify::new(),
            cancelled: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            delivery_open: tokio::sync::Mutex::new(true),
            counters: Counters::default(),
            last_fatal: Mutex::new(None),
        });

        info!(
            session = %shared.id,
            policy = ?shared.policy,
            timeout_ms = shared.timeout.as_millis() as u64,
            "Detection session started"
        );

        let worker_state = Arc::clone(&shared);
        let analyzer = Arc::new(analyzer);
        let consumer: Arc<dyn FrameConsumer> = Arc::new(consumer);
        let handle = runtime.spawn(async move {
            Self::run(worker_state, analyzer, consumer).await;
        });

        Ok(Self {
            shared,
            task_handle: Some(handle),
        })
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// Offer a frame to the worker. Never blocks on detection.
    pub fn submit(&self, frame: CameraFrame) -> SubmitOutcome {
        let shared = &self.shared;
        if shared.is_cancelled() {
            return SubmitOutcome::Closed;
        }
        Counters::bump(&shared.counters.submitted);

        let outcome = {
            let mut slot = shared.mailbox.lock().unwrap_or_else(PoisonError::into_inner);
            match (slot.as_ref(), shared.policy) {
                (None, _) => {
                    *slot = Some(frame);
                    SubmitOutcome::Accepted
                }
                (Some(_), DropPolicy::DropNewest) => {
                    debug!(sequence = frame.sequence, "Worker busy; dropping incoming frame");
                    SubmitOutcome::Dropped
                }
                (Some(waiting), DropPolicy::DropOldest) => {
                    debug!(
                        dropped = waiting.sequence,
                        sequence = frame.sequence,
                        "Worker busy; replacing waiting frame"
                    );
                    *slot = Some(frame);
                    SubmitOutcome::Replaced
                }
            }
        };

        match outcome {
            SubmitOutcome::Accepted => shared.frame_ready.notify_one(),
            SubmitOutcome::Dropped | SubmitOutcome::Replaced => {
                Counters::bump(&shared.counters.dropped)
            }
            SubmitOutcome::Closed => {}
        }
        outcome
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.counters.snapshot()
    }

    /// Whether a detection currently occupies the slot, including one that
    /// has timed out but not yet returned.
    pub fn is_busy(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.shared.is_cancelled()
    }

    /// Message of the error that ended the session, if one did.
    pub fn last_fatal(&self) -> Option<String> {
        self.shared
            .last_fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ToString::to_string)
    }

    /// Take the error that ended the session, leaving `None` behind.
    pub fn take_fatal(&self) -> Option<ScanwerkError> {
        self.shared
            .last_fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Cancel the session and wait for the worker to exit.
    ///
    /// Once `stop` has begun no further results reach the consumer; a result
    /// already being delivered finishes before `stop` returns. A detection
    /// still running on the blocking pool is abandoned and its result
    /// discarded.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };
        info!(session = %self.shared.id, "Stopping detection session");

        self.shared.cancelled.store(true, Ordering::Release);
        *self.shared.delivery_open.lock().await = false;
        self.shared.shutdown.notify_one();
        self.shared.mailbox.lock().unwrap_or_else(PoisonError::into_inner).take();

        if let Err(e) = handle.await {
            warn!(session = %self.shared.id, error = %e, "Detection worker ended abnormally");
        }
        debug!(session = %self.shared.id, stats = ?self.stats(), "Detection session stopped");
        Ok(())
    }

    async fn run(shared: Arc<Shared>, analyzer: Arc<FrameAnalyzer>, consumer: Arc<dyn FrameConsumer>) {
        // A timed-out detection still running on the blocking pool.
        let mut overrun: Option<JoinHandle<Result<Detection>>> = None;
        loop {
            if shared.is_cancelled() {
                break;
            }

            if let Some(mut straggler) = overrun.take() {
                tokio::select! {
                    _ = shared.shutdown.notified() => break,
                    _ = &mut straggler => {}
                }
                shared.in_flight.store(false, Ordering::Release);
                debug!("Timed-out detection returned; slot free");
                continue;
            }

            let frame = match shared.take_frame() {
                Some(frame) => frame,
                None => {
                    tokio::select! {
                        _ = shared.shutdown.notified() => break,
                        _ = shared.frame_ready.notified() => {}
                    }
                    continue;
                }
            };

            let age = frame.captured_at.elapsed();
            if !shared.max_frame_age.is_zero() && age > shared.max_frame_age {
                debug!(sequence = frame.sequence, age_ms = age.as_millis() as u64, "Discarding stale frame");
                Counters::bump(&shared.counters.stale);
                continue;
            }

            let sequence = frame.sequence;
            shared.in_flight.store(true, Ordering::Release);
            let attempt = tokio::select! {
                _ = shared.shutdown.notified() => {
                    debug!(sequence, "Session stopped with detection in flight");
                    shared.in_flight.store(false, Ordering::Release);
                    break;
                }
                attempt = Self::detect(&analyzer, frame, shared.target, shared.timeout) => attempt,
            };

            let outcome = match attempt {
                Attempt::Finished(outcome) => {
                    shared.in_flight.store(false, Ordering::Release);
                    outcome
                }
                Attempt::Overran(straggler) => {
                    let err = ScanwerkError::Timeout(shared.timeout);
                    warn!(sequence, error = %err, "Detection timed out; frame dropped");
                    Counters::bump(&shared.counters.timed_out);
                    overrun = Some(straggler);
                    continue;
                }
            };

            match outcome {
                Ok(detection) => {
                    let open = shared.delivery_open.lock().await;
                    if !*open {
                        break;
                    }
                    consumer.on_detection(detection);
                    Counters::bump(&shared.counters.processed);
                }
                Err(e) => {
                    Counters::bump(&shared.counters.failed);
                    match classify_error(&e) {
                        ErrorClass::Recoverable => {
                            warn!(sequence, error = %e, "Detection failed; frame dropped");
                        }
                        ErrorClass::Fatal => {
                            error!(session = %shared.id, sequence, error = %e, "Fatal detection error; stopping session");
                            let open = shared.delivery_open.lock().await;
                            if *open {
                                consumer.on_fatal(&e);
                            }
                            *shared.last_fatal.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
                            shared.cancelled.store(true, Ordering::Release);
                            break;
                        }
                    }
                }
            }
        }
        shared.in_flight.store(false, Ordering::Release);
        shared.mailbox.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Run one detection on the blocking pool, bounded by `limit`.
    ///
    /// On timeout the task handle is handed back so the caller can wait for
    /// the blocking call before starting another.
    async fn detect(
        analyzer: &Arc<FrameAnalyzer>,
        frame: CameraFrame,
        target: OutputSpace,
        limit: Duration,
    ) -> Attempt {
        let analyzer = Arc::clone(analyzer);
        let mut task = tokio::task::spawn_blocking(move || analyzer.analyze(&frame, target));
        match tokio::time::timeout(limit, &mut task).await {
            Err(_) => Attempt::Overran(task),
            Ok(Err(join_err)) => Attempt::Finished(Err(ScanwerkError::Detection(format!(
                "detection task failed: {join_err}"
            )))),
            Ok(Ok(result)) => Attempt::Finished(result),
        }
    }
}

/// How one detection attempt ended.
enum Attempt {
    Finished(Result<Detection>),
    /// Past the time limit; the blocking call is still running.
    Overran(JoinHandle<Result<Detection>>),
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            self.shared.cancelled.store(true, Ordering::Release);
            self.shared.shutdown.notify_one();
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Segment;
    use crate::scan::vision::VisionPrimitive;
    use image::GrayImage;
    use scanwerk_core::human_errors::{Severity, humanize_error};
    use scanwerk_core::{PixelFormat, Rotation};
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn rectangle() -> Vec<Segment> {
        vec![
            Segment::from_coords(10.0, 10.0, 50.0, 10.0),
            Segment::from_coords(50.0, 10.0, 50.0, 60.0),
            Segment::from_coords(50.0, 60.0, 10.0, 60.0),
            Segment::from_coords(10.0, 60.0, 10.0, 10.0),
        ]
    }

    /// Vision primitive that takes `delay` per call and records the highest
    /// number of calls it saw running at once.
    fn slow_vision(delay: Duration, active: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Arc<dyn VisionPrimitive> {
        Arc::new(move |_: &GrayImage| -> Result<Option<Vec<Segment>>> {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(delay);
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(rectangle()))
        })
    }

    fn config(policy: DropPolicy) -> DetectorConfig {
        DetectorConfig {
            analysis_width: 64,
            drop_policy: policy,
            max_frame_age_ms: 60_000,
            ..DetectorConfig::default()
        }
    }

    fn frame(sequence: u64) -> CameraFrame {
        CameraFrame::new(sequence, vec![128; 64 * 80], 64, 80, PixelFormat::Luma8, Rotation::Deg0)
    }

    fn collector() -> (Arc<Mutex<Vec<u64>>>, impl Fn(Detection) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |d: Detection| sink.lock().expect("lock").push(d.sequence))
    }

    async fn wait_until(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_more_than_one_detection_in_flight() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let cfg = config(DropPolicy::DropNewest);
        let analyzer = FrameAnalyzer::new(
            slow_vision(Duration::from_millis(15), Arc::clone(&active), Arc::clone(&peak)),
            &cfg,
        );
        let (seen, sink) = collector();
        let mut session = DetectionSession::start(analyzer, &cfg, OutputSpace::Analysis, sink).expect("start");

        for seq in 0..40 {
            session.submit(frame(seq));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        wait_until("worker to drain", || !session.is_busy() && session.stats().processed > 0).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.stop().await.expect("stop");

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        let stats = session.stats();
        assert_eq!(stats.submitted, 40);
        assert!(stats.dropped > 0);
        assert_eq!(stats.processed + stats.dropped, stats.submitted);

        let seen = seen.lock().expect("lock");
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "out of order: {seen:?}");
    }

    async fn busy_session(policy: DropPolicy) -> (SubmitOutcome, Vec<u64>) {
        let cfg = config(policy);
        let analyzer = FrameAnalyzer::new(
            slow_vision(
                Duration::from_millis(150),
                Arc::new(AtomicUsize::new(0)),
                Arc::new(AtomicUsize::new(0)),
            ),
            &cfg,
        );
        let (seen, sink) = collector();
        let mut session = DetectionSession::start(analyzer, &cfg, OutputSpace::Analysis, sink).expect("start");

        assert_eq!(session.submit(frame(1)), SubmitOutcome::Accepted);
        wait_until("first detection to start", || session.is_busy()).await;
        assert_eq!(session.submit(frame(2)), SubmitOutcome::Accepted);
        let third = session.submit(frame(3));

        wait_until("both detections", || session.stats().processed == 2).await;
        session.stop().await.expect("stop");
        let seen = seen.lock().expect("lock").clone();
        (third, seen)
    }

    #[tokio::test]
    async fn drop_newest_keeps_the_waiting_frame() {
        let (third, seen) = busy_session(DropPolicy::DropNewest).await;
        assert_eq!(third, SubmitOutcome::Dropped);
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn drop_oldest_replaces_the_waiting_frame() {
        let (third, seen) = busy_session(DropPolicy::DropOldest).await;
        assert_eq!(third, SubmitOutcome::Replaced);
        assert_eq!(seen, vec![1, 3]);
    }

    #[tokio::test]
    async fn stopped_session_never_calls_the_consumer() {
        let cfg = config(DropPolicy::DropNewest);
        let analyzer = FrameAnalyzer::new(
            slow_vision(
                Duration::from_millis(200),
                Arc::new(AtomicUsize::new(0)),
                Arc::new(AtomicUsize::new(0)),
            ),
            &cfg,
        );
        let (seen, sink) = collector();
        let mut session = DetectionSession::start(analyzer, &cfg, OutputSpace::Analysis, sink).expect("start");

        session.submit(frame(1));
        wait_until("detection to start", || session.is_busy()).await;
        session.submit(frame(2));
        session.stop().await.expect("stop");

        // Give the abandoned blocking call time to finish.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(seen.lock().expect("lock").is_empty());
        assert_eq!(session.submit(frame(3)), SubmitOutcome::Closed);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn timed_out_detection_holds_the_slot_until_it_returns() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let vision: Arc<dyn VisionPrimitive> = Arc::new(move |_: &GrayImage| -> Result<Option<Vec<Segment>>> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                std::thread::sleep(Duration::from_millis(300));
            }
            Ok(Some(rectangle()))
        });
        let cfg = DetectorConfig {
            detection_timeout_ms: 50,
            ..config(DropPolicy::DropNewest)
        };
        let (seen, sink) = collector();
        let mut session =
            DetectionSession::start(FrameAnalyzer::new(vision, &cfg), &cfg, OutputSpace::Analysis, sink).expect("start");

        session.submit(frame(1));
        wait_until("timeout", || session.stats().timed_out == 1).await;
        assert!(session.is_busy());

        // Waits in the mailbox until the overrunning call is done.
        assert_eq!(session.submit(frame(2)), SubmitOutcome::Accepted);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        wait_until("second frame", || session.stats().processed == 1).await;
        session.stop().await.expect("stop");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().expect("lock"), vec![2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_vision_never_runs_twice_at_once() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let cfg = DetectorConfig {
            detection_timeout_ms: 20,
            ..config(DropPolicy::DropOldest)
        };
        let analyzer = FrameAnalyzer::new(
            slow_vision(Duration::from_millis(120), Arc::clone(&active), Arc::clone(&peak)),
            &cfg,
        );
        let (seen, sink) = collector();
        let mut session = DetectionSession::start(analyzer, &cfg, OutputSpace::Analysis, sink).expect("start");

        for seq in 0..10 {
            session.submit(frame(seq));
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        wait_until("worker to drain", || !session.is_busy()).await;
        session.stop().await.expect("stop");

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        let stats = session.stats();
        assert!(stats.timed_out >= 2, "{stats:?}");
        assert_eq!(stats.processed, 0);
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn stale_frames_are_skipped() {
        let cfg = DetectorConfig {
            max_frame_age_ms: 20,
            ..config(DropPolicy::DropNewest)
        };
        let analyzer = FrameAnalyzer::new(
            slow_vision(Duration::ZERO, Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0))),
            &cfg,
        );
        let (seen, sink) = collector();
        let mut session = DetectionSession::start(analyzer, &cfg, OutputSpace::Analysis, sink).expect("start");

        let mut old = frame(1);
        old.captured_at = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .expect("clock");
        session.submit(old);
        wait_until("stale discard", || session.stats().stale == 1).await;

        session.submit(frame(2));
        wait_until("fresh frame", || session.stats().processed == 1).await;
        session.stop().await.expect("stop");
        assert_eq!(*seen.lock().expect("lock"), vec![2]);
    }

    #[tokio::test]
    async fn recoverable_errors_skip_the_frame() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let vision: Arc<dyn VisionPrimitive> = Arc::new(move |_: &GrayImage| -> Result<Option<Vec<Segment>>> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ScanwerkError::Detection("request rejected".into()));
            }
            Ok(Some(rectangle()))
        });
        let cfg = config(DropPolicy::DropNewest);
        let (seen, sink) = collector();
        let mut session =
            DetectionSession::start(FrameAnalyzer::new(vision, &cfg), &cfg, OutputSpace::Analysis, sink).expect("start");

        session.submit(frame(1));
        wait_until("failure", || session.stats().failed == 1).await;
        session.submit(frame(2));
        wait_until("success", || session.stats().processed == 1).await;
        session.stop().await.expect("stop");

        assert_eq!(*seen.lock().expect("lock"), vec![2]);
        assert!(session.last_fatal().is_none());
    }

    #[tokio::test]
    async fn out_of_memory_ends_the_session() {
        let vision: Arc<dyn VisionPrimitive> = Arc::new(|_: &GrayImage| -> Result<Option<Vec<Segment>>> {
            Err(ScanwerkError::OutOfMemory("preview buffer".into()))
        });
        let cfg = config(DropPolicy::DropNewest);
        let (seen, sink) = collector();
        let mut session =
            DetectionSession::start(FrameAnalyzer::new(vision, &cfg), &cfg, OutputSpace::Analysis, sink).expect("start");

        session.submit(frame(1));
        wait_until("fatal error", || !session.is_running()).await;
        assert!(session.last_fatal().expect("fatal").contains("preview buffer"));
        assert_eq!(session.submit(frame(2)), SubmitOutcome::Closed);
        session.stop().await.expect("stop");
        assert!(seen.lock().expect("lock").is_empty());

        let err = session.take_fatal().expect("fatal error kept");
        assert!(matches!(err, ScanwerkError::OutOfMemory(_)));
        assert_eq!(humanize_error(&err).severity, Severity::Fatal);
        assert!(session.take_fatal().is_none());
    }

    struct FatalRecorder {
        fatal: Arc<Mutex<Vec<String>>>,
    }

    impl FrameConsumer for FatalRecorder {
        fn on_detection(&self, _detection: Detection) {}

        fn on_fatal(&self, error: &ScanwerkError) {
            self.fatal.lock().expect("lock").push(error.to_string());
        }
    }

    #[tokio::test]
    async fn consumer_hears_about_the_fatal_error() {
        let vision: Arc<dyn VisionPrimitive> = Arc::new(|_: &GrayImage| -> Result<Option<Vec<Segment>>> {
            Err(ScanwerkError::OutOfMemory("edge map".into()))
        });
        let cfg = config(DropPolicy::DropNewest);
        let fatal = Arc::new(Mutex::new(Vec::new()));
        let consumer = FatalRecorder { fatal: Arc::clone(&fatal) };
        let mut session =
            DetectionSession::start(FrameAnalyzer::new(vision, &cfg), &cfg, OutputSpace::Analysis, consumer).expect("start");

        session.submit(frame(1));
        wait_until("fatal error", || !session.is_running()).await;
        session.stop().await.expect("stop");
        let fatal = fatal.lock().expect("lock");
        assert_eq!(fatal.len(), 1);
        assert!(fatal[0].contains("edge map"));
    }

    #[test]
    fn start_outside_a_runtime_is_an_error() {
        let cfg = config(DropPolicy::DropNewest);
        let vision: Arc<dyn VisionPrimitive> =
            Arc::new(|_: &GrayImage| -> Result<Option<Vec<Segment>>> { Ok(None) });
        let result = DetectionSession::start(
            FrameAnalyzer::new(vision, &cfg),
            &cfg,
            OutputSpace::Analysis,
            |_: Detection| {},
        );
        assert!(matches!(result, Err(ScanwerkError::Resource(_))));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let cfg = DetectorConfig {
            merge_radius: 0.0,
            ..DetectorConfig::default()
        };
        let vision: Arc<dyn VisionPrimitive> =
            Arc::new(|_: &GrayImage| -> Result<Option<Vec<Segment>>> { Ok(None) });
        let result = DetectionSession::start(
            FrameAnalyzer::new(vision, &cfg),
            &cfg,
            OutputSpace::Analysis,
            |_: Detection| {},
        );
        assert!(matches!(result, Err(ScanwerkError::Config(_))));
    }
}
