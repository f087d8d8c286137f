use std::ops::Deref;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use thiserror::Error;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::annotation::infrastructure::rectangle_annotator::RectangleAnnotator;
use crate::detection::domain::detection_params::SharedParameters;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::constants::{FRAME_INTERVAL, HANDOFF_CAPACITY};
use crate::shared::face_rect::FaceRect;
use crate::shared::frame::Frame;
use crate::shared::video_source::VideoSource;
use crate::video::domain::video_reader::{CaptureError, VideoReader};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("video source {source_name} is unavailable: {reason}")]
    SourceUnavailable {
        source_name: String,
        #[source]
        reason: CaptureError,
    },
    #[error("a video session is already running")]
    AlreadyRunning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}

/// A processed frame together with the faces drawn on it.
#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub faces: Vec<FaceRect>,
}

#[derive(Clone, Debug)]
pub enum PipelineEvent {
    Frame(AnnotatedFrame),
    /// The source ran dry and the worker stopped on its own.
    Ended,
}

/// Consumer end of a session's hand-off channel.
///
/// Dropping it tells the worker nobody is listening any more; the worker
/// then releases the source and exits on its own.
pub struct PipelineReceiver {
    rx: Receiver<PipelineEvent>,
    _alive: Arc<()>,
}

impl Deref for PipelineReceiver {
    type Target = Receiver<PipelineEvent>;

    fn deref(&self) -> &Self::Target {
        &self.rx
    }
}

type LoggerFactory = Box<dyn Fn() -> Box<dyn PipelineLogger> + Send + Sync>;

struct Session {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives a single capture session: read, detect, annotate, hand off.
///
/// One worker thread owns the reader for the lifetime of a session.
/// Frames reach the consumer through a small bounded channel; when the
/// consumer falls behind the oldest queued frame is discarded so the
/// worker never blocks on delivery. Detection parameters are read from
/// [`SharedParameters`] for every frame, so edits apply without a restart.
pub struct FramePipeline {
    detector: Arc<dyn FaceDetector>,
    params: Arc<SharedParameters>,
    annotator: Arc<dyn FrameAnnotator>,
    frame_interval: Duration,
    capacity: usize,
    logger_factory: LoggerFactory,
    state: Arc<AtomicU8>,
    session: Option<Session>,
}

impl FramePipeline {
    pub fn new(detector: Arc<dyn FaceDetector>, params: Arc<SharedParameters>) -> Self {
        Self {
            detector,
            params,
            annotator: Arc::new(RectangleAnnotator::default()),
            frame_interval: FRAME_INTERVAL,
            capacity: HANDOFF_CAPACITY,
            logger_factory: Box::new(|| Box::new(NullPipelineLogger)),
            state: Arc::new(AtomicU8::new(PipelineState::Idle as u8)),
            session: None,
        }
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn FrameAnnotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Each session gets a fresh logger from `factory`; its summary is
    /// emitted when the session ends.
    pub fn with_logger<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PipelineLogger> + Send + Sync + 'static,
    {
        self.logger_factory = Box::new(factory);
        self
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == PipelineState::Running
    }

    /// Opens `source` on the calling thread and spawns the worker.
    ///
    /// Returns the receiving end of the hand-off channel. If the source
    /// cannot be opened the pipeline stays idle and no thread is spawned.
    pub fn start(
        &mut self,
        source: VideoSource,
        mut reader: Box<dyn VideoReader>,
    ) -> Result<PipelineReceiver, PipelineError> {
        if self.state() != PipelineState::Idle {
            return Err(PipelineError::AlreadyRunning);
        }
        // A session that ended on its own leaves a finished thread behind.
        self.reap();

        let metadata = reader
            .open(&source)
            .map_err(|reason| PipelineError::SourceUnavailable {
                source_name: source.to_string(),
                reason,
            })?;
        log::info!(
            "Starting video session on {} ({}x{})",
            metadata.source,
            metadata.width,
            metadata.height
        );

        let (event_tx, event_rx) = crossbeam_channel::bounded(self.capacity);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let alive = Arc::new(());

        self.state
            .store(PipelineState::Running as u8, Ordering::Release);

        let worker = Worker {
            source,
            reader,
            detector: Arc::clone(&self.detector),
            params: Arc::clone(&self.params),
            annotator: Arc::clone(&self.annotator),
            logger: (self.logger_factory)(),
            frame_interval: self.frame_interval,
            state: Arc::clone(&self.state),
            event_tx,
            overflow_rx: event_rx.clone(),
            stop_rx,
            consumer: Arc::downgrade(&alive),
        };
        let handle = std::thread::spawn(move || worker.run());

        self.session = Some(Session { stop_tx, handle });
        Ok(PipelineReceiver {
            rx: event_rx,
            _alive: alive,
        })
    }

    /// Asks the worker to stop and returns immediately.
    ///
    /// The state reads `Stopping` until the worker has closed the source,
    /// then `Idle`. The finished thread is joined by [`reap_finished`],
    /// [`start`] or [`stop`].
    ///
    /// [`reap_finished`]: Self::reap_finished
    /// [`start`]: Self::start
    /// [`stop`]: Self::stop
    pub fn request_stop(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if self
            .state
            .compare_exchange(
                PipelineState::Running as u8,
                PipelineState::Stopping as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            log::info!("Stopping video session");
        }
        let _ = session.stop_tx.try_send(());
    }

    /// Joins the worker if it has exited. Returns `true` when no session
    /// is left.
    pub fn reap_finished(&mut self) -> bool {
        match &self.session {
            None => true,
            Some(session) if session.handle.is_finished() => {
                self.reap();
                true
            }
            Some(_) => false,
        }
    }

    /// Stops the running session and waits for the worker to release the
    /// capture handle. Does nothing when idle.
    pub fn stop(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.request_stop();
        self.reap();
        self.state.store(PipelineState::Idle as u8, Ordering::Release);
        log::info!("Video session stopped");
    }

    fn reap(&mut self) {
        if let Some(session) = self.session.take() {
            if session.handle.join().is_err() {
                log::error!("Video worker panicked");
            }
        }
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    source: VideoSource,
    reader: Box<dyn VideoReader>,
    detector: Arc<dyn FaceDetector>,
    params: Arc<SharedParameters>,
    annotator: Arc<dyn FrameAnnotator>,
    logger: Box<dyn PipelineLogger>,
    frame_interval: Duration,
    state: Arc<AtomicU8>,
    event_tx: Sender<PipelineEvent>,
    overflow_rx: Receiver<PipelineEvent>,
    stop_rx: Receiver<()>,
    consumer: Weak<()>,
}

impl Worker {
    fn run(mut self) {
        let mut reopened = false;
        let mut ended = false;

        while PipelineState::from_u8(self.state.load(Ordering::Acquire)) == PipelineState::Running
        {
            if self.consumer.strong_count() == 0 {
                log::info!("Receiver for {} dropped, stopping", self.source);
                break;
            }
            let t0 = Instant::now();
            match self.reader.read_frame() {
                Ok(frame) => {
                    reopened = false;
                    self.logger.timing("read", elapsed_ms(t0));
                    self.process(frame);
                }
                Err(e) => {
                    if reopened || !self.reopen(&e) {
                        ended = true;
                        break;
                    }
                    reopened = true;
                }
            }

            match self.stop_rx.recv_timeout(self.frame_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if ended {
            let _ = self.state.compare_exchange(
                PipelineState::Running as u8,
                PipelineState::Stopping as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
        self.reader.close();
        self.state
            .store(PipelineState::Idle as u8, Ordering::Release);

        if ended {
            self.logger
                .info(&format!("Stream from {} ended", self.source));
            hand_off(&self.event_tx, &self.overflow_rx, PipelineEvent::Ended);
        }
        self.logger.summary();
    }

    /// Closes and reopens the source once. Returns `false` when the
    /// source cannot be reopened.
    fn reopen(&mut self, cause: &CaptureError) -> bool {
        log::debug!("Read from {} failed ({cause}), reopening", self.source);
        self.reader.close();
        match self.reader.open(&self.source) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Reopening {} failed: {e}", self.source);
                false
            }
        }
    }

    fn process(&mut self, mut frame: Frame) {
        let t0 = Instant::now();
        let params = self.params.snapshot();
        let faces = match self.detector.detect(&frame.to_luma(), &params) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Detection failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };
        self.logger.timing("detect", elapsed_ms(t0));
        self.logger.metric("faces", faces.len() as f64);

        let t0 = Instant::now();
        self.annotator.annotate(&mut frame, &faces);
        self.logger.timing("annotate", elapsed_ms(t0));

        let index = frame.index();
        hand_off(
            &self.event_tx,
            &self.overflow_rx,
            PipelineEvent::Frame(AnnotatedFrame { frame, faces }),
        );
        self.logger.frame_done(index);
    }
}

/// Enqueues `event` without blocking, discarding the oldest queued event
/// when the channel is full.
///
/// `overflow_rx` keeps the channel connected, so a departed consumer is
/// detected through [`PipelineReceiver`] instead of a send error.
fn hand_off(tx: &Sender<PipelineEvent>, overflow_rx: &Receiver<PipelineEvent>, event: PipelineEvent) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            let _ = overflow_rx.try_recv();
            if tx.try_send(event).is_err() {
                log::debug!("Hand-off still full, frame dropped");
            }
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_params::DetectionParameters;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::shared::constants::BOX_COLOR;
    use crate::shared::video_metadata::VideoMetadata;
    use image::GrayImage;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Mutex;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct ReaderProbe {
        opens: AtomicUsize,
        closes: AtomicUsize,
        open: AtomicBool,
    }

    /// Yields `frames_per_open` 16x16 frames after each successful open.
    struct StubReader {
        frames_per_open: usize,
        max_opens: usize,
        next: usize,
        probe: Arc<ReaderProbe>,
    }

    impl StubReader {
        fn new(frames_per_open: usize, max_opens: usize) -> (Self, Arc<ReaderProbe>) {
            let probe = Arc::new(ReaderProbe::default());
            let reader = Self {
                frames_per_open,
                max_opens,
                next: 0,
                probe: Arc::clone(&probe),
            };
            (reader, probe)
        }

        fn live() -> (Self, Arc<ReaderProbe>) {
            Self::new(usize::MAX, usize::MAX)
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, CaptureError> {
            if self.probe.opens.load(Ordering::SeqCst) >= self.max_opens {
                return Err(CaptureError::Open {
                    target: source.to_string(),
                    reason: "no such device".into(),
                });
            }
            self.probe.opens.fetch_add(1, Ordering::SeqCst);
            self.probe.open.store(true, Ordering::SeqCst);
            self.next = 0;
            Ok(VideoMetadata {
                width: 16,
                height: 16,
                fps: 30.0,
                source: source.to_string(),
            })
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            if !self.probe.open.load(Ordering::SeqCst) {
                return Err(CaptureError::NotOpen);
            }
            if self.next >= self.frames_per_open {
                return Err(CaptureError::EndOfStream);
            }
            let frame = Frame::new(vec![128; 16 * 16 * 3], 16, 16, self.next);
            self.next += 1;
            Ok(frame)
        }

        fn close(&mut self) {
            if self.probe.open.swap(false, Ordering::SeqCst) {
                self.probe.closes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Blocks in `read_frame` until the test sends on the gate.
    struct GatedReader {
        gate: Receiver<()>,
        next: usize,
        probe: Arc<ReaderProbe>,
    }

    impl VideoReader for GatedReader {
        fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, CaptureError> {
            self.probe.opens.fetch_add(1, Ordering::SeqCst);
            self.probe.open.store(true, Ordering::SeqCst);
            Ok(VideoMetadata {
                width: 16,
                height: 16,
                fps: 30.0,
                source: source.to_string(),
            })
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            self.gate.recv().map_err(|_| CaptureError::EndOfStream)?;
            let frame = Frame::new(vec![128; 16 * 16 * 3], 16, 16, self.next);
            self.next += 1;
            Ok(frame)
        }

        fn close(&mut self) {
            if self.probe.open.swap(false, Ordering::SeqCst) {
                self.probe.closes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + RECV_TIMEOUT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    /// Returns fixed rectangles and records the parameters it was called with.
    struct StubDetector {
        faces: Vec<FaceRect>,
        fail: bool,
        seen: Mutex<Vec<DetectionParameters>>,
    }

    impl StubDetector {
        fn returning(faces: Vec<FaceRect>) -> Arc<Self> {
            Arc::new(Self {
                faces,
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                faces: Vec::new(),
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen_min_neighbors(&self) -> Vec<u32> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.min_neighbors)
                .collect()
        }
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &self,
            _image: &GrayImage,
            params: &DetectionParameters,
        ) -> Result<Vec<FaceRect>, DetectionError> {
            self.seen.lock().unwrap().push(*params);
            if self.fail {
                return Err(DetectionError::InvalidParameters(params.scale_factor));
            }
            Ok(self.faces.clone())
        }
    }

    fn pipeline(detector: Arc<StubDetector>, params: Arc<SharedParameters>) -> FramePipeline {
        FramePipeline::new(detector, params).with_frame_interval(Duration::from_millis(1))
    }

    fn camera() -> VideoSource {
        VideoSource::Device(0)
    }

    fn next_frame(rx: &Receiver<PipelineEvent>) -> AnnotatedFrame {
        match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
            PipelineEvent::Frame(frame) => frame,
            PipelineEvent::Ended => panic!("stream ended unexpectedly"),
        }
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        p.stop();
        p.stop();
        assert_eq!(p.state(), PipelineState::Idle);
        assert!(!p.is_running());
    }

    #[test]
    fn test_unavailable_source_leaves_pipeline_idle() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        let (reader, probe) = StubReader::new(10, 0);

        let result = p.start(camera(), Box::new(reader));

        assert!(matches!(result, Err(PipelineError::SourceUnavailable { .. })));
        assert_eq!(p.state(), PipelineState::Idle);
        assert!(p.session.is_none());
        assert_eq!(probe.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_stop_then_restart_same_source() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());

        let (reader, probe) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();
        assert!(p.is_running());
        next_frame(&rx);

        p.stop();
        assert_eq!(p.state(), PipelineState::Idle);
        assert!(!probe.open.load(Ordering::SeqCst));
        assert_eq!(probe.closes.load(Ordering::SeqCst), 1);

        let (reader, probe) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();
        assert!(p.is_running());
        next_frame(&rx);
        p.stop();
        assert!(!probe.open.load(Ordering::SeqCst));
    }

    #[test]
    fn test_request_stop_returns_while_read_is_blocked() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let probe = Arc::new(ReaderProbe::default());
        let reader = GatedReader {
            gate: gate_rx,
            next: 0,
            probe: Arc::clone(&probe),
        };
        let _rx = p.start(camera(), Box::new(reader)).unwrap();

        p.request_stop();

        assert_eq!(p.state(), PipelineState::Stopping);
        assert!(!p.reap_finished());
        assert!(probe.open.load(Ordering::SeqCst));
        let (second, _) = StubReader::live();
        assert!(matches!(
            p.start(camera(), Box::new(second)),
            Err(PipelineError::AlreadyRunning)
        ));

        gate_tx.send(()).unwrap();
        wait_until(|| p.reap_finished());

        assert_eq!(p.state(), PipelineState::Idle);
        assert!(!probe.open.load(Ordering::SeqCst));
        let (reader, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();
        next_frame(&rx);
        p.stop();
    }

    #[test]
    fn test_request_stop_when_idle_is_noop() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        p.request_stop();
        assert!(p.reap_finished());
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_dropped_receiver_stops_worker() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        let (reader, probe) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();
        next_frame(&rx);

        drop(rx);

        wait_until(|| p.state() == PipelineState::Idle);
        assert!(!probe.open.load(Ordering::SeqCst));
        wait_until(|| p.reap_finished());
    }

    #[test]
    fn test_second_start_is_rejected_while_running() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        let (first, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(first)).unwrap();

        let (second, probe) = StubReader::live();
        let result = p.start(camera(), Box::new(second));

        assert!(matches!(result, Err(PipelineError::AlreadyRunning)));
        assert_eq!(probe.opens.load(Ordering::SeqCst), 0);
        assert!(p.is_running());
        next_frame(&rx);
        p.stop();
    }

    #[test]
    fn test_parameter_edit_reaches_next_detection() {
        let detector = StubDetector::returning(vec![]);
        let params = Arc::new(SharedParameters::default());
        let mut p = pipeline(Arc::clone(&detector), Arc::clone(&params));

        let (reader, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();
        next_frame(&rx);
        assert_eq!(detector.seen_min_neighbors()[0], 5);

        params.set_min_neighbors(10);
        let deadline = Instant::now() + RECV_TIMEOUT;
        while !detector.seen_min_neighbors().contains(&10) {
            assert!(Instant::now() < deadline, "edit never reached the detector");
            next_frame(&rx);
        }
        p.stop();

        let seen = detector.seen_min_neighbors();
        let first_ten = seen.iter().position(|&n| n == 10).unwrap();
        assert!(seen[first_ten..].iter().all(|&n| n == 10));
    }

    #[test]
    fn test_faces_are_drawn_on_handed_off_frame() {
        let face = FaceRect::new(2, 2, 8, 8);
        let mut p = pipeline(StubDetector::returning(vec![face]), Arc::default());
        let (reader, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();

        let annotated = next_frame(&rx);
        p.stop();

        assert_eq!(annotated.faces, vec![face]);
        let pixels = annotated.frame.as_ndarray();
        assert_eq!(pixels[[2, 2, 0]], BOX_COLOR[0]);
        assert_eq!(pixels[[2, 2, 2]], BOX_COLOR[2]);
        // interior untouched
        assert_eq!(pixels[[6, 6, 0]], 128);
    }

    #[test]
    fn test_detection_failure_hands_off_unannotated_frame() {
        let mut p = pipeline(StubDetector::failing(), Arc::default());
        let (reader, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();

        let annotated = next_frame(&rx);
        p.stop();

        assert!(annotated.faces.is_empty());
        assert!(annotated.frame.data().iter().all(|&b| b == 128));
    }

    #[test]
    fn test_frames_arrive_in_capture_order() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default()).with_capacity(64);
        let (reader, _) = StubReader::new(20, 1);
        let rx = p.start(camera(), Box::new(reader)).unwrap();

        let mut indices = Vec::new();
        loop {
            match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
                PipelineEvent::Frame(f) => indices.push(f.frame.index()),
                PipelineEvent::Ended => break,
            }
        }
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_exhausted_source_ends_session_quietly() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default()).with_capacity(16);
        // reopen after the third frame fails
        let (reader, probe) = StubReader::new(3, 1);
        let rx = p.start(camera(), Box::new(reader)).unwrap();

        let events: Vec<_> = std::iter::from_fn(|| rx.recv_timeout(RECV_TIMEOUT).ok())
            .take(4)
            .collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[3], PipelineEvent::Ended));
        assert_eq!(p.state(), PipelineState::Idle);
        assert!(!probe.open.load(Ordering::SeqCst));

        let (reader, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();
        next_frame(&rx);
    }

    #[test]
    fn test_empty_read_after_reopen_ends_session() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default()).with_capacity(16);
        let (reader, probe) = StubReader::new(0, usize::MAX);
        let rx = p.start(camera(), Box::new(reader)).unwrap();

        assert!(matches!(
            rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            PipelineEvent::Ended
        ));
        assert_eq!(probe.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_file_source_loops_after_reopen() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default()).with_capacity(1024);
        let (reader, probe) = StubReader::new(2, usize::MAX);
        let rx = p.start(VideoSource::File(PathBuf::from("clip.mp4")), Box::new(reader)).unwrap();

        let indices: Vec<_> = (0..5).map(|_| next_frame(&rx).frame.index()).collect();
        p.stop();

        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
        assert!(probe.opens.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn test_drop_stops_worker_and_releases_reader() {
        let (reader, probe) = StubReader::live();
        {
            let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
            let rx = p.start(camera(), Box::new(reader)).unwrap();
            next_frame(&rx);
        }
        assert!(!probe.open.load(Ordering::SeqCst));
    }

    #[test]
    fn test_hand_off_drops_oldest_when_full() {
        let (tx, rx) = crossbeam_channel::bounded(2);
        for i in 0..3 {
            let frame = Frame::new(vec![0; 3], 1, 1, i);
            hand_off(
                &tx,
                &rx,
                PipelineEvent::Frame(AnnotatedFrame {
                    frame,
                    faces: vec![],
                }),
            );
        }

        let indices: Vec<_> = rx
            .try_iter()
            .map(|e| match e {
                PipelineEvent::Frame(f) => f.frame.index(),
                PipelineEvent::Ended => usize::MAX,
            })
            .collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_slow_consumer_only_sees_recent_frames() {
        let mut p = pipeline(StubDetector::returning(vec![]), Arc::default());
        let (reader, _) = StubReader::live();
        let rx = p.start(camera(), Box::new(reader)).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        assert!(rx.len() <= HANDOFF_CAPACITY);
        let first = next_frame(&rx).frame.index();
        p.stop();
        assert!(first > 0);
    }
}
