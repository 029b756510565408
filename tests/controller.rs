mod common;

use common::synthetic_image::{two_tone, uniform, BLUE, RED};
use dominant_segments::diagnostics::Anomaly;
use dominant_segments::image::ColorImage;
use dominant_segments::{
    InvalidState, Segment, SegmentationController, SegmentationError, SegmentationMode,
    SegmentationObserver, SegmentationParams, SubProcess,
};
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// Blocks every pass in `segmentation_started` until released.
struct GateObserver {
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    failures: Mutex<Vec<SegmentationError>>,
}

impl GateObserver {
    fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let observer = Self {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
            failures: Mutex::new(Vec::new()),
        };
        (observer, started_rx, release_tx)
    }
}

impl SegmentationObserver for GateObserver {
    fn segmentation_started(&self, _mode: SegmentationMode) {
        let _ = self.started.lock().send(());
        let _ = self.release.lock().recv();
    }

    fn segmentation_failed(&self, _mode: SegmentationMode, error: &SegmentationError) {
        self.failures.lock().push(error.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    ImageChanged,
    Started(SegmentationMode),
    Segment(SegmentationMode, usize),
    Progress(usize, usize),
    Anomaly(Anomaly),
    Finished(SegmentationMode, usize),
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<Event>>,
    sub_progress: Mutex<Vec<(SubProcess, usize, usize)>>,
}

impl SegmentationObserver for RecordingObserver {
    fn image_changed(&self, _image: &ColorImage) {
        self.events.lock().push(Event::ImageChanged);
    }

    fn segmentation_started(&self, mode: SegmentationMode) {
        self.events.lock().push(Event::Started(mode));
    }

    fn segment_changed(&self, mode: SegmentationMode, segment: &Segment) {
        self.events.lock().push(Event::Segment(mode, segment.len()));
    }

    fn segmentation_progress(&self, segmented: usize, total: usize) {
        self.events.lock().push(Event::Progress(segmented, total));
    }

    fn sub_process_progress(&self, phase: SubProcess, current: usize, total: usize) {
        self.sub_progress.lock().push((phase, current, total));
    }

    fn segmentation_anomaly(&self, _mode: SegmentationMode, anomaly: &Anomaly) {
        self.events.lock().push(Event::Anomaly(anomaly.clone()));
    }

    fn segmentation_finished(&self, mode: SegmentationMode, segments: &[Segment]) {
        self.events.lock().push(Event::Finished(mode, segments.len()));
    }
}

fn small_params() -> SegmentationParams {
    SegmentationParams {
        minimal_segment_size: 2,
        target_coverage_ratio: 1.0,
        ..Default::default()
    }
}

#[test]
fn commands_during_a_run_are_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (observer, started, release) = GateObserver::new();
    let controller = SegmentationController::new(observer);
    controller.open_image(two_tone(6, 4, 2, RED, BLUE)).unwrap();
    let params = small_params();

    thread::scope(|s| {
        let run = s.spawn(|| controller.segment(SegmentationMode::Deep, &params));
        started.recv().unwrap();
        assert!(controller.is_running());

        let err = controller
            .segment(SegmentationMode::Quick, &params)
            .unwrap_err();
        assert_eq!(err, SegmentationError::InvalidState(InvalidState::AlreadyRunning));
        let err = controller.open_image(uniform(2, 2, RED)).unwrap_err();
        assert_eq!(err, SegmentationError::InvalidState(InvalidState::AlreadyRunning));

        release.send(()).unwrap();
        let results = run.join().unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].segments.len(), 2);
    });

    assert!(!controller.is_running());
    assert_eq!(controller.image().unwrap().w, 6);
    assert!(controller.observer().failures.lock().is_empty());
}

#[test]
fn cancel_stops_the_run() {
    let (observer, started, release) = GateObserver::new();
    let controller = SegmentationController::new(observer);
    controller.open_image(two_tone(6, 4, 2, RED, BLUE)).unwrap();
    let params = small_params();

    thread::scope(|s| {
        let run = s.spawn(|| controller.segment(SegmentationMode::Both, &params));
        started.recv().unwrap();
        controller.cancel();
        release.send(()).unwrap();
        let err = run.join().unwrap().unwrap_err();
        assert_eq!(err, SegmentationError::Cancelled);
    });

    assert!(!controller.is_running());
    assert_eq!(
        *controller.observer().failures.lock(),
        vec![SegmentationError::Cancelled]
    );

    // The next command starts from a clean slate.
    let (observer, _started, release) = GateObserver::new();
    let controller = SegmentationController::new(observer);
    controller.open_image(uniform(3, 3, RED)).unwrap();
    release.send(()).unwrap();
    controller.cancel();
    assert!(controller.segment(SegmentationMode::Deep, &params).is_ok());
}

#[test]
fn timeout_aborts_a_slow_run() {
    struct SlowStart;
    impl SegmentationObserver for SlowStart {
        fn segmentation_started(&self, _mode: SegmentationMode) {
            thread::sleep(Duration::from_millis(20));
        }
    }

    let controller = SegmentationController::new(SlowStart);
    controller.open_image(two_tone(6, 4, 2, RED, BLUE)).unwrap();
    let params = SegmentationParams {
        timeout_ms: Some(1),
        ..small_params()
    };
    let err = controller
        .segment(SegmentationMode::Deep, &params)
        .unwrap_err();
    assert!(matches!(err, SegmentationError::TimedOut { elapsed_ms } if elapsed_ms >= 1));
    assert!(!controller.is_running());
}

#[test]
fn events_follow_the_run_lifecycle() {
    let controller = SegmentationController::new(RecordingObserver::default());
    controller.open_image(two_tone(6, 4, 2, RED, BLUE)).unwrap();
    let results = controller
        .segment(SegmentationMode::Deep, &small_params())
        .unwrap();

    let events = controller.observer().events.lock().clone();
    assert_eq!(events[0], Event::ImageChanged);
    assert_eq!(events[1], Event::Started(SegmentationMode::Deep));
    assert_eq!(events[2], Event::Progress(0, 24));
    assert_eq!(events.last(), Some(&Event::Finished(SegmentationMode::Deep, 2)));
    assert_eq!(events[events.len() - 2], Event::Progress(24, 24));

    let discovered: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::Segment(_, len) => Some(*len),
            _ => None,
        })
        .collect();
    assert_eq!(discovered, vec![16, 8]);
    assert_eq!(results[0].segments.len(), discovered.len());

    let sub = controller.observer().sub_progress.lock();
    assert!(sub.iter().all(|&(_, current, total)| current >= 1 && current <= total));
    assert!(sub.iter().any(|&(phase, _, _)| phase == SubProcess::Iteration));
}

#[test]
fn new_image_replaces_the_previous_one() {
    let controller = SegmentationController::new(RecordingObserver::default());
    controller.open_image(uniform(2, 2, RED)).unwrap();
    controller.open_image(uniform(5, 1, BLUE)).unwrap();
    let image = controller.image().unwrap();
    assert_eq!((image.w, image.h), (5, 1));
    assert_eq!(
        *controller.observer().events.lock(),
        vec![Event::ImageChanged, Event::ImageChanged]
    );

    let params = SegmentationParams {
        minimal_segment_size: 1,
        ..Default::default()
    };
    let results = controller
        .segment(SegmentationMode::Quick, &params)
        .unwrap();
    let covered: usize = results[0].segments.iter().map(Vec::len).sum();
    assert_eq!(covered, 5);
}
