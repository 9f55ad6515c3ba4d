use super::*;
use crate::classifier::{ClassifierMode, ClassifierSettings};
use crate::executor::ExecError;
use crate::store::{StoreOptions, load_store};
use crate::test_shapes::square;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl Recorder {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for Recorder {
    fn execute(&mut self, symbol: &str) -> Result<(), ExecError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        if self.fail {
            return Err(ExecError::Unbound(symbol.to_string()));
        }
        Ok(())
    }
}

fn settings(idle_threshold_ms: u64) -> LoopSettings {
    LoopSettings {
        idle_threshold: Duration::from_millis(idle_threshold_ms),
        idle_poll: Duration::from_millis(1000),
    }
}

fn user_classifier(dir: &Path) -> Classifier {
    let options = StoreOptions::new(dir.to_path_buf());
    Classifier::initialize(ClassifierMode::User(options), ClassifierSettings::default()).unwrap()
}

fn trained_square(dir: &Path) -> Classifier {
    let mut classifier = user_classifier(dir);
    classifier.reset_training_set(5, "square");
    for seed in 0..5 {
        classifier.add_to_training_set(&square(seed, 1.0)).unwrap();
    }
    classifier
}

/// Queues a square drawn "now", so its age is measured from this moment.
fn push_square_now(queue: &SignalQueue, seed: usize) {
    for signal in square(seed, 0.0) {
        queue.push(Signal::point(signal.x, signal.y, signal::now()));
    }
}

fn wait_for_calls(recorder: &Recorder, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while recorder.calls().len() < count && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn idle_gesture_is_flushed_without_stop() {
    let temp = tempfile::tempdir().unwrap();
    let queue = SignalQueue::new();
    let recorder = Recorder::default();
    let mut app = ApplicationLoop::new(
        queue.clone(),
        trained_square(temp.path()),
        Box::new(recorder.clone()),
        LoopMode::Classification,
        settings(100),
    );
    let runner = thread::spawn(move || app.run());

    push_square_now(&queue, 7);
    wait_for_calls(&recorder, 1);
    // Further idle timeouts must not classify the same gesture again.
    thread::sleep(Duration::from_millis(300));
    queue.close();

    assert_eq!(runner.join().unwrap().unwrap(), LoopExit::Closed);
    assert_eq!(recorder.calls(), vec!["square".to_string()]);
}

#[test]
fn stop_flushes_before_idle_threshold() {
    let temp = tempfile::tempdir().unwrap();
    let queue = SignalQueue::new();
    let recorder = Recorder::default();
    let mut app = ApplicationLoop::new(
        queue.clone(),
        trained_square(temp.path()),
        Box::new(recorder.clone()),
        LoopMode::Classification,
        settings(60_000),
    );
    let runner = thread::spawn(move || app.run());

    push_square_now(&queue, 3);
    queue.push(Signal::stop(signal::now()));
    wait_for_calls(&recorder, 1);
    queue.close();

    assert_eq!(runner.join().unwrap().unwrap(), LoopExit::Closed);
    assert_eq!(recorder.calls(), vec!["square".to_string()]);
}

#[test]
fn training_loop_returns_once_all_draws_are_collected() {
    let temp = tempfile::tempdir().unwrap();
    let mut classifier = user_classifier(temp.path());
    classifier.reset_training_set(5, "square");

    let queue = SignalQueue::new();
    for seed in 0..5 {
        push_square_now(&queue, seed);
        queue.push(Signal::stop(signal::now()));
    }
    // Strokes after completion belong to nobody.
    queue.push(Signal::point(1.0, 1.0, signal::now()));

    let recorder = Recorder::default();
    let mut app = ApplicationLoop::new(
        queue.clone(),
        classifier,
        Box::new(recorder.clone()),
        LoopMode::Training,
        settings(60_000),
    );

    assert_eq!(app.run().unwrap(), LoopExit::TrainingComplete);
    assert!(app.classifier().template("square").is_some());
    assert!(app.classifier().training_symbol().is_none());
    assert!(recorder.calls().is_empty());
    assert_eq!(queue.len(), 1);

    let stored = load_store(&StoreOptions::new(temp.path().to_path_buf())).unwrap();
    assert_eq!(stored.get("square").unwrap().samples.len(), 5);
}

#[test]
fn noise_only_flush_is_not_a_training_draw() {
    let temp = tempfile::tempdir().unwrap();
    let mut classifier = user_classifier(temp.path());
    classifier.reset_training_set(5, "square");

    let queue = SignalQueue::new();
    queue.push(Signal::raising_finger(signal::now()));
    queue.push(Signal::stop(signal::now()));
    queue.close();

    let mut app = ApplicationLoop::new(
        queue,
        classifier,
        Box::new(Recorder::default()),
        LoopMode::Training,
        settings(60_000),
    );
    assert_eq!(app.run().unwrap(), LoopExit::Closed);

    let mut classifier = app.into_classifier();
    assert_eq!(classifier.add_to_training_set(&square(0, 2.0)).unwrap(), 4);
}

#[test]
fn executor_failure_does_not_stop_the_loop() {
    let temp = tempfile::tempdir().unwrap();
    let queue = SignalQueue::new();
    for seed in 0..2 {
        push_square_now(&queue, seed);
        queue.push(Signal::stop(signal::now()));
    }
    queue.close();

    let recorder = Recorder::failing();
    let mut app = ApplicationLoop::new(
        queue,
        trained_square(temp.path()),
        Box::new(recorder.clone()),
        LoopMode::Classification,
        settings(60_000),
    );

    assert_eq!(app.run().unwrap(), LoopExit::Closed);
    assert_eq!(recorder.calls().len(), 2);
}

#[test]
fn close_drops_unfinished_gesture() {
    let temp = tempfile::tempdir().unwrap();
    let queue = SignalQueue::new();
    push_square_now(&queue, 1);
    queue.close();

    let recorder = Recorder::default();
    let mut app = ApplicationLoop::new(
        queue,
        trained_square(temp.path()),
        Box::new(recorder.clone()),
        LoopMode::Classification,
        settings(60_000),
    );

    assert_eq!(app.run().unwrap(), LoopExit::Closed);
    assert!(recorder.calls().is_empty());
}

#[test]
fn training_without_session_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let queue = SignalQueue::new();
    push_square_now(&queue, 0);
    queue.push(Signal::stop(signal::now()));

    let mut app = ApplicationLoop::new(
        queue,
        user_classifier(temp.path()),
        Box::new(Recorder::default()),
        LoopMode::Training,
        settings(60_000),
    );
    assert!(matches!(app.run(), Err(ClassifierError::NotTraining)));
}
