//! The sensor: observation in, buffered records out, delivery on a timer
//!
//! ## Architecture
//!
//! - Host adapters hold an `Arc<SensorCore>` (or just a [`Sink`]) and call
//!   the observation methods from whatever thread their callbacks fire on.
//! - Every observation funnels into [`SensorCore::submit`], which runs the
//!   dedup gate under the session lock, stamps the record and appends it.
//! - Background timers sample the focused file, detect focus switches and
//!   run delivery cycles. Observation threads never touch the network.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use devsensor_core::{Config, NoMetrics, SensorCore};
//!
//! let config = Config::load().expect("failed to load config");
//! let sensor = SensorCore::from_config(config.sensor, Arc::new(NoMetrics))
//!     .expect("failed to create sensor");
//! sensor.start().expect("failed to start timers");
//!
//! sensor.editor_activated("/src/Foo.java", 1024);
//! sensor.file_saved("/src/Foo.java", 1030);
//!
//! sensor.shutdown();
//! ```

mod observe;
mod session;
mod testrun;

pub use observe::{
    classify_structure_change, language_of, BuildProblem, ElementDelta, RefactorOp, Severity,
    UnitKind,
};
pub use session::{FocusedFile, SensorSession, Transition};
pub use testrun::{split_test_name, TestFailure, TestRunTracker};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Weak};
use std::thread;

use parking_lot::{Mutex, RwLock};

use crate::buffer::EventBuffer;
use crate::collector::{
    BlockingCollector, CycleReport, Deliver, PublishStats, Publisher, Unconfigured,
};
use crate::config::SensorConfig;
use crate::error::Result;
use crate::event::{extract_file_name, keys, EventKind, SessionClock, Submission};
use crate::metrics::MetricsProvider;
use crate::scheduler::{Scheduler, TimerKind};

/// The one-method capability adapters need to feed the sensor
pub trait Sink: Send + Sync {
    /// Returns true if the submission was buffered
    fn submit(&self, submission: Submission) -> bool;
}

/// Host-level happenings other components may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent<'a> {
    FileSaved { path: &'a str },
    ProjectOpened { name: &'a str, location: &'a str },
    ProjectClosed { name: &'a str, location: &'a str },
}

/// Receives [`SensorEvent`]s after the matching records were submitted
pub trait SensorListener: Send + Sync {
    fn on_event(&self, event: &SensorEvent<'_>);
}

/// Result of [`SensorCore::flush_now`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushStatus {
    /// Nothing to send, or the sensor is disabled or shut down
    Idle,
    /// The cycle finished within the flush timeout
    Completed(CycleReport),
    /// The cycle is still running in the background
    Pending,
}

pub struct SensorCore {
    config: SensorConfig,
    session_id: String,
    session: Mutex<SensorSession>,
    tests: Mutex<TestRunTracker>,
    buffer: EventBuffer,
    clock: SessionClock,
    publisher: Publisher,
    metrics: Arc<dyn MetricsProvider>,
    scheduler: Scheduler,
    listeners: RwLock<Vec<Arc<dyn SensorListener>>>,
    shut_down: AtomicBool,
}

impl SensorCore {
    /// Create a sensor that delivers through `deliverer`
    ///
    /// Timers are not running until [`SensorCore::start`].
    pub fn new(
        config: SensorConfig,
        deliverer: Box<dyn Deliver>,
        metrics: Arc<dyn MetricsProvider>,
    ) -> Arc<Self> {
        Self::with_session_id(config, uuid::Uuid::new_v4().to_string(), deliverer, metrics)
    }

    fn with_session_id(
        config: SensorConfig,
        session_id: String,
        deliverer: Box<dyn Deliver>,
        metrics: Arc<dyn MetricsProvider>,
    ) -> Arc<Self> {
        let publisher = Publisher::new(deliverer, config.on_failure, config.max_buffered_events);
        let scheduler = Scheduler::new(&config);

        Arc::new(Self {
            config,
            session_id,
            session: Mutex::new(SensorSession::new()),
            tests: Mutex::new(TestRunTracker::new()),
            buffer: EventBuffer::new(),
            clock: SessionClock::new(),
            publisher,
            metrics,
            scheduler,
            listeners: RwLock::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Create a sensor delivering to the collector named in `config`
    ///
    /// Without a complete collector configuration (`host`, `user`, `key`) the
    /// sensor still buffers, but every delivery cycle fails with
    /// "no collector configured". Timing settings are always validated.
    pub fn from_config(config: SensorConfig, metrics: Arc<dyn MetricsProvider>) -> Result<Arc<Self>> {
        config.validate()?;
        let session_id = uuid::Uuid::new_v4().to_string();

        let deliverer: Box<dyn Deliver> = match BlockingCollector::from_config(&config, &session_id)? {
            Some(collector) => Box::new(collector),
            None => {
                tracing::info!("No collector configured, events will stay buffered");
                Box::new(Unconfigured)
            }
        };

        Ok(Self::with_session_id(config, session_id, deliverer, metrics))
    }

    /// Start the background timers
    ///
    /// Does nothing when the sensor is disabled or already shut down. Calling
    /// it twice is harmless.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if !self.config.enabled {
            tracing::info!("Sensor disabled, timers not started");
            return Ok(());
        }
        if self.is_shut_down() {
            return Ok(());
        }

        self.scheduler.start(
            TimerKind::StateChange,
            Self::on_tick(self, |core| {
                core.sample_state_change();
            }),
        )?;
        if self.config.buffer_transitions {
            self.scheduler.start(
                TimerKind::BufferTransition,
                Self::on_tick(self, |core| {
                    core.sample_buffer_transition();
                }),
            )?;
        }
        self.scheduler.start(
            TimerKind::Autosend,
            Self::on_tick(self, |core| {
                core.deliver_cycle();
            }),
        )?;

        tracing::info!(
            session_id = %self.session_id,
            state_change_secs = self.config.state_change_interval_secs,
            buffer_trans_secs = self.config.buffer_trans_interval_secs,
            autosend_secs = self.config.autosend_interval_secs,
            "Sensor started"
        );
        Ok(())
    }

    /// Timer job that only holds a weak handle, so timers never keep the
    /// sensor alive
    fn on_tick(core: &Arc<Self>, job: fn(&SensorCore)) -> impl Fn() + Send + 'static {
        let weak: Weak<Self> = Arc::downgrade(core);
        move || {
            if let Some(core) = weak.upgrade() {
                job(&core);
            }
        }
    }

    fn accepting(&self) -> bool {
        self.config.enabled && !self.is_shut_down()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Buffer one observation
    ///
    /// Never blocks on I/O and never fails; returns false when the event was
    /// suppressed as a repeat or the sensor is not accepting events.
    pub fn submit(&self, submission: Submission) -> bool {
        if !self.accepting() {
            return false;
        }

        let mut session = self.session.lock();
        if !session.accept(&submission) {
            tracing::debug!(
                kind = %submission.kind,
                path = %submission.path,
                "Suppressed repeated event"
            );
            return false;
        }
        let record = submission.into_record(self.clock.now());
        self.monitor(record.kind(), record.message());
        self.buffer.append(record);
        true
    }

    fn submit_all(&self, submissions: Vec<Submission>) -> usize {
        submissions
            .into_iter()
            .map(|s| self.submit(s))
            .filter(|accepted| *accepted)
            .count()
    }

    fn monitor(&self, kind: EventKind, message: &str) {
        if message.is_empty() {
            return;
        }
        if self.config.monitor {
            tracing::info!(target: "devsensor::monitor", kind = %kind, "{}", message);
        } else {
            tracing::debug!(target: "devsensor::monitor", kind = %kind, "{}", message);
        }
    }

    fn notify(&self, event: SensorEvent<'_>) {
        for listener in self.listeners.read().iter() {
            listener.on_event(&event);
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SensorListener>) {
        self.listeners.write().push(listener);
    }

    // ----- timer-driven sampling -----

    /// Snapshot the focused file as a state change
    ///
    /// Returns true if a record was appended.
    pub fn sample_state_change(&self) -> bool {
        if !self.accepting() {
            return false;
        }
        let Some(focused) = self.session.lock().focused().cloned() else {
            return false;
        };

        let mut submission = Submission::new(EventKind::StateChange, "Edit")
            .path(focused.path.as_str())
            .property(keys::SUBTYPE, "StateChange")
            .property(keys::CURRENT_SIZE, focused.size.to_string());

        // skip measuring when the sample would be dropped anyway
        if self.session.lock().would_suppress(&submission) {
            tracing::trace!(path = %focused.path, "State unchanged");
            return false;
        }

        let mut message = format!(
            "StateChange : {} [{}",
            extract_file_name(&focused.path),
            focused.size
        );
        if let Some(metrics) = self.metrics.measure(&focused.path) {
            metrics.write_to(&mut submission.properties);
            message.push_str(", ");
            message.push_str(&metrics.summary());
        }
        message.push(']');

        self.submit(submission.message(message))
    }

    /// Record a focus switch between two files
    ///
    /// Returns true if a record was appended.
    pub fn sample_buffer_transition(&self) -> bool {
        if !self.accepting() {
            return false;
        }
        let Some(transition) = self.session.lock().transition() else {
            return false;
        };

        let message = format!(
            "BuffTrans : {} --> {}",
            extract_file_name(&transition.from),
            extract_file_name(&transition.to)
        );
        let submission = Submission::new(EventKind::BufferTransition, "Edit")
            .path(transition.to.as_str())
            .property(keys::SUBTYPE, "BufferTransition")
            .property(keys::FROM_BUFFER, transition.from.as_str())
            .property(keys::TO_BUFFER, transition.to.as_str())
            .property(keys::MODIFIED, transition.modified.to_string())
            .message(message);

        self.submit(submission)
    }

    // ----- delivery -----

    /// Run one delivery cycle on the calling thread
    ///
    /// Used by the autosend timer; observation threads should call
    /// [`SensorCore::flush_now`] instead.
    pub fn deliver_cycle(&self) -> Option<CycleReport> {
        if self.is_shut_down() {
            return None;
        }
        self.publisher.run_cycle(&self.buffer, &self.shut_down)
    }

    /// Deliver now on a worker thread, waiting at most the flush timeout
    pub fn flush_now(self: &Arc<Self>) -> FlushStatus {
        if !self.accepting() || self.buffer.is_empty() {
            return FlushStatus::Idle;
        }

        let (tx, rx) = mpsc::channel();
        let core = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("devsensor-flush".to_string())
            .spawn(move || {
                let report = core.deliver_cycle();
                let _ = tx.send(report);
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Failed to spawn flush worker");
            return FlushStatus::Idle;
        }

        match rx.recv_timeout(self.config.flush_timeout()) {
            Ok(Some(report)) => FlushStatus::Completed(report),
            Ok(None) => FlushStatus::Idle,
            Err(_) => {
                tracing::debug!(
                    timeout_secs = self.config.flush_timeout_secs,
                    "Flush still running in background"
                );
                FlushStatus::Pending
            }
        }
    }

    /// Stop timers and make one last delivery attempt
    ///
    /// Failed events are not requeued, including those of a cycle that was
    /// already in flight; the final cycle waits for it to settle first.
    /// Later calls return `None` and do nothing; `submit` becomes a no-op.
    pub fn shutdown(&self) -> Option<CycleReport> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return None;
        }

        let stopped = self.scheduler.stop_all();
        let report = self.publisher.run_cycle(&self.buffer, &self.shut_down);
        let stats = self.publisher.stats();
        tracing::info!(
            timers_stopped = stopped,
            final_batch = report.as_ref().map(|r| r.batch_size).unwrap_or(0),
            events_sent = stats.events_sent,
            events_dropped = stats.events_dropped,
            "Sensor shut down"
        );
        report
    }

    // ----- focus tracking -----

    pub fn editor_activated(&self, path: &str, size: usize) {
        self.session.lock().editor_activated(path, size);
    }

    pub fn buffer_changed(&self, size: usize) {
        self.session.lock().buffer_changed(size);
    }

    pub fn editor_deactivated(&self, path: &str, size: usize, dirty: bool) {
        self.session.lock().editor_deactivated(path, size, dirty);
    }

    /// An editor closed; `still_focused` is whether another editor kept focus
    pub fn editor_closed(&self, path: &str, still_focused: bool) {
        let mut session = self.session.lock();
        if !still_focused || session.focused_path() == path {
            session.focus_cleared();
        }
    }

    // ----- observations -----

    pub fn file_opened(&self, path: &str) -> usize {
        self.submit_all(observe::file_opened(path))
    }

    pub fn file_closed(&self, path: &str) -> usize {
        self.submit_all(observe::file_closed(path))
    }

    /// Record a save with fresh metrics and notify listeners
    pub fn file_saved(&self, path: &str, size: usize) -> usize {
        let metrics = self.metrics.measure(path);
        let count = self.submit_all(observe::file_saved(path, size, metrics.as_ref()));
        if self.accepting() {
            self.notify(SensorEvent::FileSaved { path });
        }
        count
    }

    pub fn project_opened(&self, name: &str, location: &str) -> usize {
        let count = self.submit_all(observe::project_opened(name, location));
        if self.accepting() {
            self.notify(SensorEvent::ProjectOpened { name, location });
        }
        count
    }

    pub fn project_closed(&self, name: &str, location: &str) -> usize {
        let count = self.submit_all(observe::project_closed(name, location));
        if self.accepting() {
            self.notify(SensorEvent::ProjectClosed { name, location });
        }
        count
    }

    pub fn breakpoint_set(&self, path: &str, line: u32) -> usize {
        self.submit_all(observe::breakpoint(path, line, true))
    }

    pub fn breakpoint_unset(&self, path: &str, line: u32) -> usize {
        self.submit_all(observe::breakpoint(path, line, false))
    }

    /// Record compile errors for `path`
    ///
    /// Only reports for the focused file count; a full rebuild marks every
    /// file and would flood the buffer otherwise.
    pub fn build_problems(&self, path: &str, problems: &[BuildProblem]) -> usize {
        if self.session.lock().focused_path() != path {
            return 0;
        }
        self.submit_all(observe::build_errors(path, problems))
    }

    /// Classify one structure change and record the refactorings found
    pub fn structure_changed(
        &self,
        additions: Vec<ElementDelta>,
        deletions: Vec<ElementDelta>,
    ) -> usize {
        let submissions = observe::classify_structure_change(additions, deletions)
            .iter()
            .filter_map(observe::refactor)
            .collect();
        self.submit_all(submissions)
    }

    // ----- unit tests -----

    pub fn test_run_started(&self, test_count: usize) {
        self.tests.lock().run_started(test_count);
    }

    pub fn test_started(&self) {
        self.tests.lock().test_started();
    }

    pub fn test_failed(&self, kind: TestFailure, trace: &str) {
        self.tests.lock().test_failed(kind, trace);
    }

    /// Record a finished test; the path is the file defining the test class,
    /// or the focused file if the class was never seen
    pub fn test_ended(&self, test: &str) -> bool {
        let submission = self.tests.lock().test_ended(test, |class_name| {
            let session = self.session.lock();
            session
                .resolve_class(class_name)
                .or_else(|| session.focused().map(|f| f.path.as_str()))
                .map(str::to_string)
        });
        self.submit(submission)
    }

    // ----- inspection -----

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn pending_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> PublishStats {
        self.publisher.stats()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn focused_file(&self) -> Option<FocusedFile> {
        self.session.lock().focused().cloned()
    }

    pub fn class_file(&self, class_name: &str) -> Option<String> {
        self.session
            .lock()
            .resolve_class(class_name)
            .map(str::to_string)
    }
}

impl Sink for SensorCore {
    fn submit(&self, submission: Submission) -> bool {
        SensorCore::submit(self, submission)
    }
}

impl Drop for SensorCore {
    fn drop(&mut self) {
        if !self.is_shut_down() && !self.buffer.is_empty() {
            tracing::warn!(
                pending = self.buffer.len(),
                "Sensor dropped without shutdown, buffered events lost"
            );
        }
        self.scheduler.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::DeliveryOutcome;
    use crate::event::EventRecord;
    use crate::metrics::{FileMetrics, NoMetrics};

    /// Records every batch and reports success
    #[derive(Clone, Default)]
    struct Recorder {
        batches: Arc<Mutex<Vec<Vec<EventRecord>>>>,
    }

    impl Deliver for Recorder {
        fn deliver(&self, batch: &[EventRecord]) -> DeliveryOutcome {
            self.batches.lock().push(batch.to_vec());
            DeliveryOutcome::Success {
                accepted: batch.len(),
            }
        }
    }

    fn sensor() -> (Arc<SensorCore>, Recorder) {
        let recorder = Recorder::default();
        let core = SensorCore::new(
            SensorConfig::default(),
            Box::new(recorder.clone()),
            Arc::new(NoMetrics),
        );
        (core, recorder)
    }

    fn drain(core: &SensorCore) -> Vec<EventRecord> {
        core.buffer.drain_all()
    }

    #[test]
    fn test_state_change_sampling_dedups() {
        let (core, _) = sensor();
        assert!(!core.sample_state_change());

        core.editor_activated("/p/A.java", 100);
        assert!(core.sample_state_change());
        assert!(!core.sample_state_change());

        core.buffer_changed(150);
        assert!(core.sample_state_change());

        let records = drain(&core);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].property(keys::CURRENT_SIZE), Some("100"));
        assert_eq!(records[1].property(keys::CURRENT_SIZE), Some("150"));
        assert_eq!(records[0].message(), "StateChange : A.java [100]");
    }

    #[test]
    fn test_state_change_uses_metrics_and_indexes_class() {
        let metrics = |path: &str| {
            path.ends_with("CalcTest.java").then(|| FileMetrics {
                class_name: Some("p.CalcTest".to_string()),
                method_count: 2,
                statement_count: 9,
                tests: None,
            })
        };
        let core = SensorCore::new(
            SensorConfig::default(),
            Box::new(Recorder::default()),
            Arc::new(metrics),
        );
        core.editor_activated("/src/p/CalcTest.java", 300);
        assert!(core.sample_state_change());

        assert_eq!(core.class_file("p.CalcTest").as_deref(), Some("/src/p/CalcTest.java"));
        let records = drain(&core);
        assert_eq!(records[0].property(keys::CURRENT_METHODS), Some("2"));
    }

    #[test]
    fn test_buffer_transition_sampling() {
        let (core, _) = sensor();
        core.editor_activated("/a", 1);
        assert!(!core.sample_buffer_transition());

        core.editor_deactivated("/a", 1, false);
        core.editor_activated("/b", 1);
        assert!(core.sample_buffer_transition());
        assert!(!core.sample_buffer_transition());

        let records = drain(&core);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind(), EventKind::BufferTransition);
        assert_eq!(records[0].property(keys::FROM_BUFFER), Some("/a"));
        assert_eq!(records[0].property(keys::TO_BUFFER), Some("/b"));
        assert_eq!(records[0].property(keys::MODIFIED), Some("false"));
        assert_eq!(records[0].path(), "/b");
    }

    #[test]
    fn test_disabled_sensor_ignores_everything() {
        let core = SensorCore::new(
            SensorConfig {
                enabled: false,
                ..Default::default()
            },
            Box::new(Recorder::default()),
            Arc::new(NoMetrics),
        );
        core.start().unwrap();
        assert!(!core.scheduler().any_running());
        assert_eq!(core.file_opened("/a.java"), 0);
        core.editor_activated("/a.java", 1);
        assert!(!core.sample_state_change());
        assert_eq!(core.flush_now(), FlushStatus::Idle);
    }

    #[test]
    fn test_build_problems_only_for_focused_file() {
        let (core, _) = sensor();
        let problems = [BuildProblem::error("missing return")];
        assert_eq!(core.build_problems("/src/A.java", &problems), 0);

        core.editor_activated("/src/A.java", 10);
        assert_eq!(core.build_problems("/src/B.java", &problems), 0);
        assert_eq!(core.build_problems("/src/A.java", &problems), 1);
    }

    #[test]
    fn test_test_ended_resolves_class_then_focus() {
        let (core, _) = sensor();
        core.editor_activated("/src/Other.java", 5);
        core.submit(
            Submission::new(EventKind::StateChange, "Edit")
                .path("/src/p/CalcTest.java")
                .property(keys::CURRENT_SIZE, "10")
                .property(keys::CLASS_NAME, "p.CalcTest"),
        );
        drain(&core);

        core.test_run_started(2);
        core.test_started();
        assert!(core.test_ended("testAdd(p.CalcTest)"));
        core.test_started();
        assert!(core.test_ended("testOther(p.Unknown)"));

        let records = drain(&core);
        assert_eq!(records[0].path(), "/src/p/CalcTest.java");
        assert_eq!(records[1].path(), "/src/Other.java");
    }

    #[test]
    fn test_listeners_see_saves_and_projects() {
        #[derive(Default)]
        struct Seen(Mutex<Vec<String>>);
        impl SensorListener for Seen {
            fn on_event(&self, event: &SensorEvent<'_>) {
                self.0.lock().push(format!("{:?}", event));
            }
        }

        let (core, _) = sensor();
        let seen = Arc::new(Seen::default());
        core.add_listener(seen.clone());

        assert_eq!(core.file_saved("/src/A.java", 10), 2);
        core.project_opened("demo", "/ws/demo");
        core.project_closed("demo", "/ws/demo");

        let seen = seen.0.lock();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("FileSaved"));
        assert!(seen[2].contains("ProjectClosed"));
    }

    #[test]
    fn test_structure_change_records() {
        let (core, _) = sensor();
        let count = core.structure_changed(
            vec![ElementDelta::new(UnitKind::Method, "start", "Foo", "/src/Foo.java")],
            vec![ElementDelta::new(UnitKind::Method, "run", "Foo", "/src/Foo.java")],
        );
        assert_eq!(count, 1);
        let records = drain(&core);
        assert_eq!(records[0].kind(), EventKind::Refactor);
        assert_eq!(records[0].property("subsubtype"), Some("Rename"));
    }

    #[test]
    fn test_flush_now_delivers_buffer() {
        let (core, recorder) = sensor();
        assert_eq!(core.flush_now(), FlushStatus::Idle);
        assert!(recorder.batches.lock().is_empty());

        core.file_opened("/src/A.java");
        match core.flush_now() {
            FlushStatus::Completed(report) => assert_eq!(report.batch_size, 2),
            other => panic!("unexpected flush status: {:?}", other),
        }
        assert_eq!(core.pending_count(), 0);
        assert_eq!(core.stats().events_sent, 2);
    }

    #[test]
    fn test_from_config_without_collector_still_buffers() {
        let core = SensorCore::from_config(SensorConfig::default(), Arc::new(NoMetrics)).unwrap();
        assert_eq!(core.file_opened("/src/A.java"), 2);
        assert_eq!(core.pending_count(), 2);

        let report = core.shutdown().unwrap();
        assert_eq!(report.describe(), "failed (no collector configured), 2 dropped");
    }

    #[test]
    fn test_from_config_rejects_zero_timeouts() {
        let config = SensorConfig {
            flush_timeout_secs: 0,
            ..Default::default()
        };
        assert!(SensorCore::from_config(config, Arc::new(NoMetrics)).is_err());
    }

    #[test]
    fn test_shutdown_is_idempotent_and_final() {
        let (core, recorder) = sensor();
        core.start().unwrap();
        assert!(core.scheduler().is_running(TimerKind::StateChange));

        core.file_opened("/src/A.java");
        let report = core.shutdown().unwrap();
        assert_eq!(report.batch_size, 2);
        assert!(!core.scheduler().any_running());

        assert!(core.shutdown().is_none());
        assert!(!core.submit(Submission::new(EventKind::DevEvent, "Edit")));
        assert_eq!(core.pending_count(), 0);
        assert_eq!(recorder.batches.lock().len(), 1);
    }
}
