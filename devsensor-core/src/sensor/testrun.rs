//! Unit-test run tracking
//!
//! Test runners report a run as a sequence of callbacks. The tracker keeps
//! the per-run and per-test state between them and turns each finished test
//! into one `UnitTest` submission.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::event::{EventKind, Submission};

/// How a test went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFailure {
    /// An assertion did not hold
    Failure,
    /// The test threw unexpectedly
    Error,
}

/// Split a runner test name of the form `method(fully.qualified.Class)`
///
/// Returns `(class, method)`. Without parentheses the whole name is the
/// method and the class is empty.
pub fn split_test_name(test: &str) -> (&str, &str) {
    match (test.find('('), test.find(')')) {
        (Some(open), Some(close)) if open < close => (&test[open + 1..close], &test[..open]),
        (Some(open), _) => ("", &test[..open]),
        _ => ("", test),
    }
}

#[derive(Debug, Default)]
pub struct TestRunTracker {
    run_started: Option<DateTime<Utc>>,
    test_count: usize,
    test_index: usize,
    test_started: Option<Instant>,
    failure: String,
    error: String,
}

impl TestRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_started(&mut self, test_count: usize) {
        self.run_started = Some(Utc::now());
        self.test_count = test_count;
        self.test_index = 1;
    }

    pub fn test_started(&mut self) {
        self.test_started = Some(Instant::now());
        self.failure.clear();
        self.error.clear();
    }

    pub fn test_failed(&mut self, kind: TestFailure, trace: &str) {
        match kind {
            TestFailure::Failure => self.failure = trace.to_string(),
            TestFailure::Error => self.error = trace.to_string(),
        }
    }

    /// Close out `test` and build its record
    ///
    /// `resolve` maps the test class to the file that defines it; `None`
    /// leaves the path empty for the caller to fill.
    pub fn test_ended<F>(&mut self, test: &str, resolve: F) -> Submission
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let (class_name, method) = split_test_name(test);
        let name = if class_name.is_empty() {
            method.to_string()
        } else {
            format!("{}.{}", class_name, method)
        };

        let run_started = *self.run_started.get_or_insert_with(Utc::now);
        let elapsed_ms = self
            .test_started
            .take()
            .map(|started| started.elapsed().as_millis())
            .unwrap_or(0);

        let mut submission = Submission::new(EventKind::UnitTest, "Test")
            .property("runtime", run_started.timestamp_millis().to_string())
            .property("elapsedTime", elapsed_ms.to_string());

        let result = if !self.failure.is_empty() {
            submission = submission.property("failureString", self.failure.as_str());
            "fail"
        } else if !self.error.is_empty() {
            submission = submission.property("errorString", self.error.as_str());
            "fail"
        } else {
            "pass"
        };

        submission = submission
            .property("testCase", method)
            .property("testName", class_name)
            .property("testcount", self.test_count.to_string())
            .property("testindice", self.test_index.to_string())
            .property("result", result)
            .path(resolve(class_name).unwrap_or_default())
            .message(format!("{} : {}", name, result));

        self.test_index += 1;
        self.failure.clear();
        self.error.clear();
        submission
    }

    pub fn test_index(&self) -> usize {
        self.test_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_test_name() {
        assert_eq!(
            split_test_name("testAdd(org.example.CalcTest)"),
            ("org.example.CalcTest", "testAdd")
        );
        assert_eq!(split_test_name("initializationError"), ("", "initializationError"));
        assert_eq!(split_test_name("broken(unclosed"), ("", "broken"));
    }

    #[test]
    fn test_passing_test_record() {
        let mut tracker = TestRunTracker::new();
        tracker.run_started(2);
        tracker.test_started();
        let submission = tracker.test_ended("testAdd(p.CalcTest)", |class| {
            assert_eq!(class, "p.CalcTest");
            Some("/src/p/CalcTest.java".to_string())
        });

        assert_eq!(submission.kind, EventKind::UnitTest);
        assert_eq!(submission.path, "/src/p/CalcTest.java");
        assert_eq!(submission.properties.get("result"), Some("pass"));
        assert_eq!(submission.properties.get("testCase"), Some("testAdd"));
        assert_eq!(submission.properties.get("testName"), Some("p.CalcTest"));
        assert_eq!(submission.properties.get("testcount"), Some("2"));
        assert_eq!(submission.properties.get("testindice"), Some("1"));
        assert_eq!(submission.properties.get("failureString"), None);
        assert_eq!(submission.message, "p.CalcTest.testAdd : pass");
        assert_eq!(tracker.test_index(), 2);
    }

    #[test]
    fn test_failure_resets_per_test() {
        let mut tracker = TestRunTracker::new();
        tracker.run_started(2);

        tracker.test_started();
        tracker.test_failed(TestFailure::Failure, "expected 2 but was 3");
        let failed = tracker.test_ended("testA(p.T)", |_| None);
        assert_eq!(failed.properties.get("result"), Some("fail"));
        assert_eq!(failed.properties.get("failureString"), Some("expected 2 but was 3"));
        assert_eq!(failed.path, "");

        tracker.test_started();
        tracker.test_failed(TestFailure::Error, "NullPointerException");
        let errored = tracker.test_ended("testB(p.T)", |_| None);
        assert_eq!(errored.properties.get("errorString"), Some("NullPointerException"));
        assert_eq!(errored.properties.get("failureString"), None);
        assert_eq!(errored.properties.get("testindice"), Some("2"));

        tracker.test_started();
        let passed = tracker.test_ended("testC(p.T)", |_| None);
        assert_eq!(passed.properties.get("result"), Some("pass"));
    }

    #[test]
    fn test_name_without_class() {
        let mut tracker = TestRunTracker::new();
        let submission = tracker.test_ended("initializationError", |_| None);
        assert_eq!(submission.message, "initializationError : pass");
        assert_eq!(submission.properties.get("elapsedTime"), Some("0"));
    }
}
