//! JSON-lines observation format read by `replay` and `listen`
//!
//! One object per line, tagged by `op`:
//!
//! ```text
//! {"op":"editor_activated","path":"/src/Foo.java","size":120}
//! {"op":"file_saved","path":"/src/Foo.java","size":130}
//! {"op":"submit","kind":"Activity","type":"Open File","path":"/src/Foo.java"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use devsensor_core::sensor::{BuildProblem, TestFailure};
use devsensor_core::{SensorCore, Submission};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Observation {
    /// A ready-made event, passed straight to `submit`
    Submit(Submission),
    EditorActivated {
        path: String,
        size: usize,
    },
    BufferChanged {
        size: usize,
    },
    EditorDeactivated {
        path: String,
        size: usize,
        #[serde(default)]
        dirty: bool,
    },
    EditorClosed {
        path: String,
        #[serde(default)]
        still_focused: bool,
    },
    FileOpened {
        path: String,
    },
    FileClosed {
        path: String,
    },
    FileSaved {
        path: String,
        size: usize,
    },
    ProjectOpened {
        name: String,
        location: String,
    },
    ProjectClosed {
        name: String,
        location: String,
    },
    Breakpoint {
        path: String,
        line: u32,
        #[serde(default = "default_set")]
        set: bool,
    },
    BuildErrors {
        path: String,
        errors: Vec<String>,
    },
    TestRunStarted {
        count: usize,
    },
    TestStarted,
    TestFailed {
        trace: String,
        /// An unexpected error rather than a failed assertion
        #[serde(default)]
        error: bool,
    },
    TestEnded {
        test: String,
    },
    /// Take a state-change sample now instead of waiting for the timer
    SampleStateChange,
    /// Take a buffer-transition sample now
    SampleBufferTransition,
    /// Deliver buffered events now
    Flush,
}

fn default_set() -> bool {
    true
}

/// Parse one line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> serde_json::Result<Option<Observation>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

impl Observation {
    /// Feed this observation to `sensor`
    pub fn apply(self, sensor: &Arc<SensorCore>) {
        match self {
            Observation::Submit(submission) => {
                sensor.submit(submission);
            }
            Observation::EditorActivated { path, size } => sensor.editor_activated(&path, size),
            Observation::BufferChanged { size } => sensor.buffer_changed(size),
            Observation::EditorDeactivated { path, size, dirty } => {
                sensor.editor_deactivated(&path, size, dirty)
            }
            Observation::EditorClosed {
                path,
                still_focused,
            } => sensor.editor_closed(&path, still_focused),
            Observation::FileOpened { path } => {
                sensor.file_opened(&path);
            }
            Observation::FileClosed { path } => {
                sensor.file_closed(&path);
            }
            Observation::FileSaved { path, size } => {
                sensor.file_saved(&path, size);
            }
            Observation::ProjectOpened { name, location } => {
                sensor.project_opened(&name, &location);
            }
            Observation::ProjectClosed { name, location } => {
                sensor.project_closed(&name, &location);
            }
            Observation::Breakpoint { path, line, set } => {
                if set {
                    sensor.breakpoint_set(&path, line);
                } else {
                    sensor.breakpoint_unset(&path, line);
                }
            }
            Observation::BuildErrors { path, errors } => {
                let problems: Vec<_> = errors.into_iter().map(BuildProblem::error).collect();
                sensor.build_problems(&path, &problems);
            }
            Observation::TestRunStarted { count } => sensor.test_run_started(count),
            Observation::TestStarted => sensor.test_started(),
            Observation::TestFailed { trace, error } => {
                let kind = if error {
                    TestFailure::Error
                } else {
                    TestFailure::Failure
                };
                sensor.test_failed(kind, &trace);
            }
            Observation::TestEnded { test } => {
                sensor.test_ended(&test);
            }
            Observation::SampleStateChange => {
                sensor.sample_state_change();
            }
            Observation::SampleBufferTransition => {
                sensor.sample_buffer_transition();
            }
            Observation::Flush => {
                sensor.flush_now();
            }
        }
    }
}
