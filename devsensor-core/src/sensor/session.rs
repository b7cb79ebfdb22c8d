//! Per-session mutable state shared by observation threads and timers
//!
//! Everything here sits behind the one session lock in `SensorCore`, which
//! makes each dedup read-then-write atomic.

use std::collections::HashMap;

use crate::dedup::{Candidate, Deduplicator};
use crate::event::{keys, EventKind, Submission};

/// The file that currently has editor focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedFile {
    pub path: String,
    /// Live buffer length, updated on every document change
    pub size: usize,
}

/// A pending focus switch as seen by the buffer-transition sampler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub to: String,
    /// Whether the file focus left was edited while it had focus
    pub modified: bool,
}

#[derive(Debug, Default)]
pub struct SensorSession {
    dedup: Deduplicator,
    class_index: HashMap<String, String>,
    focused: Option<FocusedFile>,
    previous: Option<String>,
    /// Size of the focused file when it gained focus
    threshold_size: usize,
    modified_from: bool,
}

impl SensorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the dedup gate; on acceptance refresh derived state
    ///
    /// Returns false if the submission repeats the last accepted one.
    pub fn accept(&mut self, submission: &Submission) -> bool {
        if !self.dedup.accept(&Candidate::of(submission)) {
            return false;
        }
        if submission.kind == EventKind::StateChange && !submission.path.is_empty() {
            if let Some(class_name) = submission
                .properties
                .get(keys::CLASS_NAME)
                .filter(|c| !c.is_empty())
            {
                self.class_index
                    .insert(class_name.to_string(), submission.path.clone());
            }
        }
        true
    }

    /// Whether a submission would be suppressed, without recording anything
    pub fn would_suppress(&self, submission: &Submission) -> bool {
        self.dedup.should_suppress(&Candidate::of(submission))
    }

    /// File a fully-qualified class name was last seen in
    pub fn resolve_class(&self, class_name: &str) -> Option<&str> {
        self.class_index.get(class_name).map(String::as_str)
    }

    pub fn class_index_len(&self) -> usize {
        self.class_index.len()
    }

    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    // ----- focus tracking -----

    pub fn editor_activated(&mut self, path: &str, size: usize) {
        self.focused = Some(FocusedFile {
            path: path.to_string(),
            size,
        });
        self.threshold_size = size;
    }

    pub fn buffer_changed(&mut self, size: usize) {
        if let Some(focused) = self.focused.as_mut() {
            focused.size = size;
        }
    }

    /// Focus left `path`; it becomes the source of the next transition
    pub fn editor_deactivated(&mut self, path: &str, size: usize, dirty: bool) {
        if path.is_empty() {
            self.previous = None;
            self.modified_from = false;
            return;
        }
        self.previous = Some(path.to_string());
        self.modified_from = dirty || self.threshold_size != size;
    }

    /// No editor has focus any more
    pub fn focus_cleared(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<&FocusedFile> {
        self.focused.as_ref()
    }

    pub fn focused_path(&self) -> &str {
        self.focused.as_ref().map(|f| f.path.as_str()).unwrap_or("")
    }

    /// Current from/to pair, if both ends are known
    pub fn transition(&self) -> Option<Transition> {
        let to = self.focused.as_ref()?;
        let from = self.previous.as_ref()?;
        Some(Transition {
            from: from.clone(),
            to: to.path.clone(),
            modified: self.modified_from,
        })
    }
}
