//! Suppression of repeated state-change and buffer-transition events
//!
//! Both streams are sampled on a timer, so the same observation tends to be
//! reported over and over while the developer sits in one file. Only the
//! first of a run of identical observations is kept.

use crate::event::{keys, EventKind, Submission};

/// The part of a submission the deduplicator looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate<'a> {
    StateChange { path: &'a str, size: &'a str },
    BufferTransition { from: &'a str, to: &'a str },
    /// Any other kind; always accepted
    Ungated,
}

impl<'a> Candidate<'a> {
    /// Read the gated fields out of a submission, empty when missing
    pub fn of(submission: &'a Submission) -> Self {
        match submission.kind {
            EventKind::StateChange => Candidate::StateChange {
                path: &submission.path,
                size: submission.properties.get_or_empty(keys::CURRENT_SIZE),
            },
            EventKind::BufferTransition => Candidate::BufferTransition {
                from: submission.properties.get_or_empty(keys::FROM_BUFFER),
                to: submission.properties.get_or_empty(keys::TO_BUFFER),
            },
            _ => Candidate::Ungated,
        }
    }
}

/// Last accepted gated observations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicator {
    last_state_change: Option<(String, String)>,
    last_buffer_transition: Option<(String, String)>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `candidate` repeats the last accepted observation of its kind
    pub fn should_suppress(&self, candidate: &Candidate<'_>) -> bool {
        match candidate {
            Candidate::StateChange { path, size } => {
                matches!(&self.last_state_change, Some((p, s)) if p == *path && s == *size)
            }
            Candidate::BufferTransition { from, to } => {
                if from.is_empty() || to.is_empty() || from == to {
                    return true;
                }
                matches!(&self.last_buffer_transition, Some((f, t)) if f == *from && t == *to)
            }
            Candidate::Ungated => false,
        }
    }

    /// Check and, when accepted, record the candidate. Returns true if accepted.
    ///
    /// State is left untouched on suppression.
    pub fn accept(&mut self, candidate: &Candidate<'_>) -> bool {
        if self.should_suppress(candidate) {
            return false;
        }
        match candidate {
            Candidate::StateChange { path, size } => {
                self.last_state_change = Some((path.to_string(), size.to_string()));
            }
            Candidate::BufferTransition { from, to } => {
                self.last_buffer_transition = Some((from.to_string(), to.to_string()));
            }
            Candidate::Ungated => {}
        }
        true
    }

    pub fn last_state_change(&self) -> Option<(&str, &str)> {
        self.last_state_change
            .as_ref()
            .map(|(p, s)| (p.as_str(), s.as_str()))
    }

    pub fn last_buffer_transition(&self) -> Option<(&str, &str)> {
        self.last_buffer_transition
            .as_ref()
            .map(|(f, t)| (f.as_str(), t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(path: &'static str, size: &'static str) -> Candidate<'static> {
        Candidate::StateChange { path, size }
    }

    fn trans(from: &'static str, to: &'static str) -> Candidate<'static> {
        Candidate::BufferTransition { from, to }
    }

    #[test]
    fn test_state_change_repeats_suppressed() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(&state("/p/A.java", "100")));
        assert!(!dedup.accept(&state("/p/A.java", "100")));
        assert!(!dedup.accept(&state("/p/A.java", "100")));
        assert!(dedup.accept(&state("/p/A.java", "150")));
        assert!(dedup.accept(&state("/p/B.java", "150")));
        assert_eq!(dedup.last_state_change(), Some(("/p/B.java", "150")));
    }

    #[test]
    fn test_noop_transitions_never_accepted() {
        let mut dedup = Deduplicator::new();
        assert!(!dedup.accept(&trans("/a", "/a")));
        assert!(!dedup.accept(&trans("", "/a")));
        assert!(!dedup.accept(&trans("/a", "")));
        assert!(!dedup.accept(&trans("", "")));
        assert_eq!(dedup.last_buffer_transition(), None);
    }

    #[test]
    fn test_transition_pairs() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(&trans("/a", "/b")));
        assert!(!dedup.accept(&trans("/a", "/b")));
        assert!(dedup.accept(&trans("/b", "/a")));
        // a suppressed no-op does not reset the last pair
        assert!(!dedup.accept(&trans("/a", "/a")));
        assert!(!dedup.accept(&trans("/b", "/a")));
    }

    #[test]
    fn test_streams_are_independent() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(&state("/a", "1")));
        assert!(dedup.accept(&trans("/a", "/b")));
        assert!(!dedup.accept(&state("/a", "1")));
        assert!(dedup.accept(&Candidate::Ungated));
        assert!(dedup.accept(&Candidate::Ungated));
    }

    #[test]
    fn test_candidate_from_submission() {
        let sub = Submission::new(EventKind::BufferTransition, "Edit")
            .property(keys::FROM_BUFFER, "/a")
            .property(keys::TO_BUFFER, "/b");
        assert_eq!(Candidate::of(&sub), trans("/a", "/b"));

        let sub = Submission::new(EventKind::StateChange, "Edit").path("/a");
        assert_eq!(Candidate::of(&sub), state("/a", ""));

        let sub = Submission::new(EventKind::UnitTest, "Test");
        assert_eq!(Candidate::of(&sub), Candidate::Ungated);
    }
}
