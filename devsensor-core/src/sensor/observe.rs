//! Turning host observations into submissions
//!
//! Pure functions: no locking, no clock, no buffer. `SensorCore` calls these
//! and pushes the result through `submit`.

use crate::event::{extract_file_name, keys, EventKind, Submission};
use crate::metrics::FileMetrics;

/// Language tag for a source path, if the sensor knows it
pub fn language_of(path: &str) -> Option<&'static str> {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("java") => Some("java"),
        _ => None,
    }
}

fn activity(activity_type: &str, path: &str) -> Submission {
    Submission::new(EventKind::Activity, activity_type)
        .path(path)
        .message(format!("{} : {}", activity_type, extract_file_name(path)))
}

fn file_event(subtype: &str, path: &str) -> Submission {
    let mut submission = Submission::new(EventKind::DevEvent, "Edit")
        .path(path)
        .property(keys::SUBTYPE, subtype);
    if let Some(language) = language_of(path) {
        submission = submission.property(keys::LANGUAGE, language);
    }
    submission
        .property(keys::UNIT_TYPE, "file")
        .property(keys::UNIT_NAME, extract_file_name(path))
}

pub fn file_opened(path: &str) -> Vec<Submission> {
    vec![
        activity("Open File", path),
        file_event("Open", path).message(format!("Open File : {}", extract_file_name(path))),
    ]
}

/// Closing only yields an activity record for source files
pub fn file_closed(path: &str) -> Vec<Submission> {
    let mut out = Vec::with_capacity(2);
    if language_of(path).is_some() {
        out.push(activity("Close File", path));
    }
    out.push(file_event("Close", path).message(format!("Close File : {}", extract_file_name(path))));
    out
}

pub fn file_saved(path: &str, size: usize, metrics: Option<&FileMetrics>) -> Vec<Submission> {
    let mut message = format!("Save File : {} [{}", extract_file_name(path), size);
    let mut save = file_event("Save", path).property(keys::CURRENT_SIZE, size.to_string());
    if let Some(metrics) = metrics {
        metrics.write_to(&mut save.properties);
        message.push_str(", ");
        message.push_str(&metrics.summary());
    }
    message.push(']');

    vec![activity("Save File", path), save.message(message)]
}

fn project_event(subtype: &str, activity_type: &str, name: &str, location: &str) -> Vec<Submission> {
    vec![
        activity(activity_type, location),
        Submission::new(EventKind::DevEvent, "Edit")
            .path(location)
            .property(keys::SUBTYPE, subtype)
            .property(keys::UNIT_TYPE, "project")
            .property(keys::UNIT_NAME, name)
            .message(format!("{} : {}", activity_type, name)),
    ]
}

pub fn project_opened(name: &str, location: &str) -> Vec<Submission> {
    project_event("Open", "Open Project", name, location)
}

pub fn project_closed(name: &str, location: &str) -> Vec<Submission> {
    project_event("Close", "Close Project", name, location)
}

pub fn breakpoint(path: &str, line: u32, set: bool) -> Vec<Submission> {
    let (state, label) = if set {
        ("set", "Set Breakpoint")
    } else {
        ("unset", "Unset Breakpoint")
    };
    let message = format!("Debug : {} [{},{}]", extract_file_name(path), label, line);
    vec![
        Submission::new(EventKind::Activity, "Debug")
            .path(path)
            .property("type", label)
            .property("lineno", line.to_string())
            .message(message.clone()),
        Submission::new(EventKind::Breakpoint, "Debug")
            .path(path)
            .property(keys::SUBTYPE, "BreakPoint")
            .property("set", state)
            .property("line", line.to_string())
            .message(message),
    ]
}

/// Severity of a compiler problem marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One problem marker from a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProblem {
    pub severity: Severity,
    pub message: String,
}

impl BuildProblem {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// One record per distinct error in `problems`; warnings and infos are ignored
pub fn build_errors(path: &str, problems: &[BuildProblem]) -> Vec<Submission> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for problem in problems {
        if problem.severity != Severity::Error || !seen.insert(problem.message.as_str()) {
            continue;
        }
        out.push(
            Submission::new(EventKind::BuildError, "Build")
                .path(path)
                .property(keys::SUBTYPE, "Compile")
                .property("success", "false")
                .property("error", problem.message.as_str())
                .message(format!(
                    "Build Error : {} [{}]",
                    extract_file_name(path),
                    problem.message
                )),
        );
    }
    out
}

// ----- structure changes -----

/// Kind of program unit a structure delta touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Class,
    Field,
    Method,
    Import,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Class => "Class",
            UnitKind::Field => "Field",
            UnitKind::Method => "Method",
            UnitKind::Import => "Import",
        }
    }
}

/// A program element added to or removed from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDelta {
    pub unit: UnitKind,
    pub name: String,
    /// Enclosing element, e.g. the class that owns a method
    pub parent: String,
    /// File the element lives in
    pub file: String,
}

impl ElementDelta {
    pub fn new(
        unit: UnitKind,
        name: impl Into<String>,
        parent: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            unit,
            name: name.into(),
            parent: parent.into(),
            file: file.into(),
        }
    }
}

/// Refactoring inferred from one structure change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefactorOp {
    Add(ElementDelta),
    Remove(ElementDelta),
    Rename { from: ElementDelta, to: ElementDelta },
    Move { from: ElementDelta, to: ElementDelta },
}

/// Classify the additions and deletions of one structure change
///
/// A single deletion paired with a single addition is a rename when both
/// share a parent and a move otherwise. Bulk changes become one add (or one
/// remove) per element; mixed bulk changes only report the additions.
pub fn classify_structure_change(
    mut additions: Vec<ElementDelta>,
    mut deletions: Vec<ElementDelta>,
) -> Vec<RefactorOp> {
    if additions.is_empty() && deletions.is_empty() {
        return Vec::new();
    }

    if additions.len() == 1 || deletions.len() == 1 {
        if deletions.is_empty() {
            return vec![RefactorOp::Add(additions.swap_remove(0))];
        }
        if additions.is_empty() {
            return vec![RefactorOp::Remove(deletions.swap_remove(0))];
        }
        if deletions.len() == 1 {
            let from = deletions.swap_remove(0);
            let to = additions.swap_remove(0);
            return if from.parent == to.parent {
                vec![RefactorOp::Rename { from, to }]
            } else {
                vec![RefactorOp::Move { from, to }]
            };
        }
        return Vec::new();
    }

    if additions.len() > 1 {
        additions.into_iter().map(RefactorOp::Add).collect()
    } else {
        deletions.into_iter().map(RefactorOp::Remove).collect()
    }
}

fn program_unit(path: &str, op: &str, unit: UnitKind) -> Submission {
    Submission::new(EventKind::Refactor, "Edit")
        .path(path)
        .property(keys::SUBTYPE, "ProgramUnit")
        .property("subsubtype", op)
        .property(keys::LANGUAGE, "java")
        .property(keys::UNIT_TYPE, unit.as_str())
}

/// Record for one refactoring; `None` for unnamed elements or non-source files
pub fn refactor(op: &RefactorOp) -> Option<Submission> {
    let submission = match op {
        RefactorOp::Add(delta) | RefactorOp::Remove(delta) => {
            if delta.name.is_empty() {
                return None;
            }
            let label = if matches!(op, RefactorOp::Add(_)) {
                "Add"
            } else {
                "Remove"
            };
            program_unit(&delta.file, label, delta.unit)
                .property(keys::UNIT_NAME, delta.name.as_str())
                .message(format!(
                    "Refactor : {}#{}#{}",
                    label,
                    delta.unit.as_str(),
                    delta.name
                ))
        }
        RefactorOp::Rename { from, to } => {
            if from.name.is_empty() || to.name.is_empty() {
                return None;
            }
            program_unit(&to.file, "Rename", to.unit)
                .property("from-unit-name", from.name.as_str())
                .property("to-unit-name", to.name.as_str())
                .message(format!(
                    "Refactor : Rename#{}#{} -> {}",
                    to.unit.as_str(),
                    from.name,
                    to.name
                ))
        }
        RefactorOp::Move { from, to } => {
            if from.name.is_empty() {
                return None;
            }
            program_unit(&from.file, "Move", from.unit)
                .property(keys::UNIT_NAME, from.name.as_str())
                .property("from-unit-name", from.parent.as_str())
                .property("to-unit-name", to.parent.as_str())
                .message(format!(
                    "Refactor : Move#{}#{}#{} -> {}",
                    from.unit.as_str(),
                    from.name,
                    from.parent,
                    to.parent
                ))
        }
    };

    language_of(&submission.path).map(|_| submission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, parent: &str) -> ElementDelta {
        ElementDelta::new(UnitKind::Method, name, parent, "/src/Foo.java")
    }

    #[test]
    fn test_file_opened_emits_activity_and_dev_event() {
        let out = file_opened("/src/Foo.java");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EventKind::Activity);
        assert_eq!(out[0].event_type, "Open File");
        assert_eq!(out[0].message, "Open File : Foo.java");

        let dev = &out[1];
        assert_eq!(dev.kind, EventKind::DevEvent);
        assert_eq!(dev.properties.get(keys::SUBTYPE), Some("Open"));
        assert_eq!(dev.properties.get(keys::UNIT_NAME), Some("Foo.java"));
        assert_eq!(dev.properties.get(keys::LANGUAGE), Some("java"));
    }

    #[test]
    fn test_file_closed_activity_only_for_source() {
        assert_eq!(file_closed("/src/Foo.java").len(), 2);
        let out = file_closed("/notes/todo.txt");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].properties.get(keys::LANGUAGE), None);
        assert_eq!(out[0].properties.get(keys::SUBTYPE), Some("Close"));
    }

    #[test]
    fn test_file_saved_carries_metrics() {
        let metrics = FileMetrics {
            class_name: Some("p.Foo".to_string()),
            method_count: 4,
            statement_count: 20,
            tests: None,
        };
        let out = file_saved("/src/Foo.java", 512, Some(&metrics));
        let save = &out[1];
        assert_eq!(save.properties.get(keys::CURRENT_SIZE), Some("512"));
        assert_eq!(save.properties.get(keys::CLASS_NAME), Some("p.Foo"));
        assert_eq!(save.properties.get(keys::CURRENT_METHODS), Some("4"));
        assert_eq!(save.message, "Save File : Foo.java [512, p.Foo, methods=4, stms=20]");

        let bare = file_saved("/src/Foo.java", 3, None);
        assert_eq!(bare[1].message, "Save File : Foo.java [3]");
    }

    #[test]
    fn test_project_events() {
        let out = project_opened("demo", "/ws/demo");
        assert_eq!(out[0].event_type, "Open Project");
        assert_eq!(out[0].path, "/ws/demo");
        assert_eq!(out[1].properties.get(keys::UNIT_TYPE), Some("project"));
        assert_eq!(out[1].properties.get(keys::UNIT_NAME), Some("demo"));

        let out = project_closed("demo", "/ws/demo");
        assert_eq!(out[1].properties.get(keys::SUBTYPE), Some("Close"));
    }

    #[test]
    fn test_breakpoint_records() {
        let out = breakpoint("/src/Foo.java", 42, false);
        assert_eq!(out[1].kind, EventKind::Breakpoint);
        assert_eq!(out[1].properties.get("set"), Some("unset"));
        assert_eq!(out[1].properties.get("line"), Some("42"));
        assert_eq!(out[1].message, "Debug : Foo.java [Unset Breakpoint,42]");
        assert_eq!(out[0].properties.get("lineno"), Some("42"));
    }

    #[test]
    fn test_build_errors_filter_and_collapse() {
        let problems = vec![
            BuildProblem::error("cannot find symbol"),
            BuildProblem {
                severity: Severity::Warning,
                message: "unused import".to_string(),
            },
            BuildProblem::error("cannot find symbol"),
            BuildProblem::error("';' expected"),
        ];
        let out = build_errors("/src/Foo.java", &problems);
        let errors: Vec<_> = out.iter().map(|s| s.properties.get_or_empty("error")).collect();
        assert_eq!(errors, vec!["cannot find symbol", "';' expected"]);
        assert!(out.iter().all(|s| s.kind == EventKind::BuildError));
        assert_eq!(out[0].message, "Build Error : Foo.java [cannot find symbol]");
    }

    #[test]
    fn test_classify_single_changes() {
        assert!(classify_structure_change(vec![], vec![]).is_empty());

        let ops = classify_structure_change(vec![method("run", "Foo")], vec![]);
        assert_eq!(ops, vec![RefactorOp::Add(method("run", "Foo"))]);

        let ops = classify_structure_change(vec![], vec![method("run", "Foo")]);
        assert_eq!(ops, vec![RefactorOp::Remove(method("run", "Foo"))]);
    }

    #[test]
    fn test_classify_rename_and_move() {
        let ops = classify_structure_change(vec![method("start", "Foo")], vec![method("run", "Foo")]);
        assert!(matches!(&ops[..], [RefactorOp::Rename { from, to }] if from.name == "run" && to.name == "start"));

        let ops = classify_structure_change(vec![method("run", "Bar")], vec![method("run", "Foo")]);
        assert!(matches!(&ops[..], [RefactorOp::Move { from, to }] if from.parent == "Foo" && to.parent == "Bar"));
    }

    #[test]
    fn test_classify_bulk_changes() {
        let adds = vec![method("a", "Foo"), method("b", "Foo"), method("c", "Foo")];
        assert_eq!(classify_structure_change(adds.clone(), vec![]).len(), 3);

        let dels = vec![method("x", "Foo"), method("y", "Foo")];
        let ops = classify_structure_change(vec![], dels);
        assert!(ops.iter().all(|op| matches!(op, RefactorOp::Remove(_))));

        // bulk on both sides only reports additions
        let ops = classify_structure_change(adds, vec![method("x", "Foo"), method("y", "Foo")]);
        assert!(ops.iter().all(|op| matches!(op, RefactorOp::Add(_))));

        // one addition against many deletions is ambiguous
        let ops = classify_structure_change(
            vec![method("a", "Foo")],
            vec![method("x", "Foo"), method("y", "Foo")],
        );
        assert!(ops.is_empty());
    }

    #[test]
    fn test_refactor_records() {
        let rename = RefactorOp::Rename {
            from: method("run", "Foo"),
            to: method("start", "Foo"),
        };
        let submission = refactor(&rename).unwrap();
        assert_eq!(submission.kind, EventKind::Refactor);
        assert_eq!(submission.properties.get("subsubtype"), Some("Rename"));
        assert_eq!(submission.properties.get("from-unit-name"), Some("run"));
        assert_eq!(submission.properties.get("to-unit-name"), Some("start"));
        assert_eq!(submission.message, "Refactor : Rename#Method#run -> start");

        let unnamed = RefactorOp::Add(method("", "Foo"));
        assert!(refactor(&unnamed).is_none());

        let not_java = RefactorOp::Add(ElementDelta::new(UnitKind::Field, "x", "Foo", "/a/b.kt"));
        assert!(refactor(&not_java).is_none());
    }
}
