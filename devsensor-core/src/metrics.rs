//! Source-file metrics supplied by the host
//!
//! Counting methods and statements needs a parser for the file's language,
//! which lives on the host side. The sensor only asks for the numbers and
//! forwards them as string properties.

use crate::event::{keys, Properties};

/// Counts for one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetrics {
    /// Fully qualified name of the file's primary type, if it has one
    pub class_name: Option<String>,
    pub method_count: usize,
    pub statement_count: usize,
    /// Present only for files containing tests
    pub tests: Option<TestMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestMetrics {
    pub test_method_count: usize,
    pub test_assertion_count: usize,
}

impl FileMetrics {
    /// Add these metrics to `props` under the state-change/save keys
    pub fn write_to(&self, props: &mut Properties) {
        if let Some(class_name) = &self.class_name {
            props.insert(keys::CLASS_NAME, class_name.as_str());
        }
        props.insert(keys::CURRENT_METHODS, self.method_count.to_string());
        props.insert(keys::CURRENT_STATEMENTS, self.statement_count.to_string());
        if let Some(tests) = self.tests {
            props.insert(
                keys::CURRENT_TEST_METHODS,
                tests.test_method_count.to_string(),
            );
            props.insert(
                keys::CURRENT_TEST_ASSERTIONS,
                tests.test_assertion_count.to_string(),
            );
        }
    }

    /// Short summary for status messages, e.g. `com.Foo, methods=3, stms=12`
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if let Some(class_name) = &self.class_name {
            out.push_str(class_name);
            out.push_str(", ");
        }
        out.push_str(&format!(
            "methods={}, stms={}",
            self.method_count, self.statement_count
        ));
        out
    }
}

/// Host collaborator that measures source files on demand
pub trait MetricsProvider: Send + Sync {
    /// Metrics for `path`, or `None` if the file is not measurable
    fn measure(&self, path: &str) -> Option<FileMetrics>;
}

/// Provider for hosts without a parser; nothing is measurable
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetrics;

impl MetricsProvider for NoMetrics {
    fn measure(&self, _path: &str) -> Option<FileMetrics> {
        None
    }
}

impl<F> MetricsProvider for F
where
    F: Fn(&str) -> Option<FileMetrics> + Send + Sync,
{
    fn measure(&self, path: &str) -> Option<FileMetrics> {
        self(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_to_without_tests() {
        let metrics = FileMetrics {
            class_name: Some("org.example.Foo".to_string()),
            method_count: 3,
            statement_count: 12,
            tests: None,
        };
        let mut props = Properties::new();
        metrics.write_to(&mut props);

        assert_eq!(props.get(keys::CLASS_NAME), Some("org.example.Foo"));
        assert_eq!(props.get(keys::CURRENT_METHODS), Some("3"));
        assert_eq!(props.get(keys::CURRENT_STATEMENTS), Some("12"));
        assert_eq!(props.get(keys::CURRENT_TEST_METHODS), None);
        assert_eq!(metrics.summary(), "org.example.Foo, methods=3, stms=12");
    }

    #[test]
    fn test_write_to_with_tests() {
        let metrics = FileMetrics {
            class_name: None,
            method_count: 2,
            statement_count: 5,
            tests: Some(TestMetrics {
                test_method_count: 2,
                test_assertion_count: 7,
            }),
        };
        let mut props = Properties::new();
        metrics.write_to(&mut props);
        assert_eq!(props.get(keys::CURRENT_TEST_METHODS), Some("2"));
        assert_eq!(props.get(keys::CURRENT_TEST_ASSERTIONS), Some("7"));
        assert_eq!(props.get(keys::CLASS_NAME), None);
    }

    #[test]
    fn test_closure_provider() {
        let provider = |path: &str| {
            path.ends_with(".java").then(|| FileMetrics {
                method_count: 1,
                ..Default::default()
            })
        };
        assert!(provider.measure("/a/B.java").is_some());
        assert!(provider.measure("/a/readme.md").is_none());
    }
}
