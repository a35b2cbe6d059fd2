//! Non-fatal data-quality diagnostics.
//!
//! Duplicate names at parse time and conflicting translations at save time
//! are reporting-only safeguards: a value is chosen deterministically and
//! processing continues. The sink is threaded through calls explicitly so
//! tests can collect findings into a list instead of printing.

use std::fmt::Display;

use serde::Serialize;

use crate::types::InvariantKey;

/// A data-quality finding produced while parsing or persisting resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Diagnostic {
    /// A second `<data>` element with an already-seen name within one file.
    /// The first occurrence is kept.
    DuplicateName { name: String, file: String },

    /// Multiple distinct translations recorded for one (key, language) pair
    /// across the store. The first value in store iteration order is kept.
    TranslationConflict {
        key: InvariantKey,
        language: String,
        values: Vec<String>,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateName { name, file } => {
                write!(f, "duplicate name {} in file {}", name, file)
            }
            Diagnostic::TranslationConflict {
                key,
                language,
                values,
            } => write!(
                f,
                "{} was translated into {} as all of the following: {}",
                key,
                language,
                values.join(" | ")
            ),
        }
    }
}

/// Where data-quality findings go. Implementations must not fail.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Writes each finding to stderr as a warning. The CLI default.
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        eprintln!("warning: {}", diagnostic);
    }
}

/// Collects findings into memory. Used by tests and callers that want to
/// inspect data quality after an operation.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub diagnostics: Vec<Diagnostic>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_display() {
        let diagnostic = Diagnostic::DuplicateName {
            name: "Hello".to_string(),
            file: "Forms/Main.resx".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "duplicate name Hello in file Forms/Main.resx"
        );
    }

    #[test]
    fn test_translation_conflict_display_names_all_values() {
        let diagnostic = Diagnostic::TranslationConflict {
            key: InvariantKey::new("Hello", "Hi"),
            language: "fr".to_string(),
            values: vec!["Bonjour".to_string(), "Salut".to_string()],
        };
        let message = diagnostic.to_string();
        assert!(message.contains("Name:Hello"));
        assert!(message.contains("fr"));
        assert!(message.contains("Bonjour"));
        assert!(message.contains("Salut"));
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.report(Diagnostic::DuplicateName {
            name: "a".to_string(),
            file: "f".to_string(),
        });
        assert_eq!(sink.diagnostics.len(), 1);
    }
}
