//! Source code representation and diagnostic management.

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;

/// Represents one compilation unit's source text together with the
/// diagnostics accumulated while processing it.
pub struct Source<'a> {
    /// Original source code.
    pub content: &'a str,
    /// Accumulated diagnostics.
    pub errors: ErrorReporter,
}

impl<'a> Source<'a> {
    /// Create a new `Source` with the specified `content`.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            errors: ErrorReporter::new(),
        }
    }

    /// Returns `true` if no diagnostics have been reported against this source.
    pub fn has_no_errors(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(content: &'a str) -> Self {
        Source::new(content)
    }
}

/// A compile-time diagnostic with a message and the byte span it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    message: String,
    span: Range<usize>,
}

impl Diagnostic {
    /// Create a new diagnostic with the specified `message` and `span`.
    pub fn new(message: impl ToString, span: Range<usize>) -> Self {
        Self {
            message: message.to_string(),
            span,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.span.start)
    }
}

/// Collects diagnostics during a compilation run.
///
/// Uses interior mutability so that shared borrowers of a [`Source`] (lexer,
/// parser) can report without threading `&mut` everywhere.
pub struct ErrorReporter {
    errors: RefCell<Vec<Diagnostic>>,
}

impl ErrorReporter {
    /// Create an empty `ErrorReporter`.
    pub fn new() -> Self {
        Self {
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Adds a diagnostic to the reporter.
    pub fn add_error(&self, error: Diagnostic) {
        // This should be the only place where self.errors is borrowed mutably.
        self.errors.borrow_mut().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    /// Drains and returns all accumulated diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.errors.borrow_mut().drain(..).collect()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in self.errors.borrow().iter() {
            writeln!(f, "ERROR: {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_accumulates() {
        let source: Source = "x +".into();
        assert!(source.has_no_errors());
        source
            .errors
            .add_error(Diagnostic::new("expected expression", 2..3));
        assert!(!source.has_no_errors());
        assert_eq!(source.errors.len(), 1);

        let drained = source.errors.take();
        assert_eq!(drained[0].message(), "expected expression");
        assert_eq!(drained[0].span(), 2..3);
        assert!(source.has_no_errors());
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::new("expected `;`", 10..11);
        assert_eq!(diag.to_string(), "expected `;` at position 10");
    }
}
