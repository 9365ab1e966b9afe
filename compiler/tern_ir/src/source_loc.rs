//! Source locations for runtime diagnostics.
//!
//! The evaluator reports errors at line granularity, so a location is a file
//! name plus a 1-based line number.

use std::fmt;
use std::sync::Arc;

/// Where a node came from.
///
/// The file name is shared so that cloning a location never copies the
/// string; every node from one file points at the same allocation.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SourceLocation {
    file: Arc<str>,
    line: u32,
}

impl SourceLocation {
    /// Create a location in `file` at `line`.
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Self {
        SourceLocation {
            file: file.into(),
            line,
        }
    }

    /// Location for nodes synthesized by the compiler rather than parsed.
    pub fn builtin() -> Self {
        SourceLocation::new("<builtin>", 0)
    }

    /// The file name.
    #[inline]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The 1-based line number (0 for builtin locations).
    #[inline]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// The same file at a different line.
    #[must_use]
    pub fn at_line(&self, line: u32) -> Self {
        SourceLocation {
            file: Arc::clone(&self.file),
            line,
        }
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
