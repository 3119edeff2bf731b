//! Shared primitives used by every stage of the SDL compiler: source spans,
//! a handle to the source text a span indexes into, and the host-facing
//! error type for failures that are not about the SDL source itself.
//!
//! Diagnostics about the *source text* are `sdl_diagnostics::Diagnostic`
//! values, collected rather than propagated. [`Error`] here is reserved for
//! things a `?` makes sense for: file I/O, bad CLI input, host misuse.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Host-facing error, never constructed from SDL source content.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("file I/O error: {0}")]
    FileIo(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid library registry file: {0}")]
    RegistryConfig(String),
}

/// A location in a single source file: byte offset and length, plus the
/// 1-based line/column of the first byte, per spec.md §3.
///
/// Offsets are 0-based, lines and columns are 1-based. Spans survive into
/// diagnostics but never into the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
    pub offset: usize,
    pub len: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn new(offset: usize, len: usize, line: usize, column: usize) -> Self {
        SourceSpan {
            offset,
            len,
            line,
            column,
        }
    }

    /// A zero-width span at the given position, used for end-of-input errors.
    pub fn empty_at(offset: usize, line: usize, column: usize) -> Self {
        SourceSpan {
            offset,
            len: 0,
            line,
            column,
        }
    }

    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A named source text, kept alongside the file identifier so diagnostics
/// can reconstruct the offending line on demand (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_id: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(file_id: impl Into<String>, text: impl Into<String>) -> Self {
        SourceFile {
            file_id: file_id.into(),
            text: text.into(),
        }
    }

    /// Returns the text of the line a span starts on, without its trailing
    /// newline.
    pub fn line_text(&self, line: usize) -> &str {
        self.text
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_text_reconstructs_offending_line() {
        let src = SourceFile::new("scene.dsl", "scene {\n  name: \"a\"\n}\n");
        assert_eq!(src.line_text(2), "  name: \"a\"");
    }

    #[test]
    fn line_text_out_of_range_is_empty() {
        let src = SourceFile::new("scene.dsl", "scene {}\n");
        assert_eq!(src.line_text(99), "");
    }

    #[test]
    fn span_end_offset_is_offset_plus_len() {
        let span = SourceSpan::new(10, 5, 2, 3);
        assert_eq!(span.end_offset(), 15);
    }
}
