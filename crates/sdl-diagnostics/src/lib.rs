//! Error codes, spans and the diagnostic collector threaded through every
//! pass of the compiler (spec.md §4.1).
//!
//! A [`Diagnostic`] is plain data — it never implements `std::error::Error`
//! and is never propagated with `?`. Validators push as many as they find
//! into an [`ErrorCollector`] and keep going; only the lexer and parser
//! halt on the first one, per spec.md §4.2/§4.3.

use sdl_common::SourceSpan;
use std::fmt;

mod format;
pub use format::format_terminal;

/// Numeric ranges from spec.md §4.1: E001–E099 lexical, E100–E199 syntax,
/// E200–E299 schema, E300–E399 reference, E400–E499 unit, E500–E599
/// library, plus the W4xx warning class that never fails compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unexpected byte.
    E001,
    /// Unterminated string literal.
    E002,
    /// Unexpected token.
    E100,
    /// Missing required section.
    E101,
    /// Malformed vector (not exactly 3 components).
    E110,
    /// scene.version must be >= 1.
    E120,
    /// ir_version must be INT.INT.INT.
    E121,
    /// unit_system must be SI or Imperial.
    E122,
    /// Duplicate entity/constraint/motion/timeline id.
    E130,
    /// Duplicate component type within an entity.
    E131,
    /// Non-finite number (NaN / infinite).
    E140,
    /// Invalid rotation/translation motion field.
    E141,
    /// Timeline event duration must be > 0.
    E150,
    /// Timeline event start must be >= 0.
    E151,
    /// Unknown component/constraint/motion type.
    E200,
    /// Missing required field.
    E210,
    /// Unknown field.
    E211,
    /// Field value kind mismatch.
    E220,
    /// Invalid boolean identifier.
    E221,
    /// Undefined identifier reference.
    E300,
    /// Undefined motion reference in a timeline event.
    E301,
    /// Constraint dependency cycle.
    E310,
    /// Overlapping timeline events for the same motion.
    E320,
    /// Rotation motion axis is not a unit vector.
    E400,
    /// Mass is not finite / not positive.
    E410,
    /// Mass out of range for the scene's unit system.
    E411,
    /// Rotation component may be in degrees, not radians (warning).
    W420,
    /// Non-finite number caught late by the unit validator.
    E430,
    /// Unknown library name.
    E500,
    /// Type not provided by any imported library.
    E510,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E110 => "E110",
            ErrorCode::E120 => "E120",
            ErrorCode::E121 => "E121",
            ErrorCode::E122 => "E122",
            ErrorCode::E130 => "E130",
            ErrorCode::E131 => "E131",
            ErrorCode::E140 => "E140",
            ErrorCode::E141 => "E141",
            ErrorCode::E150 => "E150",
            ErrorCode::E151 => "E151",
            ErrorCode::E200 => "E200",
            ErrorCode::E210 => "E210",
            ErrorCode::E211 => "E211",
            ErrorCode::E220 => "E220",
            ErrorCode::E221 => "E221",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E310 => "E310",
            ErrorCode::E320 => "E320",
            ErrorCode::E400 => "E400",
            ErrorCode::E410 => "E410",
            ErrorCode::E411 => "E411",
            ErrorCode::W420 => "W420",
            ErrorCode::E430 => "E430",
            ErrorCode::E500 => "E500",
            ErrorCode::E510 => "E510",
        }
    }

    /// Warnings never fail compilation (spec.md §7).
    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W420)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One diagnostic: an error code, a message, the span it points at, the
/// file it came from, and optional help text (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: SourceSpan,
    pub file: String,
    pub help: Option<String>,
    /// Short text shown under the caret underline, distinct from the
    /// headline `message`. Falls back to no trailing annotation.
    pub label: Option<String>,
}

impl Diagnostic {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        span: SourceSpan,
        file: impl Into<String>,
    ) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            span,
            file: file.into(),
            help: None,
            label: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.code.is_warning()
    }

    pub fn to_wire(&self) -> DiagnosticWire {
        DiagnosticWire {
            code: self.code.as_str().to_string(),
            message: self.message.clone(),
            file: self.file.clone(),
            line: self.span.line,
            column: self.span.column,
            help: self.help.clone(),
        }
    }
}

/// The machine-readable diagnostic form from spec.md §6.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiagnosticWire {
    pub code: String,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Batches diagnostics from a single validator pass (or the whole
/// pipeline) in insertion order. Validators never abort early; they push
/// every violation they find and let the caller decide what to do with the
/// result (spec.md §4.1, §7).
#[derive(Debug, Default, Clone)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        ErrorCollector::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// True if any non-warning diagnostic was collected (spec.md §7: only
    /// these fail compilation).
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_warning())
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn extend(&mut self, other: ErrorCollector) {
        self.diagnostics.extend(other.diagnostics);
    }
}
