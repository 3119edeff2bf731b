//! Tree types mirroring the SDL grammar (spec.md §3). The parser builds
//! this tree and never interprets field semantics; every validator reads it
//! immutably.

use crate::lex::Spanned;
use indexmap::IndexMap;
use sdl_common::SourceSpan;

/// One of the five value kinds a field may hold, per spec.md §3.
#[derive(Debug, Clone, PartialEq)]
pub enum AstValue {
    Number(f64),
    String(String),
    Identifier(String),
    Vector3([f64; 3]),
}

impl AstValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AstValue::Number(_) => "number",
            AstValue::String(_) => "string",
            AstValue::Identifier(_) => "identifier",
            AstValue::Vector3(_) => "vector3",
        }
    }
}

/// An ordered field map. Lookup is by name; iteration order is insertion
/// order for deterministic diagnostics (spec.md §3, §9).
pub type Fields = IndexMap<String, Spanned<AstValue>>;

#[derive(Debug, Clone, PartialEq)]
pub struct AstScene {
    pub name: String,
    pub name_span: SourceSpan,
    pub version: i64,
    pub version_span: SourceSpan,
    pub ir_version: String,
    pub ir_version_span: SourceSpan,
    pub unit_system: String,
    pub unit_system_span: SourceSpan,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstLibraryImports {
    /// alias -> library name
    pub imports: IndexMap<String, Spanned<String>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstComponent {
    pub name: String,
    pub name_span: SourceSpan,
    pub fields: Fields,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstEntity {
    pub id: String,
    pub id_span: SourceSpan,
    pub kind: String,
    pub kind_span: SourceSpan,
    /// Kept as an ordered list, not a map, so the syntax validator can still
    /// observe and report duplicate component types (spec.md §4.4, E131)
    /// before anything collapses them.
    pub components: Vec<AstComponent>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstConstraint {
    pub id: String,
    pub id_span: SourceSpan,
    pub constraint_type: String,
    pub type_span: SourceSpan,
    pub fields: Fields,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstMotion {
    pub id: String,
    pub id_span: SourceSpan,
    pub target: String,
    pub target_span: SourceSpan,
    pub motion_type: String,
    pub type_span: SourceSpan,
    pub fields: Fields,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstEvent {
    pub motion: String,
    pub motion_span: SourceSpan,
    pub start: f64,
    pub start_span: SourceSpan,
    pub duration: f64,
    pub duration_span: SourceSpan,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstTimeline {
    pub id: String,
    pub id_span: SourceSpan,
    pub events: Vec<AstEvent>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstFile {
    pub scene: AstScene,
    pub library_imports: AstLibraryImports,
    pub entities: Vec<AstEntity>,
    pub constraints: Vec<AstConstraint>,
    pub motions: Vec<AstMotion>,
    pub timelines: Vec<AstTimeline>,
}
