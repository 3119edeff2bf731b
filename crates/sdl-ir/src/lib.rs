//! The flattened intermediate representation lowering produces (spec.md §3,
//! §6). `IrScene` is the only artifact that crosses the system boundary: it
//! owns all its data and serializes to the bit-stable JSON shape the
//! renderer consumes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One dynamically-typed field value, tagged with its kind so a JSON
/// consumer can tell an identifier reference from a plain string (spec.md
/// §3, §6). Serializes as a single-key object, e.g. `{"Vector3":[0,1,0]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrValue {
    Number(f64),
    String(String),
    Vector3([f64; 3]),
    Boolean(bool),
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrMetadata {
    pub name: String,
    pub version: i64,
    pub ir_version: String,
    pub unit_system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrComponent {
    pub component_type: String,
    pub properties: IndexMap<String, IrValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrEntity {
    pub id: String,
    pub kind: String,
    pub components: IndexMap<String, IrComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrConstraint {
    pub id: String,
    pub constraint_type: String,
    pub parameters: IndexMap<String, IrValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrMotion {
    pub id: String,
    pub motion_type: String,
    pub target_entity: String,
    pub parameters: IndexMap<String, IrValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrEvent {
    pub motion_id: String,
    pub start_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrTimeline {
    pub id: String,
    pub events: Vec<IrEvent>,
}

/// A fully lowered, validated scene. The only type `sdl_compiler::compile`
/// returns on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrScene {
    pub metadata: IrMetadata,
    pub library_imports: IndexMap<String, String>,
    pub entities: Vec<IrEntity>,
    pub constraints: Vec<IrConstraint>,
    pub motions: Vec<IrMotion>,
    pub timelines: Vec<IrTimeline>,
}
