//! The built-in schema registry (spec.md §4.5): for each known component,
//! constraint and motion type, an ordered list of fields with a name,
//! required-ness and declared [`FieldType`].
//!
//! The registry is constructed once and frozen, mirroring the teacher's
//! `tydi_query` logical-type hierarchy being a fixed set of variants rather
//! than something mutated during a query run.

use indexmap::IndexMap;

/// What kind of AST node a type name is declared under. The same registry
/// serves all three, since the grammar gives each its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Component,
    Constraint,
    Motion,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Component => "component",
            NodeKind::Constraint => "constraint",
            NodeKind::Motion => "motion",
        }
    }
}

/// The declared kind of a field's value, per spec.md §4.5.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Number,
    String,
    Identifier,
    Vector3,
    Boolean,
    Enum(Vec<&'static str>),
}

impl FieldType {
    pub fn describe(&self) -> String {
        match self {
            FieldType::Number => "a number".to_string(),
            FieldType::String => "a string".to_string(),
            FieldType::Identifier => "an identifier".to_string(),
            FieldType::Vector3 => "a 3-component vector".to_string(),
            FieldType::Boolean => "a boolean".to_string(),
            FieldType::Enum(values) => format!("one of {}", values.join(", ")),
        }
    }
}

/// Marks a field whose `Identifier` value is expected to resolve to an
/// entity id during reference validation (spec.md §4.6). Only identifier
/// fields can carry this; the reference pass reads it off the schema rather
/// than hard-coding `parent`/`child`/`driver`/`driven` by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Entity,
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub required: bool,
    pub field_type: FieldType,
    pub reference: Option<ReferenceKind>,
}

impl FieldSchema {
    pub fn required(name: &'static str, field_type: FieldType) -> Self {
        FieldSchema {
            name,
            required: true,
            field_type,
            reference: None,
        }
    }

    pub fn optional(name: &'static str, field_type: FieldType) -> Self {
        FieldSchema {
            name,
            required: false,
            field_type,
            reference: None,
        }
    }

    pub fn entity_ref(mut self) -> Self {
        self.reference = Some(ReferenceKind::Entity);
        self
    }
}

/// An ordered list of fields for one type name. Order only matters for
/// reproducible iteration (e.g. cycle-edge discovery order); lookup is by
/// name.
#[derive(Debug, Clone, Default)]
pub struct TypeSchema {
    pub fields: Vec<FieldSchema>,
}

impl TypeSchema {
    fn new(fields: Vec<FieldSchema>) -> Self {
        TypeSchema { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identifier fields declared as entity references, in schema order.
    pub fn entity_ref_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields
            .iter()
            .filter(|f| f.reference == Some(ReferenceKind::Entity))
    }
}

/// Maps type name -> schema, separately for components, constraints and
/// motions, since the three are independent namespaces in the grammar.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    components: IndexMap<&'static str, TypeSchema>,
    constraints: IndexMap<&'static str, TypeSchema>,
    motions: IndexMap<&'static str, TypeSchema>,
}

impl SchemaRegistry {
    pub fn lookup(&self, kind: NodeKind, type_name: &str) -> Option<&TypeSchema> {
        let table = match kind {
            NodeKind::Component => &self.components,
            NodeKind::Constraint => &self.constraints,
            NodeKind::Motion => &self.motions,
        };
        table.get(type_name)
    }

    pub fn is_known(&self, kind: NodeKind, type_name: &str) -> bool {
        self.lookup(kind, type_name).is_some()
    }

    /// The four built-in component/constraint/motion schemas from spec.md
    /// §4.5, seeded once at process start and never mutated afterwards
    /// (spec.md §5).
    pub fn default_registry() -> Self {
        let mut components = IndexMap::new();
        components.insert(
            "transform",
            TypeSchema::new(vec![
                FieldSchema::required("position", FieldType::Vector3),
                FieldSchema::required("rotation", FieldType::Vector3),
                FieldSchema::required("scale", FieldType::Vector3),
            ]),
        );
        components.insert(
            "geometry",
            TypeSchema::new(vec![FieldSchema::required(
                "primitive",
                FieldType::Enum(vec!["cube", "sphere", "cylinder", "cone", "plane"]),
            )]),
        );
        components.insert(
            "physical",
            TypeSchema::new(vec![
                FieldSchema::required("mass", FieldType::Number),
                FieldSchema::required("rigid", FieldType::Boolean),
            ]),
        );

        let mut constraints = IndexMap::new();
        constraints.insert(
            "fixed_joint",
            TypeSchema::new(vec![
                FieldSchema::required("parent", FieldType::Identifier).entity_ref(),
                FieldSchema::required("child", FieldType::Identifier).entity_ref(),
            ]),
        );
        constraints.insert(
            "gear_relation",
            TypeSchema::new(vec![
                FieldSchema::optional("driver", FieldType::Identifier).entity_ref(),
                FieldSchema::optional("driven", FieldType::Identifier).entity_ref(),
                FieldSchema::optional("ratio", FieldType::Number),
            ]),
        );

        let mut motions = IndexMap::new();
        motions.insert(
            "rotation",
            TypeSchema::new(vec![
                FieldSchema::optional("axis", FieldType::Vector3),
                FieldSchema::optional("speed", FieldType::Number),
            ]),
        );
        motions.insert(
            "translation",
            TypeSchema::new(vec![
                FieldSchema::optional("direction", FieldType::Vector3),
                FieldSchema::optional("speed", FieldType::Number),
            ]),
        );

        SchemaRegistry {
            components,
            constraints,
            motions,
        }
    }
}
