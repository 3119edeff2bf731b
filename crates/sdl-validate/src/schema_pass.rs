//! Pass 2 — component/constraint/motion field typing against the built-in
//! schema registry (spec.md §4.5).
//!
//! A type name absent from the registry is not an error here: it is
//! deferred to the library validator (pass 5), which is the only pass that
//! knows whether the name is provided by an imported library, some other
//! configured library, or nothing at all (spec.md §4.5, §4.8).

use sdl_diagnostics::{Diagnostic, ErrorCode, ErrorCollector};
use sdl_syntax::ast::{AstFile, AstValue, Fields};

use crate::schema::{FieldType, NodeKind, SchemaRegistry, TypeSchema};

pub fn run(ast: &AstFile, registry: &SchemaRegistry, file: &str, out: &mut ErrorCollector) {
    for entity in &ast.entities {
        for component in &entity.components {
            if let Some(schema) = registry.lookup(NodeKind::Component, &component.name) {
                check_fields(schema, &component.fields, component.name_span, file, out);
            }
        }
    }
    for constraint in &ast.constraints {
        if let Some(schema) = registry.lookup(NodeKind::Constraint, &constraint.constraint_type) {
            check_fields(schema, &constraint.fields, constraint.type_span, file, out);
        }
    }
    for motion in &ast.motions {
        if let Some(schema) = registry.lookup(NodeKind::Motion, &motion.motion_type) {
            check_fields(schema, &motion.fields, motion.type_span, file, out);
        }
    }
}

fn check_fields(
    schema: &TypeSchema,
    fields: &Fields,
    header_span: sdl_common::SourceSpan,
    file: &str,
    out: &mut ErrorCollector,
) {
    for declared in &schema.fields {
        if declared.required && !fields.contains_key(declared.name) {
            out.push(Diagnostic::new(
                ErrorCode::E210,
                format!("missing required field '{}'", declared.name),
                header_span,
                file,
            ));
        }
    }

    for (name, value) in fields.iter() {
        match schema.field(name) {
            None => out.push(Diagnostic::new(
                ErrorCode::E211,
                format!("unknown field '{}'", name),
                value.span,
                file,
            )),
            Some(declared) => check_kind(declared, value, file, out),
        }
    }
}

fn check_kind(
    declared: &crate::schema::FieldSchema,
    value: &sdl_syntax::Spanned<AstValue>,
    file: &str,
    out: &mut ErrorCollector,
) {
    match (&declared.field_type, &value.value) {
        (FieldType::Number, AstValue::Number(_)) => {}
        (FieldType::String, AstValue::String(_)) => {}
        (FieldType::Vector3, AstValue::Vector3(_)) => {}
        (FieldType::Identifier, AstValue::Identifier(_)) => {}
        (FieldType::Boolean, AstValue::Identifier(ident)) => {
            if ident != "true" && ident != "false" {
                out.push(Diagnostic::new(
                    ErrorCode::E221,
                    format!(
                        "field '{}' expects a boolean identifier ('true'/'false'), found '{}'",
                        declared.name, ident
                    ),
                    value.span,
                    file,
                ));
            }
        }
        (FieldType::Enum(values), AstValue::Identifier(ident)) => {
            if !values.contains(&ident.as_str()) {
                out.push(Diagnostic::new(
                    ErrorCode::E220,
                    format!(
                        "field '{}' expects {}, found '{}'",
                        declared.name,
                        declared.field_type.describe(),
                        ident
                    ),
                    value.span,
                    file,
                ));
            }
        }
        _ => out.push(Diagnostic::new(
            ErrorCode::E220,
            format!(
                "field '{}' expects {}, found {}",
                declared.name,
                declared.field_type.describe(),
                value.value.kind_name()
            ),
            value.span,
            file,
        )),
    }
}
