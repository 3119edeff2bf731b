//! Pass 5 — library import resolution (spec.md §4.8). Runs last so that
//! schema and reference diagnostics for well-known types are already in the
//! diagnostic list before any library-level suggestion is appended.

use std::collections::BTreeSet;

use sdl_diagnostics::{Diagnostic, ErrorCode, ErrorCollector};
use sdl_syntax::ast::AstFile;

use crate::library::{edit_distance, LibraryRegistry};
use crate::schema::{NodeKind, SchemaRegistry};

pub fn run(
    ast: &AstFile,
    schema_registry: &SchemaRegistry,
    library_registry: &LibraryRegistry,
    file: &str,
    out: &mut ErrorCollector,
) {
    check_imports(ast, library_registry, file, out);

    let imported: BTreeSet<&str> = ast
        .library_imports
        .imports
        .values()
        .map(|lib| lib.value.as_str())
        .filter(|name| library_registry.contains(name))
        .collect();

    for entity in &ast.entities {
        for component in &entity.components {
            check_type_used(
                NodeKind::Component,
                &component.name,
                component.name_span,
                schema_registry,
                library_registry,
                &imported,
                file,
                out,
            );
        }
    }
    for constraint in &ast.constraints {
        check_type_used(
            NodeKind::Constraint,
            &constraint.constraint_type,
            constraint.type_span,
            schema_registry,
            library_registry,
            &imported,
            file,
            out,
        );
    }
    for motion in &ast.motions {
        check_type_used(
            NodeKind::Motion,
            &motion.motion_type,
            motion.type_span,
            schema_registry,
            library_registry,
            &imported,
            file,
            out,
        );
    }
}

fn check_imports(ast: &AstFile, library_registry: &LibraryRegistry, file: &str, out: &mut ErrorCollector) {
    for (alias, library) in ast.library_imports.imports.iter() {
        if !library_registry.contains(&library.value) {
            let mut known: Vec<&str> = library_registry.names().collect();
            known.sort_by_key(|name| edit_distance(name, &library.value));
            let suggestions: Vec<&str> = known.into_iter().take(2).collect();
            let help = if suggestions.is_empty() {
                format!("no configured library resembles '{}'", library.value)
            } else {
                format!("did you mean: {}?", suggestions.join(" or "))
            };
            out.push(
                Diagnostic::new(
                    ErrorCode::E500,
                    format!("unknown library '{}' (imported as '{}')", library.value, alias),
                    library.span,
                    file,
                )
                .with_help(help),
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_type_used(
    kind: NodeKind,
    type_name: &str,
    span: sdl_common::SourceSpan,
    schema_registry: &SchemaRegistry,
    library_registry: &LibraryRegistry,
    imported: &BTreeSet<&str>,
    file: &str,
    out: &mut ErrorCollector,
) {
    let providers = library_registry.providers(kind, type_name);
    if providers.is_empty() {
        if schema_registry.is_known(kind, type_name) {
            // Known to the built-in schema but genuinely provided by no
            // library at all — a registry/library configuration gap, not a
            // nonexistent type, but still nothing imports it.
            out.push(
                Diagnostic::new(
                    ErrorCode::E510,
                    format!("{} type '{}' is not provided by any imported library", kind.as_str(), type_name),
                    span,
                    file,
                )
                .with_help("no configured library provides this type; extend the library registry"),
            );
        } else {
            out.push(Diagnostic::new(
                ErrorCode::E200,
                format!("unknown {} type '{}'", kind.as_str(), type_name),
                span,
                file,
            ));
        }
        return;
    }

    if !providers.iter().any(|lib| imported.contains(lib)) {
        out.push(
            Diagnostic::new(
                ErrorCode::E510,
                format!("{} type '{}' is not provided by any imported library", kind.as_str(), type_name),
                span,
                file,
            )
            .with_help(format!("import one of: {}", providers.join(", "))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl_syntax::parse_source;

    fn validate(src: &str) -> ErrorCollector {
        let ast = parse_source(src, "t.dsl").expect("parse should succeed");
        let schema_registry = SchemaRegistry::default_registry();
        let library_registry = LibraryRegistry::default_registry();
        let mut out = ErrorCollector::new();
        run(&ast, &schema_registry, &library_registry, "t.dsl", &mut out);
        out
    }

    #[test]
    fn unknown_library_name_is_e500() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanic"}"#;
        let diags = validate(src).into_vec();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, ErrorCode::E500);
        assert!(diags[0].help.as_ref().unwrap().contains("core_mechanics"));
    }

    #[test]
    fn type_not_imported_is_e510() {
        let src = format!(
            r#"scene{{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"}} library_imports{{core:"core_mechanics"}} entity a {{ kind: solid components {{ geometry {{ primitive: cube }} }} }}"#
        );
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E510));
    }

    #[test]
    fn type_unknown_anywhere_is_e200() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{core:"core_mechanics"} entity a { kind: solid components { turbine { rpm: 10 } } }"#;
        let diags = validate(src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E200));
    }

    #[test]
    fn fully_imported_scene_has_no_library_diagnostics() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{core:"core_mechanics" solids:"basic_solids"} entity a { kind: solid components { transform { position: [0,0,0] rotation: [0,0,0] scale: [1,1,1] } geometry { primitive: cube } } }"#;
        assert!(validate(src).into_vec().is_empty());
    }
}
