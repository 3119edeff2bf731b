//! Pass 1 — structural invariants over the AST (spec.md §4.4). Runs first
//! and purely syntactically: it never consults a schema or a registry, only
//! the shape of the tree itself. Collects every violation it finds instead
//! of stopping at the first one, unlike the lexer/parser it follows.

use sdl_diagnostics::{Diagnostic, ErrorCode, ErrorCollector};
use sdl_syntax::ast::{AstEvent, AstFile, AstMotion, AstValue, Fields};
use std::collections::HashMap;

/// Checks run section by section, in grammar order (`entity* constraint*
/// motion* timeline*`), so diagnostics come out in ascending span-offset
/// order instead of grouped by check kind across the whole file.
pub fn run(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    check_scene(ast, file, out);
    check_entities(ast, file, out);
    check_constraints(ast, file, out);
    check_motions(ast, file, out);
    check_timelines(ast, file, out);
}

fn check_scene(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    let scene = &ast.scene;
    if scene.version < 1 {
        out.push(Diagnostic::new(
            ErrorCode::E120,
            format!("scene.version must be >= 1, found {}", scene.version),
            scene.version_span,
            file,
        ));
    }
    if !is_semver_triple(&scene.ir_version) {
        out.push(Diagnostic::new(
            ErrorCode::E121,
            format!(
                "ir_version '{}' is not of the form MAJOR.MINOR.PATCH",
                scene.ir_version
            ),
            scene.ir_version_span,
            file,
        ));
    }
    if scene.unit_system != "SI" && scene.unit_system != "Imperial" {
        out.push(Diagnostic::new(
            ErrorCode::E122,
            format!(
                "unit_system must be 'SI' or 'Imperial', found '{}'",
                scene.unit_system
            ),
            scene.unit_system_span,
            file,
        ));
    }
}

fn is_semver_triple(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn check_duplicates<'a>(
    items: impl Iterator<Item = (&'a str, sdl_common::SourceSpan)>,
    what: &str,
    file: &str,
    out: &mut ErrorCollector,
) {
    let mut seen: HashMap<&str, sdl_common::SourceSpan> = HashMap::new();
    for (id, span) in items {
        match seen.get(id) {
            Some(first_span) => {
                out.push(Diagnostic::new(
                    ErrorCode::E130,
                    format!(
                        "duplicate {} id '{}' (first defined at line {})",
                        what, id, first_span.line
                    ),
                    span,
                    file,
                ));
            }
            None => {
                seen.insert(id, span);
            }
        }
    }
}

fn check_entities(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    check_duplicates(
        ast.entities.iter().map(|e| (e.id.as_str(), e.id_span)),
        "entity",
        file,
        out,
    );
    for entity in &ast.entities {
        let mut seen: HashMap<&str, sdl_common::SourceSpan> = HashMap::new();
        for component in &entity.components {
            match seen.get(component.name.as_str()) {
                Some(first_span) => out.push(Diagnostic::new(
                    ErrorCode::E131,
                    format!(
                        "duplicate component type '{}' on entity '{}' (first defined at line {})",
                        component.name, entity.id, first_span.line
                    ),
                    component.name_span,
                    file,
                )),
                None => {
                    seen.insert(component.name.as_str(), component.name_span);
                }
            }
            check_fields_finite(&component.fields, file, out);
        }
    }
}

fn check_constraints(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    check_duplicates(
        ast.constraints.iter().map(|c| (c.id.as_str(), c.id_span)),
        "constraint",
        file,
        out,
    );
    for constraint in &ast.constraints {
        check_fields_finite(&constraint.fields, file, out);
    }
}

fn check_fields_finite(fields: &Fields, file: &str, out: &mut ErrorCollector) {
    for spanned in fields.values() {
        match &spanned.value {
            AstValue::Number(n) if !n.is_finite() => out.push(Diagnostic::new(
                ErrorCode::E140,
                format!("number field is not finite: {}", n),
                spanned.span,
                file,
            )),
            AstValue::Vector3(v) if v.iter().any(|c| !c.is_finite()) => out.push(Diagnostic::new(
                ErrorCode::E140,
                "vector component is not finite".to_string(),
                spanned.span,
                file,
            )),
            _ => {}
        }
    }
}

fn check_motions(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    check_duplicates(
        ast.motions.iter().map(|m| (m.id.as_str(), m.id_span)),
        "motion",
        file,
        out,
    );
    for motion in &ast.motions {
        check_fields_finite(&motion.fields, file, out);
        check_one_motion(motion, file, out);
    }
}

fn check_one_motion(motion: &AstMotion, file: &str, out: &mut ErrorCollector) {
    if motion.motion_type == "rotation" {
        if let Some(axis) = motion.fields.get("axis") {
            if !matches!(axis.value, AstValue::Vector3(_)) {
                out.push(Diagnostic::new(
                    ErrorCode::E141,
                    "rotation motion 'axis' must be a vector".to_string(),
                    axis.span,
                    file,
                ));
            }
        }
    }
    if matches!(motion.motion_type.as_str(), "rotation" | "translation") {
        if let Some(speed) = motion.fields.get("speed") {
            let finite = matches!(speed.value, AstValue::Number(n) if n.is_finite());
            if !finite {
                out.push(Diagnostic::new(
                    ErrorCode::E141,
                    "motion 'speed' must be a finite number".to_string(),
                    speed.span,
                    file,
                ));
            }
        }
    }
}

fn check_timelines(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    check_duplicates(
        ast.timelines.iter().map(|t| (t.id.as_str(), t.id_span)),
        "timeline",
        file,
        out,
    );
    for timeline in &ast.timelines {
        for event in &timeline.events {
            check_one_event(event, file, out);
        }
    }
}

fn check_one_event(event: &AstEvent, file: &str, out: &mut ErrorCollector) {
    if !(event.duration > 0.0) {
        out.push(Diagnostic::new(
            ErrorCode::E150,
            format!("event duration must be > 0, found {}", event.duration),
            event.duration_span,
            file,
        ));
    }
    if event.start < 0.0 {
        out.push(Diagnostic::new(
            ErrorCode::E151,
            format!("event start must be >= 0, found {}", event.start),
            event.start_span,
            file,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl_syntax::parse_source;

    const MIN: &str = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanics"}"#;

    fn validate(src: &str) -> ErrorCollector {
        let ast = parse_source(src, "t.dsl").expect("parse should succeed");
        let mut out = ErrorCollector::new();
        run(&ast, "t.dsl", &mut out);
        out
    }

    #[test]
    fn version_zero_is_e120() {
        let src = r#"scene{name:"T" version:0 ir_version:"0.1.0" unit_system:"SI"} library_imports{}"#;
        let diags = validate(src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E120));
    }

    #[test]
    fn bad_unit_system_is_e122() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"Metric"} library_imports{}"#;
        let diags = validate(src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E122));
    }

    #[test]
    fn duplicate_entity_ids_are_e130() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{}} }} entity a {{ kind: solid components {{}} }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E130));
    }

    #[test]
    fn duplicate_component_type_is_e131() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{ geometry {{ primitive: cube }} geometry {{ primitive: sphere }} }} }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E131));
    }

    #[test]
    fn event_duration_zero_is_e150_and_negative_start_is_e151() {
        let src = format!(
            r#"{} motion spin {{ target: a type: rotation }} timeline t1 {{ event {{ motion: spin start: -1 duration: 0 }} }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E150));
        assert!(diags.iter().any(|d| d.code == ErrorCode::E151));
    }

    #[test]
    fn well_formed_minimal_scene_has_no_diagnostics() {
        assert!(validate(MIN).into_vec().is_empty());
    }

    #[test]
    fn entity_component_duplicate_is_reported_before_later_constraint_id_duplicate() {
        let src = format!(
            r#"{}
            entity a {{ kind: solid components {{ geometry {{ primitive: cube }} geometry {{ primitive: sphere }} }} }}
            constraint c1 {{ type: fixed_joint parent: a child: a }}
            constraint c1 {{ type: fixed_joint parent: a child: a }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        let e131 = diags.iter().position(|d| d.code == ErrorCode::E131).unwrap();
        let e130 = diags.iter().position(|d| d.code == ErrorCode::E130).unwrap();
        assert!(e131 < e130, "entity-section E131 must precede constraint-section E130");
    }
}
