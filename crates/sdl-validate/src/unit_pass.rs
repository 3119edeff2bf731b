//! Pass 4 — physical-unit sanity (spec.md §4.7). Runs after reference
//! resolution so it never has to guess whether a field's value kind is even
//! right; schema validation (pass 2) already guaranteed that for any
//! registered type.

use sdl_diagnostics::{Diagnostic, ErrorCode, ErrorCollector};
use sdl_syntax::ast::{AstFile, AstValue};

/// 1e6 kg converted to pounds, the bound spec.md §4.7 asks for under the
/// Imperial unit system ("equivalent bound adjusted for Imperial").
const KG_TO_LB: f64 = 2.20462;
const SI_MAX_MASS: f64 = 1e6;
const ROTATION_DEGREES_THRESHOLD: f64 = 4.0 * std::f64::consts::PI;
const AXIS_UNIT_TOLERANCE: f64 = 1e-6;

/// Entities precede motions in the grammar (`entity* constraint* motion*
/// timeline*`), so entity-derived diagnostics are checked first to keep
/// output in ascending span-offset order.
pub fn run(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    let max_mass = if ast.scene.unit_system == "Imperial" {
        SI_MAX_MASS * KG_TO_LB
    } else {
        SI_MAX_MASS
    };

    for entity in &ast.entities {
        for component in &entity.components {
            match component.name.as_str() {
                "physical" => check_mass(component, max_mass, file, out),
                "transform" => check_rotation_magnitude(component, file, out),
                _ => {}
            }
        }
    }

    for motion in &ast.motions {
        if motion.motion_type == "rotation" {
            check_rotation_axis(motion, file, out);
        }
    }
}

fn check_rotation_axis(motion: &sdl_syntax::ast::AstMotion, file: &str, out: &mut ErrorCollector) {
    let Some(axis) = motion.fields.get("axis") else {
        return;
    };
    let AstValue::Vector3(v) = &axis.value else {
        return;
    };
    let magnitude = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if !magnitude.is_finite() {
        out.push(Diagnostic::new(
            ErrorCode::E430,
            "rotation axis magnitude is not finite".to_string(),
            axis.span,
            file,
        ));
        return;
    }
    if (magnitude - 1.0).abs() > AXIS_UNIT_TOLERANCE {
        out.push(
            Diagnostic::new(
                ErrorCode::E400,
                format!(
                    "rotation axis [{}, {}, {}] is not a unit vector (magnitude {:.6})",
                    v[0], v[1], v[2], magnitude
                ),
                axis.span,
                file,
            )
            .with_help("normalize the axis so its magnitude is 1"),
        );
    }
}

fn check_mass(
    component: &sdl_syntax::ast::AstComponent,
    max_mass: f64,
    file: &str,
    out: &mut ErrorCollector,
) {
    let Some(mass_field) = component.fields.get("mass") else {
        return;
    };
    let AstValue::Number(mass) = &mass_field.value else {
        return;
    };
    let mass = *mass;
    if !mass.is_finite() {
        out.push(Diagnostic::new(
            ErrorCode::E430,
            "mass is not finite".to_string(),
            mass_field.span,
            file,
        ));
        return;
    }
    if mass <= 0.0 {
        out.push(Diagnostic::new(
            ErrorCode::E410,
            format!("mass must be strictly positive, found {}", mass),
            mass_field.span,
            file,
        ));
        return;
    }
    if mass > max_mass {
        out.push(Diagnostic::new(
            ErrorCode::E411,
            format!("mass {} exceeds the maximum of {} for this unit system", mass, max_mass),
            mass_field.span,
            file,
        ));
    }
}

fn check_rotation_magnitude(
    component: &sdl_syntax::ast::AstComponent,
    file: &str,
    out: &mut ErrorCollector,
) {
    let Some(rotation_field) = component.fields.get("rotation") else {
        return;
    };
    let AstValue::Vector3(v) = &rotation_field.value else {
        return;
    };
    if v.iter().any(|c| c.abs() > ROTATION_DEGREES_THRESHOLD) {
        out.push(
            Diagnostic::new(
                ErrorCode::W420,
                "rotation component exceeds 4*pi radians".to_string(),
                rotation_field.span,
                file,
            )
            .with_help("this looks like it may be in degrees rather than radians"),
        );
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
    fn non_unit_axis_is_e400() {
        let src = format!(r#"{} motion spin {{ target: a type: rotation axis: [1,1,0] speed: 1 }}"#, MIN);
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E400));
    }

    #[test]
    fn zero_axis_is_e400() {
        let src = format!(r#"{} motion spin {{ target: a type: rotation axis: [0,0,0] speed: 1 }}"#, MIN);
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E400));
    }

    #[test]
    fn unit_axis_has_no_diagnostics() {
        let src = format!(r#"{} motion spin {{ target: a type: rotation axis: [0,1,0] speed: 1 }}"#, MIN);
        assert!(validate(&src).into_vec().is_empty());
    }

    #[test]
    fn zero_mass_is_e410_and_huge_mass_is_e411() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{ physical {{ mass: 0 rigid: true }} }} }} entity b {{ kind: solid components {{ physical {{ mass: 1e7 rigid: true }} }} }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E410));
        assert!(diags.iter().any(|d| d.code == ErrorCode::E411));
    }

    #[test]
    fn negative_mass_is_e410() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{ physical {{ mass: -1 rigid: true }} }} }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        assert!(diags.iter().any(|d| d.code == ErrorCode::E410));
    }

    #[test]
    fn entity_mass_violation_is_reported_before_later_motion_axis_violation() {
        let src = format!(
            r#"{}
            entity a {{ kind: solid components {{ physical {{ mass: -1 rigid: true }} }} }}
            motion spin {{ target: a type: rotation axis: [1,1,0] speed: 1 }}"#,
            MIN
        );
        let diags = validate(&src).into_vec();
        let e410 = diags.iter().position(|d| d.code == ErrorCode::E410).unwrap();
        let e400 = diags.iter().position(|d| d.code == ErrorCode::E400).unwrap();
        assert!(e410 < e400, "entity-section E410 must precede motion-section E400");
    }

    #[test]
    fn large_rotation_component_is_w420_warning_only() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{ transform {{ position: [0,0,0] rotation: [20,0,0] scale: [1,1,1] }} }} }}"#,
            MIN
        );
        let collector = validate(&src);
        assert!(!collector.has_errors());
        assert!(collector.iter().any(|d| d.code == ErrorCode::W420));
    }
}
