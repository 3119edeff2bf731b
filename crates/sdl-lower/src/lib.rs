//! AST → IR lowering (spec.md §4.9). A pure function over a validated AST:
//! every node maps to exactly one IR node, traversal mirrors the AST shape,
//! and nothing here can fail. If it would, that's a bug in validation, not
//! something this crate recovers from — hence no `Result` anywhere below.

use indexmap::IndexMap;

use sdl_ir::{
    IrComponent, IrConstraint, IrEntity, IrEvent, IrMetadata, IrMotion, IrScene, IrTimeline, IrValue,
};
use sdl_syntax::ast::{AstFile, AstValue, Fields};

pub fn lower(ast: &AstFile) -> IrScene {
    log::debug!(
        "lowering {} entities, {} constraints, {} motions, {} timelines",
        ast.entities.len(),
        ast.constraints.len(),
        ast.motions.len(),
        ast.timelines.len()
    );

    IrScene {
        metadata: IrMetadata {
            name: ast.scene.name.clone(),
            version: ast.scene.version,
            ir_version: ast.scene.ir_version.clone(),
            unit_system: ast.scene.unit_system.clone(),
        },
        library_imports: ast
            .library_imports
            .imports
            .iter()
            .map(|(alias, library)| (alias.clone(), library.value.clone()))
            .collect(),
        entities: ast.entities.iter().map(lower_entity).collect(),
        constraints: ast.constraints.iter().map(lower_constraint).collect(),
        motions: ast.motions.iter().map(lower_motion).collect(),
        timelines: ast.timelines.iter().map(lower_timeline).collect(),
    }
}

fn lower_entity(entity: &sdl_syntax::ast::AstEntity) -> IrEntity {
    IrEntity {
        id: entity.id.clone(),
        kind: entity.kind.clone(),
        components: entity
            .components
            .iter()
            .map(|component| {
                (
                    component.name.clone(),
                    IrComponent {
                        component_type: component.name.clone(),
                        properties: lower_fields(&component.fields),
                    },
                )
            })
            .collect(),
    }
}

fn lower_constraint(constraint: &sdl_syntax::ast::AstConstraint) -> IrConstraint {
    IrConstraint {
        id: constraint.id.clone(),
        constraint_type: constraint.constraint_type.clone(),
        parameters: lower_fields(&constraint.fields),
    }
}

/// The flat `motion { target, type, axis, speed, ... }` form the parser
/// accepts (spec.md §9's resolved Open Question) is grouped here: everything
/// but `target`/`type` — already pulled off the field map by the parser —
/// becomes `IrMotion.parameters`, which is what the renderer reads.
fn lower_motion(motion: &sdl_syntax::ast::AstMotion) -> IrMotion {
    IrMotion {
        id: motion.id.clone(),
        motion_type: motion.motion_type.clone(),
        target_entity: motion.target.clone(),
        parameters: lower_fields(&motion.fields),
    }
}

fn lower_timeline(timeline: &sdl_syntax::ast::AstTimeline) -> IrTimeline {
    IrTimeline {
        id: timeline.id.clone(),
        events: timeline
            .events
            .iter()
            .map(|event| IrEvent {
                motion_id: event.motion.clone(),
                start_time: event.start,
                duration: event.duration,
            })
            .collect(),
    }
}

fn lower_fields(fields: &Fields) -> IndexMap<String, IrValue> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), lower_value(&value.value)))
        .collect()
}

/// `true`/`false` identifiers become `Boolean`; every other identifier is a
/// reference and stays `Identifier` (spec.md §3, §4.9).
fn lower_value(value: &AstValue) -> IrValue {
    match value {
        AstValue::Number(n) => IrValue::Number(*n),
        AstValue::String(s) => IrValue::String(s.clone()),
        AstValue::Vector3(v) => IrValue::Vector3(*v),
        AstValue::Identifier(ident) => match ident.as_str() {
            "true" => IrValue::Boolean(true),
            "false" => IrValue::Boolean(false),
            _ => IrValue::Identifier(ident.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl_syntax::parse_source;

    #[test]
    fn lowers_minimal_scene_to_empty_lists() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanics"}"#;
        let ast = parse_source(src, "t.dsl").unwrap();
        let ir = lower(&ast);
        assert_eq!(ir.metadata.name, "T");
        assert_eq!(ir.metadata.version, 1);
        assert!(ir.entities.is_empty());
        assert!(ir.constraints.is_empty());
        assert!(ir.motions.is_empty());
        assert!(ir.timelines.is_empty());
    }

    #[test]
    fn lowers_entity_components_and_boolean_coercion() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanics"}
            entity cube1 { kind: solid components {
                transform { position: [0,0,0] rotation: [0,0,0] scale: [1,1,1] }
                geometry { primitive: cube }
                physical { mass: 2.5 rigid: true }
            } }"#;
        let ast = parse_source(src, "t.dsl").unwrap();
        let ir = lower(&ast);
        let entity = &ir.entities[0];
        assert_eq!(entity.id, "cube1");
        assert_eq!(entity.kind, "solid");

        let geometry = entity.components.get("geometry").unwrap();
        assert_eq!(
            geometry.properties.get("primitive"),
            Some(&IrValue::Identifier("cube".to_string()))
        );

        let physical = entity.components.get("physical").unwrap();
        assert_eq!(physical.properties.get("rigid"), Some(&IrValue::Boolean(true)));
        assert_eq!(physical.properties.get("mass"), Some(&IrValue::Number(2.5)));
    }

    #[test]
    fn lowers_motion_flat_fields_into_parameters() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanics"}
            entity cube1 { kind: solid components {} }
            motion spin { target: cube1 type: rotation axis: [0,1,0] speed: 1.5708 }
            timeline t1 { event { motion: spin start: 0 duration: 10 } }"#;
        let ast = parse_source(src, "t.dsl").unwrap();
        let ir = lower(&ast);

        let motion = &ir.motions[0];
        assert_eq!(motion.target_entity, "cube1");
        assert_eq!(motion.motion_type, "rotation");
        assert_eq!(motion.parameters.get("axis"), Some(&IrValue::Vector3([0.0, 1.0, 0.0])));
        assert_eq!(motion.parameters.get("speed"), Some(&IrValue::Number(1.5708)));

        let timeline = &ir.timelines[0];
        assert_eq!(timeline.events[0].motion_id, "spin");
        assert_eq!(timeline.events[0].start_time, 0.0);
        assert_eq!(timeline.events[0].duration, 10.0);
    }
}
