//! The three public entry points spec.md §6 names: [`compile`],
//! [`parse_only`] and [`validate_only`], plus [`Compiler`], which wires the
//! two process-wide registries (spec.md §4.5, §4.8) together for a host
//! that wants to extend the library registry before compiling anything.

pub mod config;

use sdl_diagnostics::{Diagnostic, ErrorCollector};
use sdl_ir::IrScene;
use sdl_syntax::ast::AstFile;
use sdl_validate::{LibraryRegistry, SchemaRegistry};

/// A successful compile's IR plus any warnings that accompanied it
/// (spec.md §7: warnings never fail compilation but still need to reach
/// the caller somehow).
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub ir: IrScene,
    pub warnings: Vec<Diagnostic>,
}

/// Holds the two registries compilation reads from. Built once per host
/// process and immutable afterwards (spec.md §5) — there is no mutation API
/// beyond the builder methods used before any `compile` call.
#[derive(Debug, Clone)]
pub struct Compiler {
    schema_registry: SchemaRegistry,
    library_registry: LibraryRegistry,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler {
            schema_registry: SchemaRegistry::default_registry(),
            library_registry: LibraryRegistry::default_registry(),
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Compiler::default()
    }

    /// Merges `registry` on top of the four built-in libraries (spec.md
    /// §9's `--library-registry` flag). Must be called before any
    /// `compile`/`validate_only` call; the registry is frozen afterwards.
    pub fn with_library_registry(mut self, registry: LibraryRegistry) -> Self {
        self.library_registry.merge(registry);
        self
    }

    pub fn schema_registry(&self) -> &SchemaRegistry {
        &self.schema_registry
    }

    pub fn library_registry(&self) -> &LibraryRegistry {
        &self.library_registry
    }

    /// `source text -> Lexer -> Parser -> Validator (5 passes) -> Lowering
    /// -> IR`, per spec.md §2. Lexer/parser failures halt immediately with
    /// a single diagnostic (spec.md §4.2, §4.3); validator diagnostics are
    /// collected across all five passes before the compile either fails or
    /// succeeds (spec.md §7).
    pub fn compile(&self, source: &str, file_id: &str) -> Result<CompileOutput, Vec<Diagnostic>> {
        log::debug!("compiling '{}' ({} bytes)", file_id, source.len());

        let ast = parse_only_with(source, file_id)?;
        let passes = self.validate_ast(&ast, file_id);

        if passes.iter().any(|c| c.has_errors()) {
            let count: usize = passes.iter().map(|c| c.len()).sum();
            log::debug!("'{}' failed with {} diagnostic(s)", file_id, count);
            return Err(into_sorted_vec(passes));
        }

        let diagnostics = into_sorted_vec(passes);
        let ir = sdl_lower::lower(&ast);
        log::debug!(
            "'{}' compiled cleanly with {} warning(s)",
            file_id,
            diagnostics.len()
        );
        Ok(CompileOutput {
            ir,
            warnings: diagnostics,
        })
    }

    /// Lexes then parses `source`, stopping at the first diagnostic either
    /// stage produces. Does not run any validator pass.
    pub fn parse_only(&self, source: &str, file_id: &str) -> Result<AstFile, Diagnostic> {
        parse_only_with(source, file_id)
    }

    /// Runs the five validator passes over an already-parsed AST and
    /// returns every diagnostic (including warnings) on success, or every
    /// diagnostic on failure — the two cases differ only in whether a
    /// non-warning diagnostic is present (spec.md §7).
    pub fn validate_only(&self, ast: &AstFile, file_id: &str) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
        let passes = self.validate_ast(ast, file_id);
        if passes.iter().any(|c| c.has_errors()) {
            Err(into_sorted_vec(passes))
        } else {
            Ok(into_sorted_vec(passes))
        }
    }

    fn validate_ast(&self, ast: &AstFile, file_id: &str) -> Vec<ErrorCollector> {
        sdl_validate::validate(ast, &self.schema_registry, &self.library_registry, file_id)
    }
}

fn parse_only_with(source: &str, file_id: &str) -> Result<AstFile, Diagnostic> {
    sdl_syntax::parse_source(source, file_id)
}

/// The seam spec.md §5's ordering guarantee actually depends on: each
/// pass's diagnostics are stable-sorted by ascending span offset — so
/// within-offset insertion order survives — and the five sorted lists are
/// then concatenated in the fixed {syntax, schema, reference, unit,
/// library} pass order. Sorting per pass rather than across the whole
/// merged list keeps pass order authoritative even where two passes touch
/// overlapping spans.
fn into_sorted_vec(passes: Vec<ErrorCollector>) -> Vec<Diagnostic> {
    let mut all = Vec::new();
    for collector in passes {
        let mut diagnostics = collector.into_vec();
        diagnostics.sort_by_key(|d| d.span.offset);
        all.extend(diagnostics);
    }
    all
}

/// Convenience free function over a default [`Compiler`] (spec.md §6).
pub fn compile(source: &str, file_id: &str) -> Result<CompileOutput, Vec<Diagnostic>> {
    Compiler::default().compile(source, file_id)
}

/// Convenience free function over a default [`Compiler`] (spec.md §6).
pub fn parse_only(source: &str, file_id: &str) -> Result<AstFile, Diagnostic> {
    parse_only_with(source, file_id)
}

/// Convenience free function over a default [`Compiler`] (spec.md §6).
pub fn validate_only(ast: &AstFile, file_id: &str) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
    Compiler::default().validate_only(ast, file_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl_diagnostics::ErrorCode;

    const MIN: &str = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanics"}"#;

    /// S1
    #[test]
    fn minimal_scene_compiles_with_empty_lists() {
        let output = compile(MIN, "scene.dsl").expect("should compile");
        assert_eq!(output.ir.metadata.name, "T");
        assert_eq!(output.ir.metadata.version, 1);
        assert_eq!(output.ir.metadata.ir_version, "0.1.0");
        assert_eq!(output.ir.metadata.unit_system, "SI");
        assert!(output.ir.entities.is_empty());
        assert!(output.ir.constraints.is_empty());
        assert!(output.ir.motions.is_empty());
        assert!(output.ir.timelines.is_empty());
        assert!(output.warnings.is_empty());
    }

    /// S2
    #[test]
    fn entity_with_transform_and_geometry_lowers_correctly() {
        let src = format!(
            r#"{} library_imports{{core:"core_mechanics" solids:"basic_solids"}}
            entity cube1 {{ kind: solid components {{
                transform {{ position: [0,0,0] rotation: [0,0,0] scale: [1,1,1] }}
                geometry {{ primitive: cube }}
            }} }}"#,
            r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"}"#
        );
        let output = compile(&src, "scene.dsl").expect("should compile");
        let entity = &output.ir.entities[0];
        assert_eq!(entity.id, "cube1");
        assert_eq!(entity.kind, "solid");
        assert!(entity.components.contains_key("transform"));
        assert!(entity.components.contains_key("geometry"));
    }

    /// S3
    #[test]
    fn motion_and_timeline_lower_with_correct_ids() {
        let src = format!(
            r#"{}
            entity cube1 {{ kind: solid components {{}} }}
            motion spin {{ target: cube1 type: rotation axis: [0,1,0] speed: 1.5708 }}
            timeline t1 {{ event {{ motion: spin start: 0 duration: 10 }} }}"#,
            MIN
        );
        let output = compile(&src, "scene.dsl").expect("should compile");
        assert_eq!(output.ir.motions[0].target_entity, "cube1");
        let event = &output.ir.timelines[0].events[0];
        assert_eq!(event.motion_id, "spin");
        assert_eq!(event.start_time, 0.0);
        assert_eq!(event.duration, 10.0);
    }

    /// S4
    #[test]
    fn undefined_motion_reference_fails_with_single_e301() {
        let src = format!(
            r#"{}
            entity cube1 {{ kind: solid components {{}} }}
            motion spin {{ target: cube1 type: rotation axis: [0,1,0] speed: 1.5708 }}
            timeline t1 {{ event {{ motion: spiin start: 0 duration: 10 }} }}"#,
            MIN
        );
        let diagnostics = compile(&src, "scene.dsl").expect_err("should fail");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::E301);
    }

    /// S5
    #[test]
    fn two_constraints_forming_a_cycle_fail_with_e310() {
        let src = format!(
            r#"scene{{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"}} library_imports{{gear:"gear_systems"}}
            entity a {{ kind: solid components {{}} }}
            entity b {{ kind: solid components {{}} }}
            constraint c1 {{ type: gear_relation driver: a driven: b }}
            constraint c2 {{ type: gear_relation driver: b driven: a }}"#
        );
        let diagnostics = compile(&src, "scene.dsl").expect_err("should fail");
        assert!(diagnostics.iter().any(|d| d.code == ErrorCode::E310));
    }

    /// S6
    #[test]
    fn invalid_unit_system_fails_with_e122() {
        let src = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"Metric"} library_imports{math:"core_mechanics"}"#;
        let diagnostics = compile(src, "scene.dsl").expect_err("should fail");
        assert!(diagnostics.iter().any(|d| d.code == ErrorCode::E122));
    }

    #[test]
    fn empty_source_fails_with_e101() {
        let diagnostics = compile("", "scene.dsl").expect_err("should fail");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::E101);
    }

    #[test]
    fn diagnostics_within_a_pass_stay_in_ascending_span_offset_order() {
        let src = format!(
            r#"{}
            entity a {{ kind: solid components {{ physical {{ mass: -1 rigid: true }} }} }}
            motion spin {{ target: a type: rotation axis: [1,1,0] speed: 1 }}"#,
            MIN
        );
        let diagnostics = compile(&src, "scene.dsl").expect_err("should fail");
        let e410 = diagnostics.iter().position(|d| d.code == ErrorCode::E410).unwrap();
        let e400 = diagnostics.iter().position(|d| d.code == ErrorCode::E400).unwrap();
        assert!(e410 < e400, "entity-section E410 must precede motion-section E400 within the unit pass");
    }

    #[test]
    fn syntax_pass_diagnostics_precede_schema_pass_diagnostics_regardless_of_offset() {
        let src = format!(
            r#"{}
            entity a {{ kind: solid components {{ geometry {{ primitive: cube bogus_field: 1 }} }} }}
            motion spin {{ target: a type: rotation }}
            motion spin {{ target: a type: rotation }}"#,
            MIN
        );
        let diagnostics = compile(&src, "scene.dsl").expect_err("should fail");
        let e130 = diagnostics.iter().position(|d| d.code == ErrorCode::E130).unwrap();
        let e211 = diagnostics.iter().position(|d| d.code == ErrorCode::E211).unwrap();
        assert!(e130 < e211, "syntax-pass diagnostics must precede schema-pass diagnostics regardless of span offset");
    }

    #[test]
    fn determinism_same_source_yields_identical_ir() {
        let first = compile(MIN, "scene.dsl").unwrap();
        let second = compile(MIN, "scene.dsl").unwrap();
        assert_eq!(first.ir, second.ir);
    }

    #[test]
    fn host_supplied_library_registry_extension_is_honored() {
        let toml_text = r#"
            [libraries.advanced_physics]
            components = ["turbine"]
        "#;
        let extension = config::load_library_registry_str(toml_text).unwrap();
        let compiler = Compiler::new().with_library_registry(extension);

        let src = format!(
            r#"{} library_imports{{ap:"advanced_physics"}} entity a {{ kind: solid components {{ turbine {{ rpm: 10 }} }} }}"#,
            r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"}"#
        );
        let output = compiler.compile(&src, "scene.dsl").expect("should compile");
        assert!(output.ir.entities[0].components.contains_key("turbine"));
    }
}
