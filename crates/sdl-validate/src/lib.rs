//! The five independent validator passes (spec.md §4.4-§4.8) plus the two
//! registries they read from. `sdl_compiler::compile` is the only caller
//! that has to know the fixed running order; each pass here is a free
//! function over `&AstFile` that only ever pushes into an `ErrorCollector`.

pub mod library;
pub mod library_pass;
pub mod reference_pass;
pub mod schema;
pub mod schema_pass;
pub mod syntax_pass;
pub mod unit_pass;

pub use library::LibraryRegistry;
pub use schema::SchemaRegistry;

use sdl_diagnostics::ErrorCollector;
use sdl_syntax::ast::AstFile;

/// Runs all five passes in the fixed order {syntax, schema, reference,
/// unit, library} spec.md §5 requires for deterministic diagnostics, and
/// returns one collector per pass, in that order.
///
/// Each pass is trusted to visit the AST close to source order, but not
/// perfectly — it's easy for a pass's internal check order to drift from
/// the section it covers as checks are added. Returning the passes
/// separately, rather than one merged collector, lets the caller
/// (`sdl_compiler::into_sorted_vec`) stable-sort each pass's diagnostics by
/// span offset before concatenating, so the "ascending span offset within
/// a pass" guarantee doesn't rely on every pass getting that right by
/// construction.
pub fn validate(
    ast: &AstFile,
    schema_registry: &SchemaRegistry,
    library_registry: &LibraryRegistry,
    file: &str,
) -> Vec<ErrorCollector> {
    log::debug!("'{}': running syntax pass", file);
    let mut syntax = ErrorCollector::new();
    syntax_pass::run(ast, file, &mut syntax);

    log::debug!("'{}': running schema pass", file);
    let mut schema = ErrorCollector::new();
    schema_pass::run(ast, schema_registry, file, &mut schema);

    log::debug!("'{}': running reference pass", file);
    let mut reference = ErrorCollector::new();
    reference_pass::run(ast, schema_registry, file, &mut reference);

    log::debug!("'{}': running unit pass", file);
    let mut unit = ErrorCollector::new();
    unit_pass::run(ast, file, &mut unit);

    log::debug!("'{}': running library pass", file);
    let mut library = ErrorCollector::new();
    library_pass::run(ast, schema_registry, library_registry, file, &mut library);

    let total: usize = [&syntax, &schema, &reference, &unit, &library]
        .iter()
        .map(|c| c.len())
        .sum();
    log::debug!("'{}': validation produced {} diagnostic(s)", file, total);

    vec![syntax, schema, reference, unit, library]
}
