//! Pass 3 — symbol resolution, constraint-cycle detection and timeline
//! overlap detection (spec.md §4.6).
//!
//! Symbol tables are built in one sweep, then every reference is resolved
//! against them in a second; the grammar's fixed section order already
//! rules out forward references, so there is no need to interleave the two
//! sweeps (spec.md §9).

use std::collections::HashMap;

use sdl_common::SourceSpan;
use sdl_diagnostics::{Diagnostic, ErrorCode, ErrorCollector};
use sdl_syntax::ast::{AstConstraint, AstFile};

use crate::schema::{NodeKind, SchemaRegistry};

/// Checks run in grammar-section order (`entity* constraint* motion*
/// timeline*`) so diagnostics come out in ascending span-offset order:
/// constraint-section checks (references, cycles) before motion-section
/// checks (targets), before timeline-section checks (event references,
/// overlaps).
pub fn run(ast: &AstFile, registry: &SchemaRegistry, file: &str, out: &mut ErrorCollector) {
    let entities: HashMap<&str, SourceSpan> =
        ast.entities.iter().map(|e| (e.id.as_str(), e.id_span)).collect();
    let motions: HashMap<&str, SourceSpan> =
        ast.motions.iter().map(|m| (m.id.as_str(), m.id_span)).collect();

    check_constraint_references(ast, registry, &entities, file, out);
    let edges = constraint_edges(ast, registry, &entities);
    detect_cycles(ast.entities.iter().map(|e| e.id.as_str()), &edges, file, out);

    check_motion_targets(ast, &entities, file, out);

    check_event_motions(ast, &motions, file, out);
    detect_timeline_overlaps(ast, file, out);
}

fn check_constraint_references(
    ast: &AstFile,
    registry: &SchemaRegistry,
    entities: &HashMap<&str, SourceSpan>,
    file: &str,
    out: &mut ErrorCollector,
) {
    for constraint in &ast.constraints {
        let Some(schema) = registry.lookup(NodeKind::Constraint, &constraint.constraint_type) else {
            continue;
        };
        for field_schema in schema.entity_ref_fields() {
            let Some(value) = constraint.fields.get(field_schema.name) else {
                continue;
            };
            if let sdl_syntax::ast::AstValue::Identifier(target) = &value.value {
                if !entities.contains_key(target.as_str()) {
                    out.push(Diagnostic::new(
                        ErrorCode::E300,
                        format!("undefined entity '{}'", target),
                        value.span,
                        file,
                    ).with_label("entity not found in scope")
                    .with_help(format!("define '{}' before referencing it", target)));
                }
            }
        }
    }
}

fn check_motion_targets(
    ast: &AstFile,
    entities: &HashMap<&str, SourceSpan>,
    file: &str,
    out: &mut ErrorCollector,
) {
    for motion in &ast.motions {
        if !entities.contains_key(motion.target.as_str()) {
            out.push(Diagnostic::new(
                ErrorCode::E300,
                format!("undefined entity '{}'", motion.target),
                motion.target_span,
                file,
            ).with_label("entity not found in scope")
            .with_help(format!("define '{}' before referencing it", motion.target)));
        }
    }
}

fn check_event_motions(
    ast: &AstFile,
    motions: &HashMap<&str, SourceSpan>,
    file: &str,
    out: &mut ErrorCollector,
) {
    for timeline in &ast.timelines {
        for event in &timeline.events {
            if !motions.contains_key(event.motion.as_str()) {
                out.push(Diagnostic::new(
                    ErrorCode::E301,
                    format!("undefined motion '{}'", event.motion),
                    event.motion_span,
                    file,
                ).with_label("motion not found in scope")
                .with_help(format!("define motion '{}' before referencing it", event.motion)));
            }
        }
    }
}

struct Edge<'a> {
    from: &'a str,
    to: &'a str,
    span: SourceSpan,
}

/// One edge per constraint whose schema declares (at least) two entity
/// reference fields, taken in schema-declared order: `parent -> child` for
/// `fixed_joint`, `driver -> driven` for `gear_relation` (spec.md §4.6).
/// Edges are only emitted between entities that actually resolved — an
/// undefined endpoint already produced an E300 above and would only add
/// noise here.
fn constraint_edges<'a>(
    ast: &'a AstFile,
    registry: &SchemaRegistry,
    entities: &HashMap<&'a str, SourceSpan>,
) -> Vec<Edge<'a>> {
    let mut edges = Vec::new();
    for constraint in &ast.constraints {
        let Some(schema) = registry.lookup(NodeKind::Constraint, &constraint.constraint_type) else {
            continue;
        };
        let refs: Vec<&str> = schema
            .entity_ref_fields()
            .filter_map(|f| constraint.fields.get(f.name))
            .filter_map(|v| match &v.value {
                sdl_syntax::ast::AstValue::Identifier(id) => Some(id.as_str()),
                _ => None,
            })
            .collect();
        if refs.len() >= 2 && entities.contains_key(refs[0]) && entities.contains_key(refs[1]) {
            edges.push(edge_for(constraint, refs[0], refs[1]));
        }
    }
    edges
}

fn edge_for<'a>(constraint: &'a AstConstraint, from: &'a str, to: &'a str) -> Edge<'a> {
    Edge {
        from,
        to,
        span: constraint.span,
    }
}

fn detect_cycles<'a>(
    entity_ids: impl Iterator<Item = &'a str>,
    edges: &[Edge<'a>],
    file: &str,
    out: &mut ErrorCollector,
) {
    let mut adjacency: HashMap<&str, Vec<&Edge<'a>>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.from).or_default().push(edge);
    }

    // Collected into a `Vec` up front so DFS roots are visited in the
    // caller's source order; `HashMap` iteration order is reseeded per
    // process and would make the reported cycle-closing edge nondeterministic.
    let ids: Vec<&str> = entity_ids.collect();
    let mut color: HashMap<&str, u8> = HashMap::new();
    for id in ids.iter().copied() {
        color.entry(id).or_insert(0);
    }

    for id in ids {
        if color.get(id).copied().unwrap_or(0) == 0 {
            let mut path = Vec::new();
            visit(id, &adjacency, &mut color, &mut path, file, out);
        }
    }
}

/// Three-color DFS (white=0, gray=1, black=2). Returns true once a cycle
/// has been reported for this subtree, so callers stop descending further
/// into it but siblings are still explored.
fn visit<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&Edge<'a>>>,
    color: &mut HashMap<&'a str, u8>,
    path: &mut Vec<&'a str>,
    file: &str,
    out: &mut ErrorCollector,
) -> bool {
    color.insert(node, 1);
    path.push(node);

    if let Some(edges) = adjacency.get(node) {
        for edge in edges {
            match color.get(edge.to).copied().unwrap_or(0) {
                1 => {
                    let start = path.iter().position(|n| *n == edge.to).unwrap_or(0);
                    let mut cycle: Vec<&str> = path[start..].to_vec();
                    cycle.push(edge.to);
                    out.push(
                        Diagnostic::new(
                            ErrorCode::E310,
                            "constraint dependency cycle detected".to_string(),
                            edge.span,
                            file,
                        )
                        .with_help(format!("cycle: {}", cycle.join(" -> "))),
                    );
                    path.pop();
                    color.insert(node, 2);
                    return true;
                }
                0 => {
                    if visit(edge.to, adjacency, color, path, file, out) {
                        path.pop();
                        color.insert(node, 2);
                        return true;
                    }
                }
                _ => {}
            }
        }
    }

    path.pop();
    color.insert(node, 2);
    false
}

/// Groups events within a timeline by motion id and reports overlapping
/// `[start, start+duration)` intervals within each group (spec.md §4.6).
/// Events for different motions, or the same motion across different
/// timelines, never conflict.
fn detect_timeline_overlaps(ast: &AstFile, file: &str, out: &mut ErrorCollector) {
    for timeline in &ast.timelines {
        let mut by_motion: HashMap<&str, Vec<&sdl_syntax::ast::AstEvent>> = HashMap::new();
        for event in &timeline.events {
            by_motion.entry(event.motion.as_str()).or_default().push(event);
        }
        for events in by_motion.values_mut() {
            events.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
            for window in events.windows(2) {
                let (prev, next) = (window[0], window[1]);
                if next.start < prev.start + prev.duration {
                    out.push(
                        Diagnostic::new(
                            ErrorCode::E320,
                            format!(
                                "overlapping events for motion '{}': [{}, {}) and [{}, {})",
                                next.motion,
                                prev.start,
                                prev.start + prev.duration,
                                next.start,
                                next.start + next.duration
                            ),
                            next.span,
                            file,
                        )
                        .with_label("overlaps the preceding event on this motion"),
                    );
                }
            }
        }
    }
}
