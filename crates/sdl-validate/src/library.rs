//! The library registry (spec.md §4.8): a process-wide, immutable-after-
//! construction map from library name to the set of component/constraint/
//! motion type names it provides. `library_imports` in a scene picks a
//! subset of this registry by alias; the library validator checks that
//! every used type is covered by an imported library.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::schema::NodeKind;

#[derive(Debug, Clone, Default)]
pub struct LibraryEntry {
    pub components: BTreeSet<String>,
    pub constraints: BTreeSet<String>,
    pub motions: BTreeSet<String>,
}

impl LibraryEntry {
    fn provides(&self, kind: NodeKind, type_name: &str) -> bool {
        match kind {
            NodeKind::Component => self.components.contains(type_name),
            NodeKind::Constraint => self.constraints.contains(type_name),
            NodeKind::Motion => self.motions.contains(type_name),
        }
    }
}

/// name -> entry, insertion order preserved since diagnostics may list
/// library names in registration order (e.g. E500 suggestions).
#[derive(Debug, Clone, Default)]
pub struct LibraryRegistry {
    libraries: IndexMap<String, LibraryEntry>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        LibraryRegistry::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(|s| s.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: LibraryEntry) {
        self.libraries.insert(name.into(), entry);
    }

    /// Merges `other`'s entries into `self`, overwriting a library of the
    /// same name. Used by the CLI's `--library-registry` extension file
    /// (spec.md §9 ambient stack): host-supplied libraries layer on top of
    /// the four built-ins, then the whole thing is frozen.
    pub fn merge(&mut self, other: LibraryRegistry) {
        for (name, entry) in other.libraries {
            self.libraries.insert(name, entry);
        }
    }

    /// Names of every library (built-in or host-added) that provides
    /// `type_name` for `kind`, regardless of whether it's imported. Used to
    /// decide between E200 (truly unknown) and E510 (known but not
    /// imported), and to build E510's help text.
    pub fn providers(&self, kind: NodeKind, type_name: &str) -> Vec<&str> {
        self.libraries
            .iter()
            .filter(|(_, entry)| entry.provides(kind, type_name))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// True if *no* library in the whole registry (imported or not)
    /// provides this type — the type simply doesn't exist.
    pub fn is_unknown_anywhere(&self, kind: NodeKind, type_name: &str) -> bool {
        self.providers(kind, type_name).is_empty()
    }

    /// The four seeded libraries from spec.md §4.8. `core_mechanics` and
    /// `basic_solids` cover the default schema registry's everyday types;
    /// `gear_systems` covers the one constraint type that models a real
    /// mechanical coupling beyond a rigid joint; `advanced_physics` ships
    /// empty and exists as a named extension point for host-supplied types
    /// merged in via `--library-registry` (documented in DESIGN.md).
    pub fn default_registry() -> Self {
        let mut registry = LibraryRegistry::new();
        registry.insert(
            "core_mechanics",
            LibraryEntry {
                components: ["transform", "physical"].iter().map(|s| s.to_string()).collect(),
                constraints: ["fixed_joint"].iter().map(|s| s.to_string()).collect(),
                motions: ["rotation", "translation"].iter().map(|s| s.to_string()).collect(),
            },
        );
        registry.insert(
            "basic_solids",
            LibraryEntry {
                components: ["geometry"].iter().map(|s| s.to_string()).collect(),
                constraints: BTreeSet::new(),
                motions: BTreeSet::new(),
            },
        );
        registry.insert(
            "gear_systems",
            LibraryEntry {
                components: BTreeSet::new(),
                constraints: ["gear_relation"].iter().map(|s| s.to_string()).collect(),
                motions: BTreeSet::new(),
            },
        );
        registry.insert("advanced_physics", LibraryEntry::default());
        registry
    }
}

/// Smallest number of single-character edits (insert/delete/substitute)
/// between two strings. Used only to rank E500 "did you mean" suggestions
/// (spec.md §4.8); not exposed beyond this crate.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let above = row[j];
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            row[j] = (row[j - 1] + 1).min(above + 1).min(prev_diag + cost);
            prev_diag = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_all_four_names() {
        let registry = LibraryRegistry::default_registry();
        for name in ["core_mechanics", "basic_solids", "gear_systems", "advanced_physics"] {
            assert!(registry.contains(name));
        }
    }

    #[test]
    fn gear_relation_is_provided_only_by_gear_systems() {
        let registry = LibraryRegistry::default_registry();
        assert_eq!(
            registry.providers(NodeKind::Constraint, "gear_relation"),
            vec!["gear_systems"]
        );
    }

    #[test]
    fn unknown_type_has_no_providers() {
        let registry = LibraryRegistry::default_registry();
        assert!(registry.is_unknown_anywhere(NodeKind::Component, "turbine"));
    }

    #[test]
    fn edit_distance_matches_known_cases() {
        assert_eq!(edit_distance("core_mechanics", "core_mechanic"), 1);
        assert_eq!(edit_distance("gear_systems", "gear_system"), 1);
        assert_eq!(edit_distance("abc", "abc"), 0);
    }
}
