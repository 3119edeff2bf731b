//! Host-supplied library registry extension (spec.md §9 ambient stack),
//! read the way `til_parser::project` reads a project TOML file: parse
//! once at startup with `toml`/`serde`, merge into the default registry,
//! then freeze it.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use sdl_common::{Error, Result};
use sdl_validate::library::LibraryEntry;
use sdl_validate::LibraryRegistry;

#[derive(Deserialize)]
struct LibraryRegistryFile {
    #[serde(default)]
    libraries: std::collections::HashMap<String, LibraryEntryFile>,
}

#[derive(Deserialize, Default)]
struct LibraryEntryFile {
    #[serde(default)]
    components: BTreeSet<String>,
    #[serde(default)]
    constraints: BTreeSet<String>,
    #[serde(default)]
    motions: BTreeSet<String>,
}

/// Reads a TOML file of the shape:
///
/// ```toml
/// [libraries.my_extension]
/// components = ["turbine"]
/// constraints = []
/// motions = ["oscillation"]
/// ```
///
/// and returns a [`LibraryRegistry`] containing just the libraries it
/// declares. The caller merges this into [`LibraryRegistry::default_registry`]
/// (spec.md §9); this function never touches the built-ins itself.
pub fn load_library_registry_file(path: &Path) -> Result<LibraryRegistry> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| Error::FileIo(format!("{}: {}", path.display(), err)))?;
    load_library_registry_str(&text)
}

pub fn load_library_registry_str(text: &str) -> Result<LibraryRegistry> {
    let parsed: LibraryRegistryFile =
        toml::from_str(text).map_err(|err| Error::RegistryConfig(err.to_string()))?;

    let mut registry = LibraryRegistry::new();
    for (name, entry) in parsed.libraries {
        registry.insert(
            name,
            LibraryEntry {
                components: entry.components,
                constraints: entry.constraints,
                motions: entry.motions,
            },
        );
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl_validate::schema::NodeKind;

    #[test]
    fn parses_a_single_extension_library() {
        let toml_text = r#"
            [libraries.advanced_physics]
            components = ["turbine"]
            motions = ["oscillation"]
        "#;
        let registry = load_library_registry_str(toml_text).unwrap();
        assert!(registry.contains("advanced_physics"));
        assert_eq!(
            registry.providers(NodeKind::Component, "turbine"),
            vec!["advanced_physics"]
        );
    }

    #[test]
    fn malformed_toml_is_a_registry_config_error() {
        let err = load_library_registry_str("not valid toml [[[").unwrap_err();
        assert!(matches!(err, Error::RegistryConfig(_)));
    }
}
