use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;

use super::loader::{classify_raw, ClassifiedContent};
use super::model::RawContent;

// ---------------------------------------------------------------------------
// Resolver contract
// ---------------------------------------------------------------------------

/// What the upstream configuration graph knows about a named data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    /// Source type; only `"file"` sources can be loaded.
    pub kind: String,
    pub source_path: String,
    pub aliases: Option<String>,
}

impl SourceDescriptor {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// Resolves a data source name to its descriptor.
pub trait SourceResolver {
    fn resolve(&self, name: &str) -> Option<SourceDescriptor>;
}

// ---------------------------------------------------------------------------
// Graph resolver – diagram JSON with a `nodes` array
// ---------------------------------------------------------------------------

/// Expected JSON layout:
///
/// ```json
/// {
///   "nodes": [
///     {
///       "name": "training_data",
///       "type": "file",
///       "importPath": { "module": "data/train.csv", "aliases": "train_data" }
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphResolver {
    #[serde(default)]
    nodes: Vec<GraphNode>,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphNode {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(rename = "importPath", default)]
    import_path: ImportPath,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ImportPath {
    #[serde(default)]
    module: String,
    #[serde(default)]
    aliases: Option<String>,
}

impl GraphResolver {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing diagram JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading diagram file {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SourceResolver for GraphResolver {
    /// First node whose name matches, falling back to the first alias match.
    fn resolve(&self, name: &str) -> Option<SourceDescriptor> {
        let node = self
            .nodes
            .iter()
            .find(|n| n.name == name)
            .or_else(|| {
                self.nodes
                    .iter()
                    .find(|n| n.import_path.aliases.as_deref() == Some(name))
            })?;

        Some(SourceDescriptor {
            name: node.name.clone(),
            kind: node.kind.clone(),
            source_path: node.import_path.module.clone(),
            aliases: node.import_path.aliases.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Resolve `name`, read its file relative to `base_dir` and classify it.
///
/// Returns `Ok(None)` when the source is unusable (unknown name, not a file
/// source, or no path); I/O failures on a usable source are errors.
pub fn load_source(
    resolver: &dyn SourceResolver,
    name: &str,
    base_dir: &Path,
) -> Result<Option<ClassifiedContent>> {
    let Some(descriptor) = resolver.resolve(name) else {
        warn!("data source '{name}' is not known to the resolver");
        return Ok(None);
    };

    if !descriptor.is_file() || descriptor.source_path.is_empty() {
        warn!(
            "data source '{name}' has type '{}' and path '{}', not loadable",
            descriptor.kind, descriptor.source_path
        );
        return Ok(None);
    }

    let path = base_dir.join(&descriptor.source_path);
    let raw = RawContent::from_file(&path)
        .with_context(|| format!("reading data source '{name}' from {}", path.display()))?;
    let classified = classify_raw(&raw);
    debug!("loaded '{name}' from {}: {}", path.display(), classified.kind());

    Ok(Some(classified))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAGRAM: &str = r#"{
        "nodes": [
            {"id": "n0", "name": "notes", "type": "text"},
            {"id": "n1", "name": "sample_data", "type": "file",
             "importPath": {"module": "data/sample.csv", "aliases": "train"}},
            {"id": "n2", "name": "sample_data", "type": "file",
             "importPath": {"module": "data/other.csv"}}
        ]
    }"#;

    #[test]
    fn resolves_first_match_by_name_or_alias() {
        let resolver = GraphResolver::from_json(DIAGRAM).unwrap();
        assert_eq!(resolver.len(), 3);

        let by_name = resolver.resolve("sample_data").unwrap();
        assert_eq!(by_name.source_path, "data/sample.csv");
        assert!(by_name.is_file());

        let by_alias = resolver.resolve("train").unwrap();
        assert_eq!(by_alias.name, "sample_data");
        assert!(resolver.resolve("nope").is_none());
    }

    #[test]
    fn non_file_sources_are_unusable() {
        let resolver = GraphResolver::from_json(DIAGRAM).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(load_source(&resolver, "notes", dir.path()).unwrap().is_none());
        assert!(load_source(&resolver, "missing", dir.path()).unwrap().is_none());
    }

    #[test]
    fn file_sources_are_read_and_classified() {
        let resolver = GraphResolver::from_json(DIAGRAM).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/sample.csv"), "a,b\n1,2\n3,4\n").unwrap();

        let loaded = load_source(&resolver, "train", dir.path()).unwrap().unwrap();
        assert_eq!(loaded.kind(), "tabular");
    }

    #[test]
    fn missing_file_is_an_error() {
        let resolver = GraphResolver::from_json(DIAGRAM).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = load_source(&resolver, "sample_data", dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("sample_data"));
    }
}
