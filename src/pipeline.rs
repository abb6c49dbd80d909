//! End-to-end flattening: version override, dereferencing, pruning.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::DerefError;
use crate::loader::load_document;
use crate::options::DerefOptions;
use crate::prune::prune_unused_components;
use crate::resolver::Dereferencer;
use crate::types::{json_type_name, DerefStats};
use crate::uri::location_from_path;

/// Root key holding the OpenAPI version string.
const OPENAPI_KEY: &str = "openapi";

/// Result of flattening a document.
#[derive(Debug, Clone, Serialize)]
pub struct DerefOutput {
    pub document: Value,
    pub stats: DerefStats,
    pub warnings: Vec<String>,
    /// Removed component entries per bucket (non-zero counts only).
    pub pruned: BTreeMap<String, usize>,
}

impl DerefOutput {
    /// Total number of pruned component entries.
    pub fn pruned_total(&self) -> usize {
        self.pruned.values().sum()
    }

    /// Human-readable summary of stats, pruning and warnings.
    pub fn summary(&self, pruning: bool) -> String {
        let mut out = format!(
            "Stats: resolved={}, circular={}, unresolved={}\n",
            self.stats.resolved, self.stats.circular, self.stats.unresolved
        );
        if pruning {
            out.push_str(&format!("Pruned unused components: {}\n", self.pruned_total()));
            for (section, count) in &self.pruned {
                out.push_str(&format!("  - {}: {}\n", section, count));
            }
        }
        if !self.warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in &self.warnings {
                out.push_str(&format!("  - {}\n", warning));
            }
        }
        out
    }
}

/// Replace the root `openapi` string with `version`, if both are present.
pub fn coerce_openapi_version(doc: &mut Value, version: Option<&str>) {
    let Some(version) = version else {
        return;
    };
    match doc.get_mut(OPENAPI_KEY) {
        Some(current) if current.is_string() => {
            tracing::debug!(from = %current, to = version, "overriding openapi version");
            *current = Value::String(version.to_string());
        }
        _ => {}
    }
}

/// Flatten an already loaded document located at `root_location`.
///
/// # Errors
///
/// Returns `DerefError::InvalidRoot` if the document isn't a mapping.
/// Individual bad references are never errors; they are reported as warnings.
pub fn dereference_document(
    mut doc: Value,
    root_location: Url,
    options: &DerefOptions,
) -> Result<DerefOutput, DerefError> {
    if !doc.is_object() {
        return Err(DerefError::InvalidRoot {
            actual: json_type_name(&doc).to_string(),
        });
    }

    coerce_openapi_version(&mut doc, options.openapi_version.as_deref());

    let mut deref = Dereferencer::new(doc, root_location.clone(), options);
    let mut document = deref.dereference();
    let stats = deref.stats();
    let warnings = deref.into_warnings();

    let pruned = if options.prune_unused_components {
        prune_unused_components(&mut document, &root_location, &options.component_sections)
    } else {
        BTreeMap::new()
    };

    tracing::info!(
        resolved = stats.resolved,
        circular = stats.circular,
        unresolved = stats.unresolved,
        pruned = pruned.values().sum::<usize>(),
        "flattened {}",
        root_location
    );

    Ok(DerefOutput {
        document,
        stats,
        warnings,
        pruned,
    })
}

/// Load the document at `path` and flatten it.
///
/// # Errors
///
/// Returns `DerefError` if the input can't be read or parsed at all.
pub fn dereference_file(path: &Path, options: &DerefOptions) -> Result<DerefOutput, DerefError> {
    let doc = load_document(path)?;
    let root_location = location_from_path(path)?;
    dereference_document(doc, root_location, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root_location() -> Url {
        Url::parse("file:///specs/openapi.yaml").unwrap()
    }

    #[test]
    fn version_override() {
        let mut doc = json!({ "openapi": "3.1.0" });
        coerce_openapi_version(&mut doc, Some("3.0.0"));
        assert_eq!(doc["openapi"], "3.0.0");
    }

    #[test]
    fn version_override_skips_missing_or_non_string() {
        let mut doc = json!({ "swagger": "2.0" });
        coerce_openapi_version(&mut doc, Some("3.0.0"));
        assert_eq!(doc, json!({ "swagger": "2.0" }));

        let mut doc = json!({ "openapi": 3 });
        coerce_openapi_version(&mut doc, Some("3.0.0"));
        assert_eq!(doc["openapi"], 3);

        let mut doc = json!({ "openapi": "3.1.0" });
        coerce_openapi_version(&mut doc, None);
        assert_eq!(doc["openapi"], "3.1.0");
    }

    #[test]
    fn non_mapping_root_is_fatal() {
        let result = dereference_document(json!([1, 2]), root_location(), &DerefOptions::new());
        assert!(matches!(result, Err(DerefError::InvalidRoot { .. })));
    }

    #[test]
    fn pruning_can_be_disabled() {
        let doc = json!({ "components": { "schemas": { "Unused": { "type": "string" } } } });
        let options = DerefOptions::new().prune_unused_components(false);
        let out = dereference_document(doc.clone(), root_location(), &options).unwrap();
        assert_eq!(out.document, doc);
        assert!(out.pruned.is_empty());
    }

    #[test]
    fn summary_lists_counts_and_warnings() {
        let out = DerefOutput {
            document: json!({}),
            stats: DerefStats {
                resolved: 3,
                circular: 1,
                unresolved: 1,
            },
            warnings: vec!["Failed to resolve $ref \"#/x\"".to_string()],
            pruned: BTreeMap::from([("schemas".to_string(), 2), ("headers".to_string(), 1)]),
        };
        let summary = out.summary(true);
        assert!(summary.contains("Stats: resolved=3, circular=1, unresolved=1"));
        assert!(summary.contains("Pruned unused components: 3"));
        let headers = summary.find("  - headers: 1").unwrap();
        let schemas = summary.find("  - schemas: 2").unwrap();
        assert!(headers < schemas);
        assert!(summary.contains("Warnings:"));

        assert!(!out.summary(false).contains("Pruned"));
    }
}
