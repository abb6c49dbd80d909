//! Pruning of unused `components` entries after dereferencing.
//!
//! Once every resolvable `$ref` has been inlined, a component is still
//! needed only if something names it:
//! - a remaining `$ref` (circular placeholders, unresolved refs)
//! - a `discriminator.mapping` value (pointer or bare schema name)
//! - a `security` requirement (security scheme name)
//!
//! Vendor extension keys (`x-*`) are always kept.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use url::Url;

use crate::pointer::parse_component_pointer;
use crate::types::{
    is_vendor_extension, ComponentRoot, COMPONENTS_KEY, SCHEMAS, SECURITY_SCHEMES,
};
use crate::uri::{normalize_ref, ref_string};

/// Components still reachable in a dereferenced document.
pub type UsedSet = HashSet<ComponentRoot>;

/// Scan a dereferenced document for the component roots it still names.
///
/// `root_location` is the location of the document itself; only refs into
/// that document can keep its components alive.
pub fn collect_used_components(doc: &Value, root_location: &Url) -> UsedSet {
    let mut used = UsedSet::new();
    collect(doc, root_location, &mut used);
    used
}

fn collect(node: &Value, root_location: &Url, used: &mut UsedSet) {
    match node {
        Value::Object(map) => {
            if let Some(reference) = ref_string(node) {
                if let Some(root) = local_component(reference, root_location) {
                    used.insert(root);
                }
            }

            if let Some(Value::Array(requirements)) = map.get("security") {
                collect_security(requirements, used);
            }

            if let Some(mapping) = map
                .get("discriminator")
                .and_then(|d| d.get("mapping"))
                .and_then(Value::as_object)
            {
                collect_discriminator(mapping, root_location, used);
            }

            for value in map.values() {
                collect(value, root_location, used);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, root_location, used);
            }
        }
        _ => {}
    }
}

/// Security requirements name schemes by key: `[{ apiKey: [] }]`.
fn collect_security(requirements: &[Value], used: &mut UsedSet) {
    for requirement in requirements.iter().filter_map(Value::as_object) {
        for scheme in requirement.keys().filter(|name| !name.is_empty()) {
            used.insert(ComponentRoot::new(SECURITY_SCHEMES, scheme.as_str()));
        }
    }
}

/// Mapping values are either pointers or, in OAS 3.0 style, bare schema names.
fn collect_discriminator(mapping: &Map<String, Value>, root_location: &Url, used: &mut UsedSet) {
    for value in mapping.values().filter_map(Value::as_str) {
        if value.is_empty() {
            continue;
        }
        if let Some(root) = local_component(value, root_location) {
            used.insert(root);
        } else if !value.contains('/') && !value.contains('#') {
            used.insert(ComponentRoot::new(SCHEMAS, value));
        }
    }
}

fn local_component(reference: &str, root_location: &Url) -> Option<ComponentRoot> {
    let key = normalize_ref(reference, root_location).ok()?;
    if &key.location != root_location {
        return None;
    }
    parse_component_pointer(&key.fragment)
}

/// Remove `components` entries the document no longer uses.
///
/// Only buckets listed in `sections` are pruned; `x-*` entries survive,
/// empty buckets are dropped, and `components` itself is removed once empty.
/// Returns the number of removed entries per bucket (non-zero counts only).
pub fn prune_unused_components(
    doc: &mut Value,
    root_location: &Url,
    sections: &[String],
) -> BTreeMap<String, usize> {
    let mut removed = BTreeMap::new();

    if !doc.get(COMPONENTS_KEY).is_some_and(Value::is_object) {
        return removed;
    }
    let used = collect_used_components(doc, root_location);

    let Some(Value::Object(components)) = doc.get_mut(COMPONENTS_KEY) else {
        return removed;
    };

    let bucket_names: Vec<String> = components
        .keys()
        .filter(|name| !is_vendor_extension(name) && sections.contains(name))
        .cloned()
        .collect();

    for section in bucket_names {
        let drop_bucket = match components.get_mut(&section) {
            Some(Value::Object(bucket)) => {
                let unused: Vec<String> = bucket
                    .keys()
                    .filter(|name| {
                        !is_vendor_extension(name)
                            && !used.contains(&ComponentRoot::new(section.as_str(), name.as_str()))
                    })
                    .cloned()
                    .collect();
                for name in &unused {
                    bucket.shift_remove(name);
                    tracing::debug!(section = %section, name = %name, "pruned unused component");
                }
                if !unused.is_empty() {
                    removed.insert(section.clone(), unused.len());
                }
                bucket.is_empty()
            }
            // Non-mapping buckets are dropped only when empty
            Some(other) => is_empty_value(other),
            None => false,
        };
        if drop_bucket {
            components.shift_remove(&section);
        }
    }

    if components.is_empty() {
        if let Value::Object(root) = doc {
            root.shift_remove(COMPONENTS_KEY);
        }
    }

    removed
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root_location() -> Url {
        Url::parse("file:///specs/openapi.yaml").unwrap()
    }

    fn sections() -> Vec<String> {
        crate::types::DEFAULT_COMPONENT_SECTIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn used(doc: &Value) -> UsedSet {
        collect_used_components(doc, &root_location())
    }

    #[test]
    fn remaining_refs_are_used() {
        let doc = json!({
            "a": { "$ref": "#/components/schemas/Node", "x-circular-ref": true },
            "b": { "$ref": "#/components/parameters/limit/schema" },
            "c": { "$ref": "other.yaml#/components/schemas/Remote" },
            "d": { "$ref": "#/paths/~1pets" }
        });
        let used = used(&doc);
        assert_eq!(used.len(), 2);
        assert!(used.contains(&ComponentRoot::new("schemas", "Node")));
        assert!(used.contains(&ComponentRoot::new("parameters", "limit")));
    }

    #[test]
    fn self_document_refs_by_file_name_are_used() {
        let doc = json!({ "a": { "$ref": "openapi.yaml#/components/schemas/Pet" } });
        assert!(used(&doc).contains(&ComponentRoot::new("schemas", "Pet")));
    }

    #[test]
    fn security_requirements_are_used() {
        let doc = json!({
            "security": [{ "apiKey": [] }, { "oauth": ["read"], "": [] }],
            "paths": { "/pets": { "get": { "security": [{ "basic": [] }] } } }
        });
        let used = used(&doc);
        assert_eq!(used.len(), 3);
        assert!(used.contains(&ComponentRoot::new("securitySchemes", "apiKey")));
        assert!(used.contains(&ComponentRoot::new("securitySchemes", "oauth")));
        assert!(used.contains(&ComponentRoot::new("securitySchemes", "basic")));
    }

    #[test]
    fn discriminator_mappings_are_used() {
        let doc = json!({
            "discriminator": {
                "propertyName": "kind",
                "mapping": {
                    "dog": "#/components/schemas/Dog",
                    "cat": "Cat",
                    "bird": "birds.yaml#/Bird",
                    "fish": "./fish"
                }
            }
        });
        let used = used(&doc);
        assert_eq!(used.len(), 2);
        assert!(used.contains(&ComponentRoot::new("schemas", "Dog")));
        assert!(used.contains(&ComponentRoot::new("schemas", "Cat")));
    }

    #[test]
    fn prunes_unused_and_keeps_extensions() {
        let mut doc = json!({
            "paths": { "/a": { "$ref": "#/components/pathItems/A" } },
            "components": {
                "schemas": { "Unused": {}, "x-note": "keep" },
                "pathItems": { "A": {}, "B": {} },
                "parameters": { "gone": {} },
                "x-meta": { "owner": "team" },
                "custom": { "Anything": {} }
            }
        });
        let removed = prune_unused_components(&mut doc, &root_location(), &sections());

        assert_eq!(
            doc["components"],
            json!({
                "schemas": { "x-note": "keep" },
                "pathItems": { "A": {} },
                "x-meta": { "owner": "team" },
                "custom": { "Anything": {} }
            })
        );
        assert_eq!(removed.get("schemas"), Some(&1));
        assert_eq!(removed.get("pathItems"), Some(&1));
        assert_eq!(removed.get("parameters"), Some(&1));
        assert_eq!(removed.get("headers"), None);
    }

    #[test]
    fn empty_components_are_removed() {
        let mut doc = json!({
            "openapi": "3.0.0",
            "components": { "schemas": { "A": {} }, "headers": null }
        });
        prune_unused_components(&mut doc, &root_location(), &sections());
        assert_eq!(doc, json!({ "openapi": "3.0.0" }));
    }

    #[test]
    fn extension_only_components_are_kept() {
        let mut doc = json!({ "components": { "schemas": { "A": {} }, "x-meta": 1 } });
        prune_unused_components(&mut doc, &root_location(), &sections());
        assert_eq!(doc, json!({ "components": { "x-meta": 1 } }));
    }

    #[test]
    fn non_empty_non_mapping_buckets_are_kept() {
        let mut doc = json!({ "components": { "schemas": "odd", "links": [] } });
        let removed = prune_unused_components(&mut doc, &root_location(), &sections());
        assert_eq!(doc, json!({ "components": { "schemas": "odd" } }));
        assert!(removed.is_empty());
    }

    #[test]
    fn only_configured_sections_are_pruned() {
        let mut doc = json!({ "components": { "schemas": { "A": {} }, "headers": { "H": {} } } });
        let only_headers = vec!["headers".to_string()];
        prune_unused_components(&mut doc, &root_location(), &only_headers);
        assert_eq!(doc, json!({ "components": { "schemas": { "A": {} } } }));
    }

    #[test]
    fn pruning_is_idempotent() {
        let mut doc = json!({
            "security": [{ "apiKey": [] }],
            "x": { "$ref": "#/components/schemas/Loop", "x-circular-ref": true },
            "components": {
                "schemas": { "Loop": {}, "Unused": {} },
                "securitySchemes": { "apiKey": {}, "basic": {} }
            }
        });
        let first = prune_unused_components(&mut doc, &root_location(), &sections());
        assert_eq!(first.values().sum::<usize>(), 2);
        let snapshot = doc.clone();
        let second = prune_unused_components(&mut doc, &root_location(), &sections());
        assert!(second.is_empty());
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn documents_without_components_are_untouched() {
        let mut doc = json!({ "openapi": "3.0.0" });
        assert!(prune_unused_components(&mut doc, &root_location(), &sections()).is_empty());
        assert_eq!(doc, json!({ "openapi": "3.0.0" }));
    }
}
