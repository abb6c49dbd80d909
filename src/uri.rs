//! Reference normalization against document locations.

use std::path::{Path, PathBuf};

use serde_json::Value;
use url::Url;

use crate::error::{DerefError, ResolveError};
use crate::types::{ReferenceKey, REF_KEY};

/// Returns the reference string if `node` is a mapping with a string `$ref`.
pub fn ref_string(node: &Value) -> Option<&str> {
    node.as_object()?.get(REF_KEY)?.as_str()
}

/// Returns true if `node` is a reference node.
pub fn is_ref_node(node: &Value) -> bool {
    ref_string(node).is_some()
}

/// Normalize a `$ref` against the location of the document containing it.
///
/// The fragment keeps its leading `#` (or is empty when the ref has none).
/// An empty location part means "same document as `base`".
///
/// # Errors
///
/// Returns `ResolveError::InvalidReference` if the location part cannot be
/// joined onto `base`.
pub fn normalize_ref(reference: &str, base: &Url) -> Result<ReferenceKey, ResolveError> {
    let (resource, fragment) = match reference.find('#') {
        Some(idx) => (&reference[..idx], &reference[idx..]),
        None => (reference, ""),
    };

    if resource.is_empty() {
        return Ok(ReferenceKey::new(without_fragment(base), fragment));
    }

    let location = base
        .join(resource)
        .map_err(|source| ResolveError::InvalidReference {
            reference: reference.to_string(),
            base: base.clone(),
            source,
        })?;
    Ok(ReferenceKey::new(without_fragment(&location), fragment))
}

fn without_fragment(location: &Url) -> Url {
    let mut location = location.clone();
    location.set_fragment(None);
    location
}

/// Convert a filesystem path (relative paths are taken from the current
/// directory) into an absolute `file://` location.
///
/// # Errors
///
/// Returns `DerefError::InvalidPath` if the path cannot be made absolute.
pub fn location_from_path(path: &Path) -> Result<Url, DerefError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|_| DerefError::InvalidPath {
                path: path.to_path_buf(),
            })?
            .join(path)
    };
    Url::from_file_path(&absolute).map_err(|()| DerefError::InvalidPath {
        path: path.to_path_buf(),
    })
}

/// Convert a `file://` location back into a filesystem path.
pub fn location_to_path(location: &Url) -> Option<PathBuf> {
    if location.scheme() != "file" {
        return None;
    }
    location.to_file_path().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("file:///specs/api/openapi.yaml").unwrap()
    }

    #[test]
    fn empty_ref_is_base_document() {
        let key = normalize_ref("", &base()).unwrap();
        assert_eq!(key, ReferenceKey::new(base(), ""));
    }

    #[test]
    fn local_fragment_stays_in_base_document() {
        let key = normalize_ref("#/components/schemas/Pet", &base()).unwrap();
        assert_eq!(key.location, base());
        assert_eq!(key.fragment, "#/components/schemas/Pet");
    }

    #[test]
    fn relative_file_resolves_against_base() {
        let key = normalize_ref("../common/types.yaml#/Money", &base()).unwrap();
        assert_eq!(key.location.as_str(), "file:///specs/common/types.yaml");
        assert_eq!(key.fragment, "#/Money");
    }

    #[test]
    fn whole_document_ref_has_empty_fragment() {
        let key = normalize_ref("pet.yaml", &base()).unwrap();
        assert_eq!(key.location.as_str(), "file:///specs/api/pet.yaml");
        assert_eq!(key.fragment, "");
    }

    #[test]
    fn equivalent_refs_share_a_key() {
        let a = normalize_ref("#/components/schemas/Pet", &base()).unwrap();
        let b = normalize_ref("./openapi.yaml#/components/schemas/Pet", &base()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn absolute_urls_replace_base() {
        let key = normalize_ref("https://example.com/schemas.yaml#/Error", &base()).unwrap();
        assert_eq!(key.location.as_str(), "https://example.com/schemas.yaml");
        assert_eq!(key.fragment, "#/Error");
    }

    #[test]
    fn ref_node_detection() {
        assert!(is_ref_node(&json!({ "$ref": "#/a" })));
        assert!(is_ref_node(&json!({ "$ref": "#/a", "description": "x" })));
        assert!(!is_ref_node(&json!({ "$ref": 42 })));
        assert!(!is_ref_node(&json!(["$ref"])));
        assert!(!is_ref_node(&json!({ "type": "string" })));
    }

    #[test]
    fn file_locations_round_trip() {
        let location = location_from_path(Path::new("/tmp/openapi.yaml")).unwrap();
        assert_eq!(location.as_str(), "file:///tmp/openapi.yaml");
        assert_eq!(
            location_to_path(&location),
            Some(PathBuf::from("/tmp/openapi.yaml"))
        );
        let remote = Url::parse("https://example.com/openapi.yaml").unwrap();
        assert_eq!(location_to_path(&remote), None);
    }
}
