//! Core types for reference resolution and component pruning.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Key holding the reference string of a reference node.
pub const REF_KEY: &str = "$ref";

/// Provenance key prepended to inlined objects.
pub const RESOLVED_FROM_KEY: &str = "x-resolved-from";

/// Marker set on circular-reference placeholders.
pub const CIRCULAR_REF_KEY: &str = "x-circular-ref";

/// The only list key unioned (instead of replaced) by overlay merges.
pub const REQUIRED_KEY: &str = "required";

/// Prefix of vendor-extension keys.
pub const VENDOR_PREFIX: &str = "x-";

/// Reusable-definitions root of an OpenAPI document.
pub const COMPONENTS_KEY: &str = "components";

/// Bucket named by security requirements.
pub const SECURITY_SCHEMES: &str = "securitySchemes";

/// Bucket named by bare discriminator mapping values.
pub const SCHEMAS: &str = "schemas";

/// Component buckets considered for pruning by default.
pub const DEFAULT_COMPONENT_SECTIONS: &[&str] = &[
    "schemas",
    "responses",
    "parameters",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
    "pathItems",
];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns true for keys reserved for vendor extensions (`x-*`).
pub fn is_vendor_extension(key: &str) -> bool {
    key.starts_with(VENDOR_PREFIX)
}

/// Absolute identity of a resolvable target: document location plus fragment.
///
/// Two reference strings that normalize to the same key name the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceKey {
    pub location: Url,
    /// Fragment including its leading `#`, or empty.
    pub fragment: String,
}

impl ReferenceKey {
    pub fn new(location: Url, fragment: impl Into<String>) -> Self {
        Self {
            location,
            fragment: fragment.into(),
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.location, self.fragment)
    }
}

/// A named reusable definition, e.g. `(schemas, Widget)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentRoot {
    pub section: String,
    pub name: String,
}

impl ComponentRoot {
    pub fn new(section: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ComponentRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.section, self.name)
    }
}

/// Counters for reference nodes seen during dereferencing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DerefStats {
    /// References replaced by their target content.
    pub resolved: usize,
    /// Revisits of a reference already being expanded.
    pub circular: usize,
    /// References left in place because loading or lookup failed.
    pub unresolved: usize,
}
