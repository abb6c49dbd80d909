//! Document parsing and emission (YAML or JSON).

use std::path::Path;

use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use crate::error::FormatError;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from a file extension (`.json` is JSON, anything else YAML).
    pub fn from_extension(name: &str) -> Self {
        let is_json = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            DocumentFormat::Json
        } else {
            DocumentFormat::Yaml
        }
    }

    /// Parse a format name as given on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// Parse document text into a tree. Callers attach the location to the error.
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<Value, FormatError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(content)?),
        DocumentFormat::Yaml => yaml_to_node(serde_yaml::from_str(content)?),
    }
}

/// Render a tree as document text. JSON output is pretty-printed.
pub fn render_document(doc: &Value, format: DocumentFormat) -> Result<String, FormatError> {
    Ok(match format {
        DocumentFormat::Json => serde_json::to_string_pretty(doc)?,
        DocumentFormat::Yaml => serde_yaml::to_string(doc)?,
    })
}

/// Convert a YAML value into a JSON-model node.
///
/// Mapping keys that are not strings are stringified (`200:` becomes `"200"`),
/// tags are dropped.
pub fn yaml_to_node(value: YamlValue) -> Result<Value, FormatError> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => yaml_number(&n)?,
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_node)
                .collect::<Result<_, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_node(value)?);
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => yaml_to_node(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value, FormatError> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Number(i.into()))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::Number(u.into()))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| FormatError::UnsupportedNumber(n.to_string()))
    }
}

fn yaml_key(key: YamlValue) -> Result<String, FormatError> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(FormatError::UnsupportedKey(format!("{:?}", other))),
    }
}
