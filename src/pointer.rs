//! JSON Pointer (RFC 6901) navigation over document trees.

use serde_json::Value;

use crate::error::PointerError;
use crate::types::{json_type_name, ComponentRoot, COMPONENTS_KEY};

/// Decode a single pointer token (`~1` = `/`, `~0` = `~`).
pub fn decode_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Navigate a JSON Pointer fragment (e.g., `#/components/schemas/Pet`).
///
/// Accepts a leading `#`. An empty fragment or a bare `#` returns `doc` itself.
///
/// # Errors
///
/// Returns `PointerError` if a key is missing, an index is invalid or out of
/// range, or the pointer tries to step into a scalar.
pub fn pointer_get<'a>(doc: &'a Value, fragment: &str) -> Result<&'a Value, PointerError> {
    if fragment.is_empty() || fragment == "#" {
        return Ok(doc);
    }
    let pointer = fragment.strip_prefix('#').unwrap_or(fragment);
    let Some(path) = pointer.strip_prefix('/') else {
        return Err(PointerError::InvalidPointer {
            pointer: pointer.to_string(),
        });
    };

    let mut current = doc;
    for raw in path.split('/') {
        let token = decode_token(raw);
        current = match current {
            Value::Object(map) => map.get(&token).ok_or_else(|| PointerError::NotFound {
                token: token.clone(),
                pointer: pointer.to_string(),
            })?,
            Value::Array(items) => {
                let index = parse_index(&token)?;
                items.get(index).ok_or(PointerError::IndexOutOfRange {
                    index,
                    len: items.len(),
                })?
            }
            scalar => {
                return Err(PointerError::NotTraversable {
                    token,
                    actual: json_type_name(scalar).to_string(),
                })
            }
        };
    }
    Ok(current)
}

/// Array index tokens must be plain non-negative integers; `-` is not supported.
fn parse_index(token: &str) -> Result<usize, PointerError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PointerError::InvalidIndex {
            token: token.to_string(),
        });
    }
    token.parse().map_err(|_| PointerError::InvalidIndex {
        token: token.to_string(),
    })
}

/// Map a fragment like `#/components/schemas/Foo/properties/bar` to its
/// component root `(schemas, Foo)`.
///
/// Returns `None` for fragments outside `components` or without an item name.
pub fn parse_component_pointer(fragment: &str) -> Option<ComponentRoot> {
    let path = fragment.strip_prefix("#/")?;
    let mut tokens = path.split('/').map(decode_token);
    if tokens.next()? != COMPONENTS_KEY {
        return None;
    }
    let section = tokens.next()?;
    let name = tokens.next()?;
    Some(ComponentRoot::new(section, name))
}
