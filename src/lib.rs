//! OpenAPI Dereferencer
//!
//! Flattens an OpenAPI (or JSON-Schema-like) document by replacing every
//! `$ref` with the content it points to, producing a single self-contained
//! tree, then prunes `components` entries that nothing uses anymore.
//!
//! # Example
//!
//! ```
//! use openapi_deref::{dereference_document, DerefOptions};
//! use serde_json::json;
//! use url::Url;
//!
//! let doc = json!({
//!     "openapi": "3.0.0",
//!     "paths": {
//!         "/pets": {
//!             "get": {
//!                 "responses": {
//!                     "200": { "$ref": "#/components/responses/PetList" }
//!                 }
//!             }
//!         }
//!     },
//!     "components": {
//!         "responses": { "PetList": { "description": "A list of pets" } },
//!         "schemas": { "Unused": { "type": "string" } }
//!     }
//! });
//!
//! let location = Url::parse("file:///specs/openapi.yaml").unwrap();
//! let out = dereference_document(doc, location, &DerefOptions::new()).unwrap();
//!
//! let ok = &out.document["paths"]["/pets"]["get"]["responses"]["200"];
//! assert_eq!(ok["description"], "A list of pets");
//! assert_eq!(ok["x-resolved-from"], "#/components/responses/PetList");
//! // Everything was inlined, so `components` is gone
//! assert!(out.document.get("components").is_none());
//! assert_eq!(out.stats.resolved, 1);
//! ```
//!
//! # Reference Handling
//!
//! | Situation | Output |
//! |-----------|--------|
//! | Resolvable `$ref` | Target content, prefixed with `x-resolved-from` |
//! | `$ref` with sibling keys | Target deep-merged with the siblings (siblings win, `required` unioned) |
//! | `$ref` revisiting itself | `{ $ref, x-circular-ref: true }` placeholder |
//! | Missing file, bad pointer, depth limit | `$ref` left as-is, warning recorded |
//!
//! # Pruning
//!
//! After dereferencing, a component is kept if it is still named by a
//! remaining `$ref`, a `discriminator.mapping` value, or a `security`
//! requirement. `x-*` entries are always kept.

mod error;
mod format;
mod loader;
mod merge;
mod options;
mod pipeline;
mod pointer;
mod prune;
mod resolver;
mod types;
mod uri;

pub use error::{DerefError, FormatError, LoadError, PointerError, ResolveError};
pub use format::{parse_document, render_document, DocumentFormat};
pub use loader::{load_document, load_document_str, DocumentLoader, RemoteFetcher};
pub use merge::deep_merge;
pub use options::{DerefConfig, DerefOptions, DEFAULT_MAX_RESOLUTION_DEPTH};
pub use pipeline::{coerce_openapi_version, dereference_document, dereference_file, DerefOutput};
pub use pointer::{decode_token, parse_component_pointer, pointer_get};
pub use prune::{collect_used_components, prune_unused_components, UsedSet};
pub use resolver::{circular_placeholder, Dereferencer};
pub use types::{ComponentRoot, DerefStats, ReferenceKey, DEFAULT_COMPONENT_SECTIONS};
pub use uri::{is_ref_node, location_from_path, location_to_path, normalize_ref, ref_string};

#[cfg(feature = "remote")]
pub use loader::HttpFetcher;
