//! Reference resolution - replaces every `$ref` with the content it points to.
//!
//! Resolution is a recursive descent carrying the base location of the
//! document being walked and the stack of references currently being
//! expanded. A reference whose key is already on the stack is circular and
//! becomes a placeholder instead of being expanded again.
//!
//! Resolved targets are cached only for clean expansions: no sibling keys
//! next to the `$ref` and an empty stack. Anything else may depend on the
//! call path (cycle cut points) or on the overlay, so it is recomputed.

use std::collections::HashMap;

use serde_json::{Map, Value};
use url::Url;

use crate::error::ResolveError;
use crate::loader::{DocumentLoader, RemoteFetcher};
use crate::merge::deep_merge;
use crate::options::DerefOptions;
use crate::pointer::pointer_get;
use crate::types::{DerefStats, ReferenceKey, CIRCULAR_REF_KEY, REF_KEY, RESOLVED_FROM_KEY};
use crate::uri::{normalize_ref, ref_string};

/// Placeholder emitted where a reference chain revisits itself.
pub fn circular_placeholder(reference: &str) -> Value {
    let mut map = Map::new();
    map.insert(REF_KEY.to_string(), Value::String(reference.to_string()));
    map.insert(CIRCULAR_REF_KEY.to_string(), Value::Bool(true));
    Value::Object(map)
}

/// Recursively dereferences a document.
pub struct Dereferencer {
    loader: DocumentLoader,
    add_resolved_from: bool,
    circular_placeholder: bool,
    merge_required_lists: bool,
    max_depth: usize,
    cache: HashMap<ReferenceKey, Value>,
    stats: DerefStats,
    warnings: Vec<String>,
}

impl Dereferencer {
    /// Create a dereferencer for `root`, located at `root_location`.
    pub fn new(root: Value, root_location: Url, options: &DerefOptions) -> Self {
        let loader = DocumentLoader::new(root, root_location, options);
        Self::with_loader(loader, options)
    }

    /// Create a dereferencer around an already configured loader.
    pub fn with_loader(loader: DocumentLoader, options: &DerefOptions) -> Self {
        Self {
            loader,
            add_resolved_from: options.add_resolved_from,
            circular_placeholder: options.circular_placeholder,
            merge_required_lists: options.merge_required_lists,
            max_depth: options.max_resolution_depth,
            cache: HashMap::new(),
            stats: DerefStats::default(),
            warnings: Vec::new(),
        }
    }

    /// Replace the loader's remote fetch strategy.
    pub fn with_remote_fetcher(mut self, fetcher: Box<dyn RemoteFetcher>) -> Self {
        self.loader = self.loader.with_remote_fetcher(fetcher);
        self
    }

    /// Return a dereferenced copy of the root document.
    pub fn dereference(&mut self) -> Value {
        let root_location = self.loader.root_location().clone();
        let root = self.loader.root().clone();
        let mut stack = Vec::new();
        let resolved = self.resolve_node(&root, &root_location, &mut stack);
        tracing::debug!(
            resolved = self.stats.resolved,
            circular = self.stats.circular,
            unresolved = self.stats.unresolved,
            "dereferenced {}",
            root_location
        );
        resolved
    }

    pub fn stats(&self) -> DerefStats {
        self.stats
    }

    /// Warnings recorded so far, in the order they occurred.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn resolve_node(&mut self, node: &Value, base: &Url, stack: &mut Vec<ReferenceKey>) -> Value {
        match node {
            Value::Object(map) => {
                if let Some(reference) = ref_string(node) {
                    return self.resolve_ref(map, reference, base, stack);
                }
                Value::Object(
                    map.iter()
                        .map(|(key, value)| (key.clone(), self.resolve_node(value, base, stack)))
                        .collect(),
                )
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_node(item, base, stack))
                    .collect(),
            ),
            // Primitives pass through unchanged
            other => other.clone(),
        }
    }

    fn resolve_ref(
        &mut self,
        node: &Map<String, Value>,
        reference: &str,
        base: &Url,
        stack: &mut Vec<ReferenceKey>,
    ) -> Value {
        let key = match normalize_ref(reference, base) {
            Ok(key) => key,
            Err(err) => return self.unresolved(node, reference, base, err),
        };

        if stack.contains(&key) {
            self.stats.circular += 1;
            tracing::debug!(%key, "circular $ref");
            if self.circular_placeholder {
                return circular_placeholder(reference);
            }
            return Value::Object(node.clone());
        }

        let overlay: Map<String, Value> = node
            .iter()
            .filter(|(k, _)| k.as_str() != REF_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let cache_allowed = overlay.is_empty() && stack.is_empty();
        if cache_allowed {
            if let Some(cached) = self.cache.get(&key) {
                let cached = cached.clone();
                tracing::trace!(%key, "$ref served from cache");
                return self.annotate(cached, reference);
            }
        }

        if stack.len() >= self.max_depth {
            let err = ResolveError::DepthExceeded {
                max_depth: self.max_depth,
            };
            return self.unresolved(node, reference, base, err);
        }

        let target = match self.lookup(&key) {
            Ok(target) => target,
            Err(err) => return self.unresolved(node, reference, base, err),
        };

        // Resolve the target with this ref on the stack, relative to its own document
        stack.push(key.clone());
        let mut resolved = self.resolve_node(&target, &key.location, stack);
        stack.pop();

        // Sibling keys are relative to the referencing document
        if !overlay.is_empty() {
            let overlay = self.resolve_node(&Value::Object(overlay), base, stack);
            resolved = deep_merge(resolved, &overlay, self.merge_required_lists);
        }

        if cache_allowed {
            self.cache.insert(key.clone(), resolved.clone());
        }

        tracing::trace!(%key, "resolved $ref");
        self.stats.resolved += 1;
        self.annotate(resolved, reference)
    }

    fn lookup(&mut self, key: &ReferenceKey) -> Result<Value, ResolveError> {
        let doc = self.loader.load(&key.location)?;
        Ok(pointer_get(doc, &key.fragment)?.clone())
    }

    /// Prepend `x-resolved-from` to inlined objects that don't carry one yet.
    fn annotate(&self, value: Value, reference: &str) -> Value {
        if !self.add_resolved_from {
            return value;
        }
        match value {
            Value::Object(map) if !map.contains_key(RESOLVED_FROM_KEY) => {
                let mut annotated = Map::with_capacity(map.len() + 1);
                annotated.insert(
                    RESOLVED_FROM_KEY.to_string(),
                    Value::String(reference.to_string()),
                );
                annotated.extend(map);
                Value::Object(annotated)
            }
            other => other,
        }
    }

    fn unresolved(
        &mut self,
        node: &Map<String, Value>,
        reference: &str,
        base: &Url,
        err: ResolveError,
    ) -> Value {
        self.stats.unresolved += 1;
        let warning = format!(
            "Failed to resolve $ref {:?} @ base {}: {}",
            reference, base, err
        );
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
        Value::Object(node.clone())
    }
}
