//! Dereferencing options and config file loading.
//!
//! Options can be built in code or read from a YAML/JSON config file:
//!
//! ```yaml
//! input: openai.yml
//! output: openai-openapi.deref.yml
//! openapi-version: 3.0.0
//! allow-http-fetch: false
//! max-resolution-depth: 512
//! component-sections: [schemas, parameters, securitySchemes]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DerefError, FormatError};
use crate::types::DEFAULT_COMPONENT_SECTIONS;

/// Default guardrail for pathological reference chains.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 512;

/// Options for dereferencing a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DerefOptions {
    /// Replacement for the root `openapi` version string, if any.
    pub openapi_version: Option<String>,
    /// Allow refs into documents other than the root.
    pub handle_external_refs: bool,
    /// Allow fetching `http(s)` documents. Requires `handle_external_refs`.
    pub allow_http_fetch: bool,
    /// Annotate inlined objects with `x-resolved-from`.
    pub add_resolved_from: bool,
    /// Replace circular refs with a `x-circular-ref` placeholder.
    pub circular_placeholder: bool,
    /// Union `required` lists when merging `$ref` siblings.
    pub merge_required_lists: bool,
    pub max_resolution_depth: usize,
    /// Remove unused `components` entries after dereferencing.
    pub prune_unused_components: bool,
    /// Component buckets eligible for pruning.
    pub component_sections: Vec<String>,
}

impl Default for DerefOptions {
    fn default() -> Self {
        Self {
            openapi_version: None,
            handle_external_refs: true,
            allow_http_fetch: false,
            add_resolved_from: true,
            circular_placeholder: true,
            merge_required_lists: true,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            prune_unused_components: true,
            component_sections: DEFAULT_COMPONENT_SECTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DerefOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the root `openapi` field with `version`.
    pub fn openapi_version(mut self, version: impl Into<String>) -> Self {
        self.openapi_version = Some(version.into());
        self
    }

    pub fn handle_external_refs(mut self, enabled: bool) -> Self {
        self.handle_external_refs = enabled;
        self
    }

    pub fn allow_http_fetch(mut self, enabled: bool) -> Self {
        self.allow_http_fetch = enabled;
        self
    }

    pub fn add_resolved_from(mut self, enabled: bool) -> Self {
        self.add_resolved_from = enabled;
        self
    }

    pub fn circular_placeholder(mut self, enabled: bool) -> Self {
        self.circular_placeholder = enabled;
        self
    }

    pub fn merge_required_lists(mut self, enabled: bool) -> Self {
        self.merge_required_lists = enabled;
        self
    }

    pub fn max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    pub fn prune_unused_components(mut self, enabled: bool) -> Self {
        self.prune_unused_components = enabled;
        self
    }

    /// Replace the set of component buckets eligible for pruning.
    pub fn component_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_sections = sections.into_iter().map(Into::into).collect();
        self
    }

    /// True when http(s) documents may be fetched.
    pub fn remote_fetch_enabled(&self) -> bool {
        self.handle_external_refs && self.allow_http_fetch
    }
}

/// Contents of a config file: input/output paths plus options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DerefConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub options: DerefOptions,
}

impl DerefConfig {
    /// Load a config file. YAML and JSON are both accepted.
    ///
    /// # Errors
    ///
    /// Returns `DerefError::ConfigRead` if the file can't be read,
    /// or `DerefError::InvalidConfig` if it doesn't parse.
    pub fn from_file(path: &Path) -> Result<Self, DerefError> {
        let content = std::fs::read_to_string(path).map_err(|source| DerefError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| DerefError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config text (YAML or JSON).
    pub fn from_yaml_str(content: &str) -> Result<Self, FormatError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
