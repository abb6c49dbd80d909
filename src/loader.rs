//! Document loading from files and HTTP URLs.
//!
//! Loaded documents are cached by location for the lifetime of the loader.
//! The root document is seeded into the cache so self-references never
//! re-read the input.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use url::Url;

use crate::error::LoadError;
use crate::format::{parse_document, DocumentFormat};
use crate::options::DerefOptions;
use crate::uri::location_to_path;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Strategy for fetching `http(s)` documents.
pub trait RemoteFetcher {
    /// Fetch the raw text of the document at `url`.
    fn fetch(&self, url: &Url) -> Result<String, LoadError>;
}

/// Fetches documents with a blocking `reqwest` client.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            timeout: HTTP_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[cfg(feature = "remote")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "remote")]
impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<String, LoadError> {
        let network_error = |source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(network_error)?;

        let response = client.get(url.as_str()).send().map_err(network_error)?;

        // Check for HTTP errors before reading the body
        let response = response.error_for_status().map_err(network_error)?;

        response.text().map_err(network_error)
    }
}

/// Fetcher installed when remote fetching is allowed, if this build has one.
fn default_remote_fetcher() -> Option<Box<dyn RemoteFetcher>> {
    #[cfg(feature = "remote")]
    {
        Some(Box::new(HttpFetcher::new()))
    }
    #[cfg(not(feature = "remote"))]
    {
        None
    }
}

/// Loads and caches documents by location.
pub struct DocumentLoader {
    root_location: Url,
    handle_external_refs: bool,
    remote: Option<Box<dyn RemoteFetcher>>,
    cache: HashMap<Url, Value>,
}

impl DocumentLoader {
    /// Create a loader seeded with the root document.
    ///
    /// An HTTP fetcher is installed only when `options` allow remote fetching.
    pub fn new(root: Value, root_location: Url, options: &DerefOptions) -> Self {
        let remote = if options.remote_fetch_enabled() {
            default_remote_fetcher()
        } else {
            None
        };

        let mut cache = HashMap::new();
        cache.insert(root_location.clone(), root);

        Self {
            root_location,
            handle_external_refs: options.handle_external_refs,
            remote,
            cache,
        }
    }

    /// Replace the remote fetch strategy.
    pub fn with_remote_fetcher(mut self, fetcher: Box<dyn RemoteFetcher>) -> Self {
        self.remote = Some(fetcher);
        self
    }

    pub fn root_location(&self) -> &Url {
        &self.root_location
    }

    /// The root document this loader was seeded with.
    pub fn root(&self) -> &Value {
        &self.cache[&self.root_location]
    }

    /// Load the document at `location`, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the location is disallowed by policy, can't be
    /// read or fetched, or doesn't parse.
    pub fn load(&mut self, location: &Url) -> Result<&Value, LoadError> {
        if !self.cache.contains_key(location) {
            let doc = self.fetch(location)?;
            tracing::debug!(%location, "loaded document");
            self.cache.insert(location.clone(), doc);
        }
        Ok(&self.cache[location])
    }

    fn fetch(&self, location: &Url) -> Result<Value, LoadError> {
        if !self.handle_external_refs && location != &self.root_location {
            return Err(LoadError::ExternalRefsDisabled {
                location: location.clone(),
            });
        }

        match location.scheme() {
            "http" | "https" => {
                let fetcher =
                    self.remote
                        .as_ref()
                        .ok_or_else(|| LoadError::RemoteFetchDisabled {
                            location: location.clone(),
                        })?;
                let content = fetcher.fetch(location)?;
                parse_document(&content, DocumentFormat::from_extension(location.path()))
                    .map_err(|source| LoadError::InvalidDocument {
                        location: location.to_string(),
                        source,
                    })
            }
            "file" => {
                let path =
                    location_to_path(location).ok_or_else(|| LoadError::UnsupportedScheme {
                        location: location.clone(),
                    })?;
                load_document(&path)
            }
            _ => Err(LoadError::UnsupportedScheme {
                location: location.clone(),
            }),
        }
    }
}

/// Load a document from a file path. `.json` files parse as JSON, others as YAML.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidDocument` if it doesn't parse.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let format = DocumentFormat::from_extension(&path.to_string_lossy());
    parse_document(&content, format).map_err(|source| LoadError::InvalidDocument {
        location: path.display().to_string(),
        source,
    })
}

/// Load a document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidDocument` if the string doesn't parse.
pub fn load_document_str(content: &str, format: DocumentFormat) -> Result<Value, LoadError> {
    parse_document(content, format).map_err(|source| LoadError::InvalidDocument {
        location: "<string>".to_string(),
        source,
    })
}
