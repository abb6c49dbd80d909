//! Error types for document loading, pointer resolution and dereferencing.

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors while loading a document from its location.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Policy errors (exit code 2)
    #[error("HTTP(S) external refs are disabled for {location}")]
    RemoteFetchDisabled { location: Url },

    #[error("external document refs are disabled for {location}")]
    ExternalRefsDisabled { location: Url },

    #[error("unsupported URI scheme in $ref: {location}")]
    UnsupportedScheme { location: Url },

    // Parse errors (exit code 2)
    #[error("invalid document at {location}: {source}")]
    InvalidDocument {
        location: String,
        #[source]
        source: FormatError,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while parsing or rendering YAML/JSON text.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported number {0}")]
    UnsupportedNumber(String),

    #[error("unsupported mapping key {0}")]
    UnsupportedKey(String),
}

/// Errors while following a JSON Pointer (RFC 6901) fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("invalid JSON pointer (must start with '/'): {pointer:?}")]
    InvalidPointer { pointer: String },

    #[error("key {token:?} not found while traversing pointer {pointer:?}")]
    NotFound { token: String, pointer: String },

    #[error("expected integer index in pointer for list, got {token:?}")]
    InvalidIndex { token: String },

    #[error("index {index} out of range for list length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot traverse into {actual} at token {token:?}")]
    NotTraversable { token: String, actual: String },
}

/// Failure to resolve a single `$ref`.
///
/// Never fatal: the engine records a warning and leaves the reference in place.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("cannot join {reference:?} onto {base}: {source}")]
    InvalidReference {
        reference: String,
        base: Url,
        #[source]
        source: url::ParseError,
    },

    #[error("max resolution depth {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },
}

/// Fatal errors of the dereferencing pipeline.
#[derive(Debug, Error)]
pub enum DerefError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("cannot turn {path} into a file location")]
    InvalidPath { path: PathBuf },

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("root document must be a mapping, got {actual}")]
    InvalidRoot { actual: String },

    #[error("failed to serialize output: {source}")]
    Serialize {
        #[source]
        source: FormatError,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DerefError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DerefError::Load(e) => e.exit_code(),
            DerefError::ConfigRead { .. } | DerefError::WriteError { .. } => 3,
            _ => 2,
        }
    }
}
