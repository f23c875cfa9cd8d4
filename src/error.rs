//! Domain-specific error types for the build tooling.
//!
//! Internal modules return typed errors (e.g., [`CopyError`], [`FetchError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ToolsError
//! ├── Config(ConfigError): bad flags, malformed requirements document
//! ├── Copy(CopyError)    : missing sources, collisions, existing destinations
//! ├── Tool(ToolError)    : external tools missing or failing
//! └── Fetch(FetchError)  : git clones and resource downloads
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type aggregating every domain error.
#[derive(Error, Debug)]
pub enum ToolsError {
    /// Configuration error (flags, requirements document).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Copy engine error.
    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    /// External tool error.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Git or download error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Errors detected while reading flags or the requirements document.
///
/// These are reported before any side effect takes place.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An entry is missing a mandatory field or has it empty.
    #[error("entry #{index} in '{section}' has an empty or missing '{field}'")]
    MissingField {
        /// Requirements section (e.g. `git`).
        section: &'static str,
        /// Zero-based position of the entry in its section.
        index: usize,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A section has entries but the directory they go into is not set.
    #[error("'{key}' is required when '{section}' has entries")]
    MissingDirectory {
        /// Section that needs the directory.
        section: &'static str,
        /// Key holding the directory.
        key: &'static str,
    },

    /// A `delete` entry is the empty string.
    #[error("'delete' entry #{0} is empty")]
    EmptyDeleteEntry(usize),

    /// A name that becomes a directory is not a single path component.
    #[error("'{name}' in '{section}' must be a single path component")]
    InvalidName {
        /// Section holding the name.
        section: &'static str,
        /// The offending name.
        name: String,
    },

    /// A digest is not a well-formed hex string.
    #[error("invalid {algorithm} digest for '{name}': {reason}")]
    InvalidDigest {
        /// Resource name.
        name: String,
        /// Digest algorithm (`md5` or `sha256`).
        algorithm: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Pattern text.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// A comma-separated list produced no usable entries.
    #[error("no usable entries in {0}")]
    EmptyList(&'static str),

    /// The requirements document is not valid JSON for the schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the document.
        path: String,
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// The requirements document could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path of the document.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by the copy engine.
///
/// Everything except [`CopyError::Io`] is detected before the first file is
/// written.
#[derive(Error, Debug)]
pub enum CopyError {
    /// The extension list parsed to nothing.
    #[error("extension list is empty")]
    EmptyExtensions,

    /// The single file to copy does not exist or is not a file.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The directory to search does not exist.
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Two distinct sources map to the same destination.
    #[error(
        "'{name}' was found more than once under {}: {} and {}",
        .root.display(),
        .first.display(),
        .second.display()
    )]
    NameCollision {
        /// Colliding destination name.
        name: String,
        /// Search root.
        root: PathBuf,
        /// First source reaching the name.
        first: PathBuf,
        /// Second source reaching the name.
        second: PathBuf,
    },

    /// The output path exists and is a regular file.
    #[error("output path {} is a file", .0.display())]
    OutputIsFile(PathBuf),

    /// A destination path already exists as a directory.
    #[error("output path {} already exists and is a directory", .0.display())]
    DestinationIsDirectory(PathBuf),

    /// A destination file already exists and overwriting is off.
    #[error("output file {} already exists", .0.display())]
    DestinationExists(PathBuf),

    /// The output directory could not be cleared.
    #[error("clearing output {}: {message}", .path.display())]
    Clear {
        /// Output directory.
        path: PathBuf,
        /// Error chain of the failed removal.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        /// What was being done (e.g. `copying`).
        action: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl CopyError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised when an external tool is missing or fails.
#[derive(Error, Debug)]
pub enum ToolError {
    /// `<tool> --version` could not be run or exited non-zero.
    #[error("{executable} is not available: {detail}")]
    Unavailable {
        /// Executable name.
        executable: String,
        /// Spawn error or captured stderr.
        detail: String,
    },

    /// The version output does not contain the required substring.
    #[error("{executable} does not match the version requirement, please install {expected} (found: {found})")]
    VersionMismatch {
        /// Executable name.
        executable: String,
        /// Required version substring.
        expected: String,
        /// First line of the version output.
        found: String,
    },

    /// A post-processing tool exited non-zero.
    #[error("{tool} failed (exit {code}), log available at {}", .log.display())]
    Failed {
        /// Tool name.
        tool: String,
        /// Exit code, `-1` when killed by a signal.
        code: i32,
        /// Log file holding the tool output.
        log: PathBuf,
    },
}

/// Errors raised while fetching git repositories and downloadable resources.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The destination directory already exists.
    #[error("failed to fetch '{name}': target directory {} already exists", .path.display())]
    DestinationExists {
        /// Entry name.
        name: String,
        /// Destination path.
        path: PathBuf,
    },

    /// A git command failed.
    #[error("failed to clone repo '{name}': {message}")]
    Git {
        /// Entry name.
        name: String,
        /// Captured error text.
        message: String,
    },

    /// The URL has no usable file name.
    #[error("failed to download resource '{name}': cannot derive a file name from {url}")]
    InvalidUrl {
        /// Entry name.
        name: String,
        /// Offending URL.
        url: String,
    },

    /// The HTTP transfer failed.
    #[error("failed to download resource '{name}' from {url}: {reason}")]
    Download {
        /// Entry name.
        name: String,
        /// Requested URL.
        url: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A computed digest differs from the declared one.
    #[error("failed to download resource '{name}': {algorithm} mismatch (expected {expected}, got {actual})")]
    DigestMismatch {
        /// Entry name.
        name: String,
        /// Digest algorithm.
        algorithm: &'static str,
        /// Declared digest.
        expected: String,
        /// Computed digest.
        actual: String,
    },

    /// Archive extraction failed.
    #[error("could not unpack '{name}' ({}): {message}", .archive.display())]
    Extract {
        /// Entry name.
        name: String,
        /// Archive path.
        archive: PathBuf,
        /// Captured error text.
        message: String,
    },
}
