//! Typed requirements document for the `bootstrap` command.
//!
//! The document is read once, validated as a whole, and never mutated.
//! Every check runs before the first side effect so a bad entry anywhere
//! aborts the run with nothing changed on disk.
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// A tool that must be installed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolRequirement {
    /// Executable looked up on `PATH`.
    pub executable: String,
    /// Substring the `--version` output must contain.
    #[serde(default)]
    pub version_string: Option<String>,
}

impl ToolRequirement {
    /// A requirement on `executable` with any version.
    #[must_use]
    pub fn any_version(executable: &str) -> Self {
        Self {
            executable: executable.to_string(),
            version_string: None,
        }
    }
}

/// A directory emptied (or created) before fetching.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetEntry {
    /// Directory path, relative to the bootstrap root unless absolute.
    pub folder: String,
}

/// A git repository cloned into `git_dir/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitEntry {
    /// Directory name of the checkout.
    pub name: String,
    /// Clone URL.
    pub repo: String,
    /// Commit checked out after cloning.
    #[serde(default)]
    pub hash: Option<String>,
}

/// An archive downloaded and unpacked into `wget_dir/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadEntry {
    /// Directory name the archive is unpacked into.
    pub name: String,
    /// Download URL.
    pub url: String,
    /// Expected MD5 digest, hex.
    #[serde(default)]
    pub md5: Option<String>,
    /// Expected SHA-256 digest, hex.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// The parsed requirements document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Requirements {
    /// Tools checked before anything else.
    #[serde(default)]
    pub tools: Vec<ToolRequirement>,
    /// Directories reset to empty.
    #[serde(default)]
    pub reset: Vec<ResetEntry>,
    /// Parent directory of git checkouts.
    #[serde(default)]
    pub git_dir: Option<String>,
    /// Repositories to clone.
    #[serde(default)]
    pub git: Vec<GitEntry>,
    /// Parent directory of downloaded resources.
    #[serde(default)]
    pub wget_dir: Option<String>,
    /// Resources to download.
    #[serde(default)]
    pub wget: Vec<DownloadEntry>,
    /// Glob patterns removed at the end.
    #[serde(default)]
    pub delete: Vec<String>,
}

impl Requirements {
    /// Read and validate the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid JSON
    /// for the schema, or fails [`Requirements::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse and validate a document held in memory; `origin` names it in
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on a parse or validation failure.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let requirements: Self =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        requirements.validate()?;
        Ok(requirements)
    }

    /// Check every entry.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in document order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, tool) in self.tools.iter().enumerate() {
            require("tools", index, "executable", &tool.executable)?;
        }
        for (index, entry) in self.reset.iter().enumerate() {
            require("reset", index, "folder", &entry.folder)?;
        }

        if !self.git.is_empty() {
            require_dir("git", "git_dir", self.git_dir.as_deref())?;
        }
        for (index, entry) in self.git.iter().enumerate() {
            require("git", index, "name", &entry.name)?;
            require("git", index, "repo", &entry.repo)?;
            single_component("git", &entry.name)?;
            if let Some(hash) = &entry.hash {
                require("git", index, "hash", hash)?;
            }
        }

        if !self.wget.is_empty() {
            require_dir("wget", "wget_dir", self.wget_dir.as_deref())?;
        }
        for (index, entry) in self.wget.iter().enumerate() {
            require("wget", index, "name", &entry.name)?;
            require("wget", index, "url", &entry.url)?;
            single_component("wget", &entry.name)?;
            if let Some(md5) = &entry.md5 {
                check_digest(&entry.name, "md5", md5, 32)?;
            }
            if let Some(sha256) = &entry.sha256 {
                check_digest(&entry.name, "sha256", sha256, 64)?;
            }
        }

        for (index, pattern) in self.delete.iter().enumerate() {
            if pattern.trim().is_empty() {
                return Err(ConfigError::EmptyDeleteEntry(index));
            }
            glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.msg.to_string(),
            })?;
        }
        Ok(())
    }

    /// Directory holding git checkouts, resolved against `root`.
    #[must_use]
    pub fn git_root(&self, root: &Path) -> Option<PathBuf> {
        self.git_dir.as_deref().map(|dir| resolve(root, dir))
    }

    /// Directory holding downloaded resources, resolved against `root`.
    #[must_use]
    pub fn wget_root(&self, root: &Path) -> Option<PathBuf> {
        self.wget_dir.as_deref().map(|dir| resolve(root, dir))
    }
}

/// Resolve `path` against `root` unless it is already absolute.
#[must_use]
pub fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn require(
    section: &'static str,
    index: usize,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField {
            section,
            index,
            field,
        });
    }
    Ok(())
}

fn require_dir(
    section: &'static str,
    key: &'static str,
    value: Option<&str>,
) -> Result<(), ConfigError> {
    match value {
        Some(dir) if !dir.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingDirectory { section, key }),
    }
}

fn single_component(section: &'static str, name: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(ConfigError::InvalidName {
            section,
            name: name.to_string(),
        }),
    }
}

fn check_digest(
    name: &str,
    algorithm: &'static str,
    digest: &str,
    expected_len: usize,
) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDigest {
        name: name.to_string(),
        algorithm,
        reason,
    };
    if digest.len() != expected_len {
        return Err(invalid(format!(
            "expected {expected_len} hex characters, got {}",
            digest.len()
        )));
    }
    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters".to_string()));
    }
    Ok(())
}
