//! Single bootstrap actions: check a tool, reset a directory, clone a
//! repository, fetch a resource, remove matching paths.
pub mod digest;
pub mod directory;
pub mod download;
pub mod git_repo;
pub mod removal;
pub mod tool;

use anyhow::Result;

/// Interface for actions that can be described and applied.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Apply the resource change.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be applied due to I/O failures,
    /// a failing external tool, or a precondition that does not hold.
    fn apply(&self) -> Result<ResourceChange>;
}

/// Result of applying a resource change.
///
/// # Examples
///
/// ```
/// use project_tools::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let noop = ResourceChange::AlreadyCorrect;
///
/// assert_eq!(applied, ResourceChange::Applied);
/// assert_ne!(applied, noop);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created, replaced or removed.
    Applied,
    /// Resource was already in the desired state (no change needed).
    AlreadyCorrect,
}
