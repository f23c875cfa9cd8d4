//! File-system helpers shared by the copy engine, pipelines and bootstrap.
use anyhow::{Context as _, Result, bail};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Return `path` as an absolute, lexically normalised path.
///
/// Relative paths are resolved against the current directory.  `.` and `..`
/// components are folded without touching the filesystem, so the path does
/// not need to exist and symlinks are not resolved.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = std::path::absolute(path)
        .with_context(|| format!("resolving absolute path of {}", path.display()))?;
    let mut normalised = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other.as_os_str()),
        }
    }
    Ok(dunce::simplified(&normalised).to_path_buf())
}

/// Render a path with `/` separators regardless of platform.
#[must_use]
pub fn to_posix(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::ParentDir | Component::Normal(_) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&component.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Create `path` and any missing ancestors.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("creating directory {}", path.display()))
}

/// Give the owner write access to `path`.
///
/// Some version-control checkouts leave objects read-only, which makes
/// deletion fail on Windows.
fn make_writable(path: &Path, meta: &std::fs::Metadata) -> io::Result<()> {
    let mut perms = meta.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        let mode = perms.mode();
        // Directories also need the search bit to have their entries removed.
        let wanted = if meta.is_dir() { mode | 0o700 } else { mode | 0o200 };
        if wanted == mode {
            return Ok(());
        }
        perms.set_mode(wanted);
    }
    #[cfg(not(unix))]
    {
        if !perms.readonly() {
            return Ok(());
        }
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
    }
    std::fs::set_permissions(path, perms)
}

/// Clear the read-only attribute on `path` and everything below it.
///
/// Symlinks are neither followed nor modified.
fn make_tree_writable(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    make_writable(path, &meta)?;
    if meta.is_dir() {
        for entry in std::fs::read_dir(path)? {
            make_tree_writable(&entry?.path())?;
        }
    }
    Ok(())
}

/// Recursively delete a directory tree, clearing read-only attributes first.
///
/// # Errors
///
/// Returns an error if any entry cannot be made writable or removed.
pub fn remove_dir_all_writable(path: &Path) -> Result<()> {
    make_tree_writable(path).with_context(|| format!("making {} writable", path.display()))?;
    std::fs::remove_dir_all(path).with_context(|| format!("removing {}", path.display()))
}

/// Remove whatever lives at `path`: a file, a symlink or a directory tree.
///
/// Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the entry exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };
    if meta.is_dir() {
        return remove_dir_all_writable(path);
    }
    if !meta.file_type().is_symlink() {
        make_writable(path, &meta)
            .with_context(|| format!("making {} writable", path.display()))?;
    }
    std::fs::remove_file(path).with_context(|| format!("removing {}", path.display()))
}

/// Delete the directory at `path` if present, refusing to touch a file.
///
/// # Errors
///
/// Returns an error if `path` is a regular file or cannot be removed.
pub fn clear_dir(path: &Path) -> Result<()> {
    if path.is_file() {
        bail!("{} already exists and is a file", path.display());
    }
    if path.exists() {
        remove_dir_all_writable(path)?;
    }
    Ok(())
}

/// Make `path` an existing, empty directory.
///
/// Resetting an empty directory and resetting a populated one end in the
/// same state.
///
/// # Errors
///
/// Returns an error if `path` is a regular file, or cannot be removed or
/// recreated.
pub fn reset_dir(path: &Path) -> Result<()> {
    clear_dir(path)?;
    ensure_dir(path)
}

/// Copy a file's bytes, permissions and access/modification times.
///
/// # Errors
///
/// Returns an error if the copy or the metadata update fails.
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> io::Result<u64> {
    use filetime::{FileTime, set_file_times};

    let bytes = std::fs::copy(src, dst)?;
    let meta = std::fs::metadata(src)?;
    std::fs::set_permissions(dst, meta.permissions())?;
    set_file_times(
        dst,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )?;
    Ok(bytes)
}
