use crate::error::Error;
use crate::result::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Copy a file or directory recursively, returning the number of files copied
pub fn copy_recursively(source: &Path, destination: &Path) -> Result<usize> {
    let mut copied = 0;

    if source.is_dir() {
        if !destination.exists() {
            fs::create_dir_all(destination)?;
        }

        for entry in fs::read_dir(source)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let src_path = entry.path();
            let dst_path = destination.join(entry.file_name());

            if file_type.is_dir() {
                copied += copy_recursively(&src_path, &dst_path)?;
            } else {
                fs::copy(&src_path, &dst_path)?;
                copied += 1;
            }
        }
    } else {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        copied += 1;
    }

    Ok(copied)
}

/// Copy every entry of `source` (dot-files included) into the existing
/// directory `destination`, merging with whatever is already there
pub fn copy_dir_contents(source: &Path, destination: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        copied += copy_recursively(&entry.path(), &destination.join(entry.file_name()))?;
    }
    Ok(copied)
}

/// Delete `path` if it exists and create it again, empty
pub fn reset_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Find the project root: the nearest directory at or above `start` that
/// holds `manifest_name`. When `start` is the manifest file itself, its parent
/// is the root.
pub fn find_root(start: &Path, manifest_name: &str) -> Result<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()?.join(start)
    };

    if start.is_file() {
        return start
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::RootNotFound(start.display().to_string()));
    }

    start
        .ancestors()
        .find(|dir| dir.join(manifest_name).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::RootNotFound(start.display().to_string()))
}

/// Lexically resolve `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// A relative path made only of plain names (no `..`, no root or prefix)
pub fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether `path` is a directory with no entries
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
