use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Fully resolved, symlink-free absolute form of `path`.
pub fn canonical_identity(path: &Path) -> io::Result<PathBuf> {
    fs::canonicalize(path)
}

/// Absolute form of `path` with `.` and `..` removed textually.
fn lexical_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Directories that are never descended into, keyed by canonical identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    dirs: BTreeSet<PathBuf>,
}

impl ExclusionSet {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let dirs = dirs
            .into_iter()
            .map(|dir| {
                let dir = dir.as_ref();
                canonical_identity(dir).unwrap_or_else(|err| {
                    let fallback = lexical_absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
                    debug!(
                        "Excluding '{}' by its absolute form '{}': {}",
                        dir.display(),
                        fallback.display(),
                        err
                    );
                    fallback
                })
            })
            .collect();
        Self { dirs }
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Membership test for an already canonical path.
    pub fn contains(&self, canonical: &Path) -> bool {
        self.dirs.contains(canonical)
    }

    /// Whether the directory at `path`, however it is spelled, is excluded.
    /// No filesystem call is made when the set is empty.
    pub fn covers(&self, path: &Path) -> io::Result<bool> {
        if self.dirs.is_empty() {
            return Ok(false);
        }
        Ok(self.contains(&canonical_identity(path)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.dirs.iter()
    }
}
