//! Host capability queries: symlink detection and executable lookup.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directories searched for the delegate tools when no override is configured.
pub const DEFAULT_BIN_DIRS: [&str; 3] = ["/usr/bin", "/bin", "/usr/local/bin"];

/// Operating-system specific answers the entry classifier needs.
pub trait OsInfo {
    /// Whether the platform has symbolic links that can be told apart.
    fn supports_symlinks(&self) -> bool;

    /// Whether `path` itself is a symbolic link. Always `false` when the
    /// platform does not support links.
    fn is_symlink(&self, path: &Path) -> io::Result<bool>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HostOs;

impl OsInfo for HostOs {
    fn supports_symlinks(&self) -> bool {
        cfg!(any(unix, windows))
    }

    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        if !self.supports_symlinks() {
            return Ok(false);
        }
        Ok(fs::symlink_metadata(path)?.file_type().is_symlink())
    }
}

/// True on hosts whose userland is the GNU (or compatible) find/perl/bash set.
pub fn is_gnu_host() -> bool {
    matches!(std::env::consts::OS, "linux" | "freebsd")
}

pub trait ExecutableLocator {
    fn find_executable(&self, name: &str) -> Option<PathBuf>;
}

/// Looks for executables in a fixed, ordered list of directories.
#[derive(Debug, Clone)]
pub struct StandardLocations {
    dirs: Vec<PathBuf>,
}

impl StandardLocations {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl Default for StandardLocations {
    fn default() -> Self {
        Self::new(DEFAULT_BIN_DIRS.iter().map(PathBuf::from).collect())
    }
}

impl ExecutableLocator for StandardLocations {
    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
