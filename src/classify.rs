use std::fs;
use std::io;
use std::path::Path;

/// What a directory entry turned out to be.
///
/// `File` covers every non-directory a link-following stat can see (regular
/// files, fifos, sockets, devices). `SymbolicLink` is only reported for links
/// whose target cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    SymbolicLink,
}

impl EntryKind {
    pub fn is_directory(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// Classify `path` with a single link-following status query.
///
/// A link to a directory is a `Directory`. Only when that query fails is the
/// link itself inspected, so a dangling link comes back as `SymbolicLink`
/// instead of an error.
pub fn classify(path: &Path) -> io::Result<EntryKind> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(EntryKind::Directory),
        Ok(_) => Ok(EntryKind::File),
        Err(err) => match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(EntryKind::SymbolicLink),
            _ => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_entries() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        assert_eq!(classify(dir.path()).unwrap(), EntryKind::Directory);
        assert_eq!(classify(&file).unwrap(), EntryKind::File);
        assert!(classify(&dir.path().join("nope")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_links() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sub");
        fs::create_dir(&target).unwrap();
        symlink(&target, dir.path().join("to_dir")).unwrap();
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        assert_eq!(
            classify(&dir.path().join("to_dir")).unwrap(),
            EntryKind::Directory
        );
        assert_eq!(
            classify(&dir.path().join("dangling")).unwrap(),
            EntryKind::SymbolicLink
        );
    }
}
