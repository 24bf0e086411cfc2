//! In-process depth-first traversal.
//!
//! Each directory's matching entries are emitted before any of its
//! subdirectories is entered, in the order the platform lists them.
use crate::classify::{classify, EntryKind};
use crate::error::{Result, RfindError};
use crate::options::SearchConfig;
use crate::platform::OsInfo;
use crate::sink::Sink;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// One visited entry. Paths are absolute because the walk starts from a
/// canonical root.
#[derive(Debug, Clone)]
pub struct TraversalNode {
    pub path: PathBuf,
    pub depth: usize,
    pub kind: EntryKind,
}

#[derive(Debug, Default)]
pub struct WalkStats {
    pub directories_listed: usize,
    pub entries_seen: usize,
    /// Entries that could not be examined; the walk carried on without them.
    pub skipped: Vec<RfindError>,
}

impl WalkStats {
    fn skip(&mut self, path: impl Into<PathBuf>, source: std::io::Error) {
        let err = RfindError::entry(path, source);
        warn!("Skipping: {err}");
        self.skipped.push(err);
    }
}

pub struct Walker<'a> {
    config: &'a SearchConfig,
    os: &'a dyn OsInfo,
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a SearchConfig, os: &'a dyn OsInfo) -> Self {
        Self { config, os }
    }

    /// Walk from `root`, which must already be canonical, emitting into `sink`.
    pub fn walk(&self, root: &Path, sink: &mut Sink<'_>) -> Result<WalkStats> {
        let mut stats = WalkStats::default();
        let kind = classify(root).map_err(|source| RfindError::RootNotFound {
            path: root.to_path_buf(),
            source,
        })?;
        let node = TraversalNode {
            path: root.to_path_buf(),
            depth: 0,
            kind,
        };

        self.offer(&node, sink)?;
        if !kind.is_directory() || !self.config.may_descend_below(0) {
            return Ok(stats);
        }

        match self.config.excluded().covers(root) {
            Ok(true) => {
                debug!("Search root {} is excluded", root.display());
                return Ok(stats);
            }
            Ok(false) => {}
            Err(err) => {
                stats.skip(root, err);
                return Ok(stats);
            }
        }

        self.descend(&node, sink, &mut stats)?;
        Ok(stats)
    }

    /// Emit `node` if depth, type and predicate all allow it.
    fn offer(&self, node: &TraversalNode, sink: &mut Sink<'_>) -> Result<()> {
        if !self.config.may_emit_at(node.depth)
            || !self.config.wants_kind(node.kind.is_directory())
        {
            return Ok(());
        }

        let text = node.path.to_string_lossy();
        if self.config.predicate().accept(&text) {
            sink.receive(&text).map_err(RfindError::Output)?;
        }
        Ok(())
    }

    fn descend(&self, dir: &TraversalNode, sink: &mut Sink<'_>, stats: &mut WalkStats) -> Result<()> {
        let entries = match fs::read_dir(&dir.path) {
            Ok(entries) => entries,
            Err(err) => {
                stats.skip(&dir.path, err);
                return Ok(());
            }
        };
        stats.directories_listed += 1;

        let depth = dir.depth + 1;
        let descend = self.config.may_descend_below(depth);
        let mut queue = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    stats.skip(&dir.path, err);
                    continue;
                }
            };
            stats.entries_seen += 1;

            let path = entry.path();
            let kind = match classify(&path) {
                Ok(kind) => kind,
                Err(err) => {
                    stats.skip(path, err);
                    continue;
                }
            };
            let node = TraversalNode { path, depth, kind };
            self.offer(&node, sink)?;

            if !descend || !kind.is_directory() {
                continue;
            }
            match self.config.excluded().covers(&node.path) {
                Ok(true) => debug!("Not descending into excluded {}", node.path.display()),
                Ok(false) => queue.push(node),
                Err(err) => stats.skip(node.path, err),
            }
        }

        for sub in queue {
            if !self.config.follow_symlinks() {
                match self.os.is_symlink(&sub.path) {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(err) => {
                        stats.skip(sub.path, err);
                        continue;
                    }
                }
            }
            self.descend(&sub, sink, stats)?;
        }
        Ok(())
    }
}
