//! The search front door: root resolution, engine choice and fallback.
use crate::delegate::DelegationPlanner;
use crate::error::{Result, RfindError};
use crate::options::SearchConfig;
use crate::platform::{HostOs, OsInfo};
use crate::sink::Sink;
use crate::walker::Walker;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Which engine produced the results of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    InProcess,
    Delegated,
    /// Delegation was attempted, failed, and the in-process walk completed it.
    Fallback,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::InProcess => write!(f, "in-process"),
            Engine::Delegated => write!(f, "delegated"),
            Engine::Fallback => write!(f, "in-process (fallback)"),
        }
    }
}

#[derive(Debug)]
pub struct SearchReport {
    pub engine: Engine,
    pub matches: usize,
    pub skipped: Vec<RfindError>,
}

pub struct Finder<'a> {
    root: PathBuf,
    config: &'a SearchConfig,
    planner: &'a DelegationPlanner,
    os: Box<dyn OsInfo>,
}

impl<'a> Finder<'a> {
    pub fn new(root: impl AsRef<Path>, config: &'a SearchConfig, planner: &'a DelegationPlanner) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
            planner,
            os: Box::new(HostOs),
        }
    }

    pub fn with_os(mut self, os: Box<dyn OsInfo>) -> Self {
        self.os = os;
        self
    }

    /// Canonical form of the search root; every result is spelled below it.
    pub fn resolve_root(&self) -> Result<PathBuf> {
        fs::canonicalize(&self.root).map_err(|source| RfindError::RootNotFound {
            path: self.root.clone(),
            source,
        })
    }

    pub fn run(&self, sink: &mut Sink<'_>) -> Result<SearchReport> {
        let root = self.resolve_root()?;
        let start = sink.delivered();
        info!("Searching {} for {}", root.display(), self.config.pattern());

        if self.config.is_empty_range() {
            debug!(
                "mindepth {} exceeds maxdepth {:?}; nothing to do",
                self.config.min_depth(),
                self.config.max_depth()
            );
            return Ok(SearchReport {
                engine: Engine::InProcess,
                matches: 0,
                skipped: Vec::new(),
            });
        }

        let mut engine = Engine::InProcess;
        let wanted = DelegationPlanner::wants_acceleration(self.config);
        if wanted && self.planner.can_accelerate() {
            debug!("Using delegated find");
            sink.track_delivered();
            match self.planner.execute(self.config, &root, sink) {
                Ok(_) => {
                    sink.stop_tracking();
                    sink.finish().map_err(RfindError::Output)?;
                    let matches = sink.delivered() - start;
                    info!("Delegated search finished with {matches} matches");
                    return Ok(SearchReport {
                        engine: Engine::Delegated,
                        matches,
                        skipped: Vec::new(),
                    });
                }
                Err(RfindError::DelegationUnavailable(reason)) => {
                    warn!("Accelerated search failed ({reason}); falling back to in-process traversal");
                    engine = Engine::Fallback;
                }
                Err(err) => return Err(err),
            }
        } else if wanted {
            debug!("Acceleration wanted but no toolchain available");
        }

        debug!("Using in-process traversal");
        let walked = Walker::new(self.config, self.os.as_ref()).walk(&root, sink);
        sink.stop_tracking();
        let stats = walked?;
        sink.finish().map_err(RfindError::Output)?;

        let matches = sink.delivered() - start;
        info!(
            "Search finished: {} matches, {} directories listed, {} entries examined, {} skipped",
            matches,
            stats.directories_listed,
            stats.entries_seen,
            stats.skipped.len()
        );
        Ok(SearchReport {
            engine,
            matches,
            skipped: stats.skipped,
        })
    }

    /// Run into a collecting sink and return the matches in discovery order.
    pub fn collect(&self) -> Result<Vec<String>> {
        let mut sink = Sink::collecting();
        self.run(&mut sink)?;
        Ok(sink.into_results())
    }
}
