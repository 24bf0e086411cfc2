//! Per-search configuration, fixed for the duration of a traversal.
use crate::error::Result;
use crate::exclude::ExclusionSet;
use crate::predicate::{MatchPredicate, MATCH_EVERYTHING};
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// When the external `find` pipeline may be used instead of the in-process walk.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelerationMode {
    /// Whenever the toolchain is found on the host.
    Always,
    /// Never; always walk in-process.
    Never,
    /// Only when a pattern other than [`MATCH_EVERYTHING`] was given.
    #[default]
    Pattern,
}

impl fmt::Display for AccelerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccelerationMode::Always => write!(f, "always"),
            AccelerationMode::Never => write!(f, "never"),
            AccelerationMode::Pattern => write!(f, "pattern"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    min_depth: usize,
    max_depth: Option<usize>,
    follow_symlinks: bool,
    include_directories: bool,
    include_files: bool,
    pattern: String,
    negated: bool,
    excluded: ExclusionSet,
    acceleration: AccelerationMode,
    predicate: MatchPredicate,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    /// `None` means unbounded.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub fn include_directories(&self) -> bool {
        self.include_directories
    }

    pub fn include_files(&self) -> bool {
        self.include_files
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn excluded(&self) -> &ExclusionSet {
        &self.excluded
    }

    pub fn acceleration(&self) -> AccelerationMode {
        self.acceleration
    }

    pub fn predicate(&self) -> &MatchPredicate {
        &self.predicate
    }

    /// `min_depth > max_depth`: nothing can ever be emitted.
    pub fn is_empty_range(&self) -> bool {
        matches!(self.max_depth, Some(max) if self.min_depth > max)
    }

    /// Whether entries at `depth` may still be listed (their children visited).
    pub fn may_descend_below(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }

    pub fn may_emit_at(&self, depth: usize) -> bool {
        depth >= self.min_depth
    }

    /// Type eligibility, independent of the pattern.
    pub fn wants_kind(&self, is_directory: bool) -> bool {
        if is_directory {
            self.include_directories
        } else {
            self.include_files
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfigBuilder {
    min_depth: usize,
    max_depth: Option<usize>,
    follow_symlinks: bool,
    include_directories: bool,
    include_files: bool,
    pattern: String,
    negated: bool,
    excluded: Vec<PathBuf>,
    acceleration: AccelerationMode,
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self {
            min_depth: 0,
            max_depth: None,
            follow_symlinks: false,
            include_directories: true,
            include_files: true,
            pattern: MATCH_EVERYTHING.to_string(),
            negated: false,
            excluded: Vec::new(),
            acceleration: AccelerationMode::default(),
        }
    }
}

impl SearchConfigBuilder {
    pub fn min_depth(mut self, depth: usize) -> Self {
        self.min_depth = depth;
        self
    }

    /// Pass `None` for no limit.
    pub fn max_depth(mut self, depth: impl Into<Option<usize>>) -> Self {
        self.max_depth = depth.into();
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn include_directories(mut self, include: bool) -> Self {
        self.include_directories = include;
        self
    }

    pub fn include_files(mut self, include: bool) -> Self {
        self.include_files = include;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    pub fn exclude(mut self, dir: impl AsRef<Path>) -> Self {
        self.excluded.push(dir.as_ref().to_path_buf());
        self
    }

    pub fn exclude_all<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.excluded
            .extend(dirs.into_iter().map(|d| d.as_ref().to_path_buf()));
        self
    }

    pub fn acceleration(mut self, mode: AccelerationMode) -> Self {
        self.acceleration = mode;
        self
    }

    /// Compile the predicate and resolve exclusions. Pattern errors surface here.
    pub fn build(self) -> Result<SearchConfig> {
        let predicate = MatchPredicate::new(&self.pattern, self.negated)?;
        Ok(SearchConfig {
            min_depth: self.min_depth,
            max_depth: self.max_depth,
            follow_symlinks: self.follow_symlinks,
            include_directories: self.include_directories,
            include_files: self.include_files,
            pattern: self.pattern,
            negated: self.negated,
            excluded: ExclusionSet::new(&self.excluded),
            acceleration: self.acceleration,
            predicate,
        })
    }
}
