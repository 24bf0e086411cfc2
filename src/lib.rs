//! Recursive filesystem search with Perl-style name patterns.
//!
//! A search runs either in-process, through [`Walker`], or by delegating to
//! the host's `find` and `perl` through [`DelegationPlanner`]. [`Finder`]
//! picks between them and falls back to the walk when delegation fails.
pub mod classify;
pub mod cli;
pub mod config;
pub mod delegate;
pub mod error;
pub mod exclude;
pub mod find;
pub mod options;
pub mod platform;
pub mod predicate;
pub mod sink;
pub mod walker;

pub use classify::{classify, EntryKind};
pub use cli::{Cli, EntryTypeArg, OutputFormat};
pub use config::Config;
pub use delegate::{CommandRunner, DelegateCommand, DelegationPlanner, LineStream, SystemRunner, Toolchain};
pub use error::{Result, RfindError};
pub use exclude::ExclusionSet;
pub use find::{Engine, Finder, SearchReport};
pub use options::{AccelerationMode, SearchConfig, SearchConfigBuilder};
pub use platform::{ExecutableLocator, HostOs, OsInfo, StandardLocations};
pub use predicate::{MatchPredicate, Pattern, MATCH_EVERYTHING};
pub use sink::{LineConsumer, Sink, WriterConsumer};
pub use walker::{TraversalNode, WalkStats, Walker};
