use crate::options::AccelerationMode;
use crate::predicate::MATCH_EVERYTHING;
use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Recursively list paths whose names match a Perl-style regex", long_about = None)]
pub struct Cli {
    /// Directory (or file) to search from
    #[clap(default_value = ".")]
    pub path: PathBuf,

    /// Perl-style pattern, bare or as /body/flags
    #[clap(default_value = MATCH_EVERYTHING)]
    pub pattern: String,

    #[clap(long, value_parser, default_value_t = 0)]
    pub mindepth: usize,

    #[clap(long, value_parser)]
    pub maxdepth: Option<usize>,

    /// Descend into directories reached through symbolic links
    #[clap(short = 'L', long, value_parser, default_value_t = false, overrides_with = "no_follow")]
    pub follow: bool,

    /// Do not follow links, even when the config file says to
    #[clap(long, value_parser, default_value_t = false, overrides_with = "follow")]
    pub no_follow: bool,

    /// Entry types to report; repeat for both
    #[clap(short = 't', long = "type", value_parser)]
    pub types: Vec<EntryTypeArg>,

    /// Report paths that do NOT match the pattern
    #[clap(short = 'v', long, value_parser, default_value_t = false)]
    pub invert: bool,

    /// Directory never to descend into; repeatable
    #[clap(short = 'e', long, value_parser)]
    pub exclude: Vec<PathBuf>,

    #[clap(long, value_parser)]
    pub accelerate: Option<AccelerationMode>,

    /// Collect all results and print them sorted
    #[clap(long, value_parser, default_value_t = false)]
    pub sort: bool,

    #[clap(long, value_parser, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Print the engine used and the match count to stderr
    #[clap(long, value_parser, default_value_t = false)]
    pub stats: bool,

    #[clap(long, value_parser, default_value_t = false)]
    pub verbose: bool,

    #[clap(long, value_parser)]
    pub log: Option<PathBuf>,

    #[clap(long, value_parser)]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[clap(long, value_parser)]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Whether results must be gathered before anything is printed.
    pub fn collects(&self) -> bool {
        self.sort || matches!(self.format, OutputFormat::Json)
    }

    /// Link following requested on the command line, if any. The last of
    /// `--follow` and `--no-follow` wins.
    pub fn follow_override(&self) -> Option<bool> {
        if self.follow {
            Some(true)
        } else if self.no_follow {
            Some(false)
        } else {
            None
        }
    }

    /// `(directories, files)` selection; both when no `--type` was given.
    pub fn type_selection(&self) -> (bool, bool) {
        if self.types.is_empty() {
            return (true, true);
        }
        (
            self.types.contains(&EntryTypeArg::D),
            self.types.contains(&EntryTypeArg::F),
        )
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryTypeArg {
    /// Regular files and anything that is not a directory
    F,
    /// Directories
    D,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
