use clap::{CommandFactory, Parser};
use colored::*;
use env_logger::{Builder, Env, Target};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use log::{debug, info};
use rfind::{
    Cli, Config, DelegationPlanner, Finder, OutputFormat, Result, RfindError, SearchConfig, SearchReport, Sink,
    WriterConsumer,
};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

const BAD_PATTERN_HELP: &str = "Patterns follow Perl 5 regular expression syntax, \
except that the surrounding / characters are optional.\n\
Examples of valid patterns:\n\n    classes    html    /html/i    '/\\.h$'";

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "rfind", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = setup_logging(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_broken_pipe() => {
            debug!("Output closed early: {e}");
            ExitCode::SUCCESS
        }
        Err(e @ RfindError::Pattern { .. }) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!("{BAD_PATTERN_HELP}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    let file_config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let search = build_search_config(cli, &file_config)?;
    info!(
        "Search of {} for '{}' (acceleration {})",
        cli.path.display(),
        search.pattern(),
        search.acceleration()
    );

    let planner = DelegationPlanner::system(file_config.delegate.search_path.clone());
    let finder = Finder::new(&cli.path, &search, &planner);

    let report = if cli.collects() {
        let pb = spinner();
        let mut sink = Sink::collecting();
        let outcome = finder.run(&mut sink);
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let report = outcome?;

        let mut results = sink.into_results();
        if cli.sort {
            results.sort();
        }
        print_collected(&results, cli.format)?;
        report
    } else {
        let mut sink = Sink::streaming(WriterConsumer::new(BufWriter::new(io::stdout().lock())));
        finder.run(&mut sink)?
    };

    print_summary(cli, &report, start_time);
    info!(
        "Finished with {} matches in {:.2?}",
        report.matches,
        start_time.elapsed()
    );
    Ok(())
}

/// Merge the config file with the command line; flags win, exclusions add up.
fn build_search_config(cli: &Cli, file_config: &Config) -> Result<SearchConfig> {
    let (directories, files) = cli.type_selection();
    SearchConfig::builder()
        .min_depth(cli.mindepth)
        .max_depth(cli.maxdepth)
        .follow_symlinks(cli.follow_override().unwrap_or(file_config.search.follow_symlinks))
        .include_directories(directories)
        .include_files(files)
        .pattern(cli.pattern.as_str())
        .negated(cli.invert)
        .exclude_all(file_config.search.exclude.iter().chain(cli.exclude.iter()))
        .acceleration(cli.accelerate.unwrap_or(file_config.search.acceleration))
        .build()
}

fn spinner() -> Option<ProgressBar> {
    if !io::stderr().is_terminal() {
        return None;
    }
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .ok()?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let pb = ProgressBar::new_spinner().with_style(style);
    pb.set_message("Searching...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn print_collected(results: &[String], format: OutputFormat) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    match format {
        OutputFormat::Plain => {
            for path in results {
                writeln!(out, "{path}").map_err(RfindError::Output)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, results)
                .map_err(|e| RfindError::Output(e.into()))?;
            writeln!(out).map_err(RfindError::Output)?;
        }
    }
    out.flush().map_err(RfindError::Output)
}

fn print_summary(cli: &Cli, report: &SearchReport, start_time: Instant) {
    if !report.skipped.is_empty() {
        eprintln!("\n{}", "Errors encountered during traversal:".red().bold());
        for err in &report.skipped {
            eprintln!("{}", err.to_string().red());
        }
    }

    if cli.stats {
        eprintln!("\n{}", "Summary:".green().bold());
        eprintln!("{}: {}", "Engine".cyan(), report.engine);
        eprintln!("{}: {}", "Matches".cyan(), report.matches);
        eprintln!("{}: {}", "Skipped".cyan(), report.skipped.len());
        eprintln!("{}: {:.2?}", "Elapsed".cyan(), start_time.elapsed());
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let log_file = fs::File::create(log_path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| RfindError::Config(format!("logger: {e}")))?;
    Ok(())
}
