//! Accelerated search through the host's `find`, post-filtered by `perl`.
//!
//! The planner looks for the tools once, translates a [`SearchConfig`] into
//! an equivalent shell pipeline and forwards each reported path to the sink.
//! Paths travel NUL-terminated end to end, so any byte but NUL may appear in
//! a name. Any failure is reported as [`RfindError::DelegationUnavailable`]
//! so the caller can fall back to the in-process walk.
use crate::error::{Result, RfindError};
use crate::options::{AccelerationMode, SearchConfig};
use crate::platform::{is_gnu_host, ExecutableLocator, StandardLocations};
use crate::predicate::MatchPredicate;
use crate::sink::Sink;
use log::debug;
use std::cell::OnceCell;
use std::ffi::OsString;
use std::fmt::{self, Write as _};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

pub const ENV_FIND: &str = "RFIND_FIND";
pub const ENV_PERL: &str = "RFIND_PERL";
pub const ENV_ROOT: &str = "RFIND_ROOT";
pub const ENV_PATTERN: &str = "RFIND_PATTERN";
pub const ENV_EXCLUDE: &str = "RFIND_EXCLUDE";

/// Resolved locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub shell: PathBuf,
    pub find: PathBuf,
    pub perl: PathBuf,
}

impl Toolchain {
    pub fn discover(locator: &dyn ExecutableLocator) -> Option<Self> {
        Some(Self {
            shell: locator.find_executable("bash")?,
            find: locator.find_executable("find")?,
            perl: locator.find_executable("perl")?,
        })
    }
}

/// A shell script plus the environment it reads its inputs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateCommand {
    pub shell: PathBuf,
    pub script: String,
    pub env: Vec<(&'static str, OsString)>,
}

impl DelegateCommand {
    pub fn env_value(&self, key: &str) -> Option<&OsString> {
        self.env.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl fmt::Display for DelegateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={:?} ", key, value.to_string_lossy())?;
        }
        write!(f, "{} -c '{}'", self.shell.display(), self.script)
    }
}

/// Lazily produced NUL-terminated output records, terminators removed. A
/// process fault shows up as a final `Err`.
pub type LineStream = Box<dyn Iterator<Item = io::Result<String>>>;

pub trait CommandRunner {
    fn run(&self, command: &DelegateCommand) -> io::Result<LineStream>;
}

/// Runs the command as `shell -c script` with stdout piped and split on NUL.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &DelegateCommand) -> io::Result<LineStream> {
        let mut child = Command::new(&command.shell)
            .arg("-c")
            .arg(&command.script)
            .envs(command.env.iter().map(|(k, v)| (*k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;

        Ok(Box::new(ChildLines {
            child,
            reader: BufReader::new(stdout),
            done: false,
        }))
    }
}

struct ChildLines {
    child: Child,
    reader: BufReader<ChildStdout>,
    done: bool,
}

impl ChildLines {
    fn abort(&mut self) {
        self.done = true;
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Iterator for ChildLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\0', &mut buf) {
            Ok(0) => {
                self.done = true;
                match self.child.wait() {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(Err(io::Error::other(format!(
                        "external search exited with {status}"
                    )))),
                    Err(err) => Some(Err(err)),
                }
            }
            Ok(_) => {
                if buf.last() == Some(&b'\0') {
                    buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(err) => {
                self.abort();
                Some(Err(err))
            }
        }
    }
}

impl Drop for ChildLines {
    fn drop(&mut self) {
        if !self.done {
            self.abort();
        }
    }
}

/// Decides on and drives delegated searches. Holds the cached toolchain lookup.
pub struct DelegationPlanner {
    locator: Box<dyn ExecutableLocator>,
    runner: Box<dyn CommandRunner>,
    host_compatible: bool,
    toolchain: OnceCell<Option<Toolchain>>,
}

impl DelegationPlanner {
    pub fn new(
        locator: Box<dyn ExecutableLocator>,
        runner: Box<dyn CommandRunner>,
        host_compatible: bool,
    ) -> Self {
        Self {
            locator,
            runner,
            host_compatible,
            toolchain: OnceCell::new(),
        }
    }

    /// Use the real host, looking for tools in `search_path`.
    pub fn system(search_path: Vec<PathBuf>) -> Self {
        Self::new(
            Box::new(StandardLocations::new(search_path)),
            Box::new(SystemRunner),
            is_gnu_host(),
        )
    }

    /// A planner whose toolchain lookup is fixed up front.
    pub fn with_toolchain(toolchain: Option<Toolchain>, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            locator: Box::new(StandardLocations::default()),
            runner,
            host_compatible: toolchain.is_some(),
            toolchain: OnceCell::from(toolchain),
        }
    }

    /// A planner that never accelerates.
    pub fn disabled() -> Self {
        Self::with_toolchain(None, Box::new(SystemRunner))
    }

    /// The toolchain, looked up on first use.
    pub fn toolchain(&self) -> Option<&Toolchain> {
        self.toolchain
            .get_or_init(|| {
                if !self.host_compatible {
                    debug!("Host platform is not GNU-compatible; acceleration disabled");
                    return None;
                }
                let found = Toolchain::discover(self.locator.as_ref())
                    .filter(|tools| self.is_gnu_find(tools));
                match &found {
                    Some(tools) => debug!("Found delegate toolchain: {tools:?}"),
                    None => debug!("bash, GNU find or perl missing; acceleration disabled"),
                }
                found
            })
            .as_ref()
    }

    /// The pipeline relies on GNU-only primaries such as `-xtype`.
    fn is_gnu_find(&self, tools: &Toolchain) -> bool {
        let command = DelegateCommand {
            shell: tools.shell.clone(),
            script: format!("\"${ENV_FIND}\" --version"),
            env: vec![(ENV_FIND, tools.find.clone().into_os_string())],
        };
        let output = self
            .runner
            .run(&command)
            .and_then(|records| records.collect::<io::Result<Vec<_>>>());
        match output {
            Ok(records) => {
                let gnu = records.iter().any(|text| text.contains("GNU findutils"));
                if !gnu {
                    debug!("{} is not GNU find", tools.find.display());
                }
                gnu
            }
            Err(err) => {
                debug!("{} --version failed: {err}", tools.find.display());
                false
            }
        }
    }

    pub fn can_accelerate(&self) -> bool {
        self.toolchain().is_some()
    }

    /// Whether the mode asks for delegation and the pipeline can reproduce
    /// the in-process results for `config`.
    pub fn wants_acceleration(config: &SearchConfig) -> bool {
        let asked = match config.acceleration() {
            AccelerationMode::Always => true,
            AccelerationMode::Never => false,
            AccelerationMode::Pattern => !config.predicate().is_accept_all(),
        };
        asked && expressible(config).is_ok()
    }

    pub fn plan(&self, config: &SearchConfig, root: &Path) -> Result<DelegateCommand> {
        expressible(config).map_err(|reason| RfindError::DelegationUnavailable(reason.to_string()))?;
        let tools = self.toolchain().ok_or_else(|| {
            RfindError::DelegationUnavailable(
                "bash, GNU find and perl are required on a GNU-compatible host".to_string(),
            )
        })?;
        Ok(build_command(tools, config, root))
    }

    /// Run the delegated search for `root`, forwarding paths to `sink`.
    /// Returns how many were delivered.
    pub fn execute(&self, config: &SearchConfig, root: &Path, sink: &mut Sink<'_>) -> Result<usize> {
        let command = self.plan(config, root)?;
        debug!("Executing: {command}");

        let records = self.runner.run(&command).map_err(|err| {
            RfindError::DelegationUnavailable(format!(
                "failed to start {}: {err}",
                command.shell.display()
            ))
        })?;

        let predicate = config.predicate();
        let mut delivered = 0;
        for record in records {
            let path = record.map_err(|err| RfindError::DelegationUnavailable(err.to_string()))?;
            // perl's dialect is looser in places (`$` before a final
            // newline, full case folding); the compiled predicate decides.
            if !predicate.accept(&path) {
                debug!("Dropping delegated path rejected by the predicate: {path:?}");
                continue;
            }
            if sink.receive(&path).map_err(RfindError::Output)? {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}

/// `Err` with the reason when the pipeline cannot match the walk exactly.
fn expressible(config: &SearchConfig) -> std::result::Result<(), &'static str> {
    if config.excluded().is_empty() {
        return Ok(());
    }
    if config.follow_symlinks() {
        // Links into an excluded directory are only caught by identity.
        return Err("exclusions are matched by identity when following links");
    }
    if config
        .excluded()
        .iter()
        .any(|dir| dir.as_os_str().as_encoded_bytes().contains(&b'\n'))
    {
        return Err("an excluded path contains a newline");
    }
    Ok(())
}

fn build_command(tools: &Toolchain, config: &SearchConfig, root: &Path) -> DelegateCommand {
    let follow = config.follow_symlinks();
    let mut script = format!("set -o pipefail; \"${ENV_FIND}\" ");
    if follow {
        script.push_str("-L ");
    }
    let _ = write!(script, "\"${ENV_ROOT}\"");
    if config.min_depth() != 0 {
        let _ = write!(script, " -mindepth {}", config.min_depth());
    }
    if let Some(max) = config.max_depth() {
        let _ = write!(script, " -maxdepth {max}");
    }

    // -xtype looks through a link the way the in-process classifier does.
    let dir_test = if follow { "-type d" } else { "-xtype d" };
    match (config.include_directories(), config.include_files()) {
        (true, true) => {}
        (true, false) => {
            let _ = write!(script, " \\( {dir_test} \\)");
        }
        (false, true) => {
            let _ = write!(script, " \\! {dir_test}");
        }
        (false, false) => script.push_str(" -false"),
    }
    script.push_str(" -print0");

    // Only directories the walk can actually reach prune anything; an
    // excluded ancestor of the root never does.
    let excluded: Vec<&PathBuf> = config
        .excluded()
        .iter()
        .filter(|dir| dir.starts_with(root))
        .collect();

    let mut env = vec![
        (ENV_FIND, tools.find.clone().into_os_string()),
        (ENV_ROOT, root.as_os_str().to_os_string()),
    ];

    if let Some(filter) = perl_filter(config.predicate(), !excluded.is_empty()) {
        let _ = write!(
            script,
            " | \"${ENV_PERL}\" -0 -Mfeature=unicode_strings -ne '{filter}'"
        );
        env.push((ENV_PERL, tools.perl.clone().into_os_string()));
        if let Some(regex) = config.predicate().regex() {
            env.push((ENV_PATTERN, OsString::from(regex.as_str())));
        }
        if !excluded.is_empty() {
            let mut joined = OsString::new();
            for (i, dir) in excluded.iter().enumerate() {
                if i > 0 {
                    joined.push("\n");
                }
                joined.push(dir.as_os_str());
            }
            env.push((ENV_EXCLUDE, joined));
        }
    }

    DelegateCommand {
        shell: tools.shell.clone(),
        script,
        env,
    }
}

/// Perl program for the `-0ne` post-filter, or `None` when every path passes.
/// Must not contain a single quote.
///
/// Exclusion prefixes are compared on raw bytes. The pattern is matched
/// against the UTF-8 decoded path and printed back undecoded.
fn perl_filter(predicate: &MatchPredicate, excluding: bool) -> Option<String> {
    if !excluding && predicate.is_accept_all() {
        return None;
    }

    let mut perl = String::from("BEGIN { ");
    if !predicate.is_accept_all() {
        let _ = write!(
            perl,
            "$pat = $ENV{{{ENV_PATTERN}}}; utf8::decode($pat); $re = qr/$pat/; "
        );
    }
    if excluding {
        let _ = write!(
            perl,
            "@ex = grep {{ length }} split /\\n/, $ENV{{{ENV_EXCLUDE}}}; "
        );
        perl.push_str("for (@ex) { $_ .= \"/\" unless substr($_, -1) eq \"/\" } ");
    }
    perl.push_str("} chomp; ");
    if excluding {
        // An excluded root (even `/`) is still reported itself.
        perl.push_str("$p = $_; next if grep { $p ne $_ && index($p, $_) == 0 } @ex; ");
    }
    match predicate {
        MatchPredicate::AcceptAll => {}
        MatchPredicate::AcceptIfMatches(_) => {
            perl.push_str("$u = $_; utf8::decode($u); next unless $u =~ $re; ")
        }
        MatchPredicate::RejectIfMatches(_) => {
            perl.push_str("$u = $_; utf8::decode($u); next if $u =~ $re; ")
        }
    }
    perl.push_str("print \"$_\\0\";");
    Some(perl)
}
