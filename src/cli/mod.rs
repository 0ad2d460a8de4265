//! CLI definition and handler

use crate::artifact::RpmQuerySource;
use crate::checks::CheckRegistry;
use crate::config::{ArtifactOverrides, ConfigStore, Configuration};
use crate::lint::{InterruptWatcher, Lint, LintError};
use crate::models::{exit_code, RunResult, RUN_SCOPE};
use crate::reporters::{self, OutputFormat};
use crate::sink::MessageSink;
use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Upper bound for one `rpm` query
const RPM_TIMEOUT: Duration = Duration::from_secs(120);

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// rpmlint - check RPM packages and spec files for common problems
#[derive(Parser, Debug)]
#[command(name = "rpmlint")]
#[command(
    version,
    about = "Check RPM packages and spec files for common problems",
    after_help = "\
Examples:
  rpmlint foo.spec                     Check a spec file
  rpmlint foo-1.0-1.x86_64.rpm         Check a package
  rpmlint ./RPMS/                      Check every package below a directory
  rpmlint bash                         Check an installed package
  rpmlint -e no-url-tag                Explain a message
  rpmlint -c strict.toml -r foo.rpmlintrc foo.src.rpm

Exit status: 0 clean, 64 errors found, 66 badness threshold exceeded,
2 usage or configuration error, 130 interrupted."
)]
pub struct Cli {
    /// Packages, spec files, directories or installed package names
    /// ("-" reads a spec file from stdin)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Additional configuration file, merged on top of the site configuration
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the explanation of the given message ids and exit
    #[arg(short = 'e', long, value_name = "ID", num_args = 1..)]
    pub explain: Vec<String>,

    /// Override file applied to every checked artifact
    #[arg(short = 'r', long, value_name = "FILE")]
    pub rpmlintrc: Option<PathBuf>,

    /// Follow each message with its explanation
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the resolved configuration and exit
    #[arg(short = 'p', long)]
    pub print_config: bool,

    /// Number of parallel workers (1-64, default from configuration)
    #[arg(short = 'j', long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Program used to query packages
    #[arg(long, env = "RPMLINT_RPM", default_value = "rpm", hide = true)]
    pub rpm: String,
}

/// Run the command line; returns the process exit status
pub fn run(cli: Cli) -> Result<i32> {
    let config = match ConfigStore::standard(cli.config.as_deref()).resolve() {
        Ok(config) => config,
        Err(e) => return Ok(fatal(&e.to_string())),
    };

    if cli.print_config {
        let text = config
            .print_configuration()
            .context("Failed to serialize configuration")?;
        print!("{}", text);
        return Ok(exit_code::OK);
    }

    if !cli.explain.is_empty() {
        print!("{}", explain(&config, &cli.explain));
        return Ok(exit_code::OK);
    }

    if cli.targets.is_empty() {
        eprintln!("{}: E: no packages or spec files given", RUN_SCOPE);
        eprintln!("Run 'rpmlint --help' for usage.");
        println!("{}", RunResult::default().summary_line());
        return Ok(exit_code::USAGE);
    }

    let overrides = match &cli.rpmlintrc {
        Some(path) => match ArtifactOverrides::load(path) {
            Ok(overrides) => overrides,
            Err(e) => return Ok(fatal(&e.to_string())),
        },
        None => ArtifactOverrides::default(),
    };

    let format = OutputFormat::from_str(&cli.format)?;
    let verbose = cli.verbose || config.settings().verbose;
    let source = RpmQuerySource::new(RPM_TIMEOUT).with_program(cli.rpm.clone());

    let cancel = CancellationToken::new();
    let _watcher = match InterruptWatcher::install(cancel.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Interrupts will not be handled: {}", e);
            None
        }
    };

    let bar = progress_bar();
    let progress_handle = bar.clone();
    let mut lint = Lint::new(config, Arc::new(source))
        .with_overrides(overrides)
        .verbose(verbose)
        .with_cancel_token(cancel)
        .with_progress(Box::new(move |target, done, total| {
            progress_handle.set_length(total as u64);
            progress_handle.set_position(done as u64);
            progress_handle.set_message(target.to_string());
        }));
    if let Some(workers) = cli.workers {
        lint = lint.with_workers(workers);
    }

    let result = lint.run(&cli.targets);
    bar.finish_and_clear();

    match result {
        Ok(result) => {
            if let Some(notice) = reporters::badness_notice(&result) {
                eprintln!("{}", notice);
            }
            let color = format == OutputFormat::Text && Term::stdout().is_term();
            print!("{}", reporters::report_with_format(&result, format, color)?);
            Ok(result.exit_code())
        }
        Err(LintError::Interrupted { target }) => {
            eprintln!("{}: E: interrupted, exiting while reading {}", RUN_SCOPE, target);
            Ok(exit_code::INTERRUPTED)
        }
        Err(e @ (LintError::Config(_) | LintError::Usage(_))) => Ok(fatal(&e.to_string())),
        Err(e @ LintError::Pool(_)) => Err(e.into()),
    }
}

/// Print a fatal diagnostic; no summary line follows
fn fatal(message: &str) -> i32 {
    eprintln!("{}: E: {}", RUN_SCOPE, message);
    exit_code::USAGE
}

/// Catalog text for each id, sorted; no check is ever run
pub fn explain(config: &Configuration, ids: &[String]) -> String {
    let mut registry = CheckRegistry::new();
    let mut sink = MessageSink::new(Arc::new(config.clone()));
    let all: Vec<String> = registry.available().map(str::to_string).collect();
    registry.load(&all, config, &mut sink);

    let mut ids: Vec<&String> = ids.iter().collect();
    ids.sort();
    ids.dedup();

    let mut out = String::new();
    for id in ids {
        out.push_str(&format!("{}:\n{}\n\n", id, sink.describe(id)));
    }
    out
}

/// Bar on stderr when it is a terminal, hidden otherwise
fn progress_bar() -> ProgressBar {
    if !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::UNKNOWN_MESSAGE;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "rpmlint",
            "-v",
            "-j",
            "2",
            "-c",
            "a.toml",
            "-r",
            "foo.rpmlintrc",
            "foo.spec",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.workers, Some(2));
        assert_eq!(cli.targets, vec!["foo.spec"]);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert_eq!(cli.rpmlintrc, Some(PathBuf::from("foo.rpmlintrc")));
    }

    #[test]
    fn test_explain_known_and_unknown() {
        let config = Configuration::builtin().unwrap();
        let out = explain(
            &config,
            &["no-such-id".to_string(), "infopage-not-compressed".to_string()],
        );

        let info = out.find("infopage-not-compressed:\n").unwrap();
        let unknown = out.find("no-such-id:\n").unwrap();
        assert!(info < unknown);
        assert!(out.contains("This info page is not compressed"));
        assert!(out.contains(UNKNOWN_MESSAGE));
    }
}
