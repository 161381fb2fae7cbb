//! Command-line interface for archscope.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::analyzer::{AnalyzeOptions, RepositoryAnalyzer};
use crate::config::AnalyzerConfig;
use crate::history::{HistoryIndex, DEFAULT_COCHANGE_THRESHOLD};
use crate::insights::Insights;
use crate::paths::relative_slash_path;
use crate::report::{self, FileHistoryReport};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ARCHSCOPE_LOG";

/// Reconstruct a repository's architecture.
///
/// Archscope resolves imports across JavaScript, TypeScript, Python, Java
/// and Go into a file dependency graph, flags files nothing imports, and
/// mines git history for ownership, churn and co-change.
#[derive(Parser)]
#[command(name = "archscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a repository
    Analyze(AnalyzeArgs),
    /// Show the git history of one file
    History(HistoryArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Repository root
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Consider test files in dead-code detection
    #[arg(long)]
    pub include_tests: bool,

    /// Skip co-change lookups
    #[arg(long)]
    pub no_cochange: bool,

    /// Files enriched with history concurrently
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Arguments for the history command.
#[derive(Parser)]
pub struct HistoryArgs {
    /// Repository root
    pub path: PathBuf,

    /// File to inspect, relative to the root
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Minimum co-change correlation
    #[arg(long, default_value_t = DEFAULT_COCHANGE_THRESHOLD)]
    pub threshold: f64,
}

/// Install the stderr log subscriber.
///
/// `ARCHSCOPE_LOG` wins when set; otherwise `-v` picks the level.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(mut config: AnalyzerConfig, args: &AnalyzeArgs) -> anyhow::Result<AnalyzerConfig> {
    if args.include_tests {
        config.include_tests = true;
    }
    if args.no_cochange {
        config.cochange = false;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;
    Ok(config)
}

/// Run the analyze command.
pub async fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let config = AnalyzerConfig::load(&args.path, args.config.as_deref())
        .context("loading configuration")?;
    let config = apply_overrides(config, args)?;
    let options = AnalyzeOptions::from(&config);

    let analyzer = RepositoryAnalyzer::new(&args.path, config)?;
    let result = analyzer.analyze(&options).await?;
    let insights = Insights::from_result(&result);

    match args.format {
        OutputFormat::Json => report::write_json(&result, &insights)?,
        OutputFormat::Text => report::write_pretty(&result, &insights),
    }

    Ok(EXIT_SUCCESS)
}

/// Run the history command.
pub async fn run_history(args: &HistoryArgs) -> anyhow::Result<i32> {
    if !args.path.is_dir() {
        anyhow::bail!("not a directory: {}", args.path.display());
    }

    let history = HistoryIndex::new(&args.path);
    history.check_repository().await?;

    let file = resolve_file_arg(history.root(), &args.file);
    let report = FileHistoryReport {
        file: relative_slash_path(history.root(), &file)
            .unwrap_or_else(|| args.file.display().to_string()),
        ownership: history.file_ownership(&file).await,
        change_frequency: history.change_frequency(&file).await,
        co_changes: history.files_changed_together(&file, args.threshold).await,
        commits: history.file_history(&file).await,
    };

    match args.format {
        OutputFormat::Json => report::write_history_json(&report)?,
        OutputFormat::Text => report::write_history_pretty(&report),
    }

    Ok(EXIT_SUCCESS)
}

/// Absolute file arguments are canonicalized so they line up with the root.
fn resolve_file_arg(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf())
    } else {
        root.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::parse_from([
            "archscope",
            "-vv",
            "analyze",
            "repo",
            "--format",
            "json",
            "--no-cochange",
            "--batch-size",
            "3",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.no_cochange);

        let config = apply_overrides(AnalyzerConfig::default(), &args).unwrap();
        assert!(!config.cochange);
        assert_eq!(config.batch_size, 3);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let cli = Cli::parse_from(["archscope", "analyze", "repo", "--batch-size", "0"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(apply_overrides(AnalyzerConfig::default(), &args).is_err());
    }
}
