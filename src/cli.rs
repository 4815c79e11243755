use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Longest window accepted after the target date, about ten years.
pub const MAX_ANALYSIS_DAYS: i64 = 3660;

#[derive(Parser)]
#[command(name = "groupstat")]
#[command(about = "Per-author commit statistics across student group repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(
        long,
        default_value = "fake_project_example",
        help = "Directory containing one folder per group"
    )]
    pub student_folders: PathBuf,

    #[arg(long, default_value = "sample_config.json", help = "Path to the JSON configuration file")]
    pub config_file: PathBuf,

    #[arg(long, short, global = true, help = "Log progress at info level")]
    pub verbose: bool,
}

#[derive(Args, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "2025-02-1", help = "Target date (YYYY-MM-DD)")]
    pub target_date: String,

    #[arg(
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(0..=MAX_ANALYSIS_DAYS),
        help = "Number of days analyzed after the target date"
    )]
    pub analysis_days: u32,

    #[arg(long, default_value = "total_member_volumes.csv", help = "CSV for global statistics")]
    pub output_csv: PathBuf,

    #[arg(long, default_value = "daily_stats.csv", help = "CSV for daily statistics")]
    pub daily_csv: PathBuf,

    #[arg(long, help = "Count a commit once even when several branches reach it")]
    pub dedupe_commits: bool,

    #[arg(long, help = "Do not fetch remotes before counting")]
    pub no_fetch: bool,

    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, help = "Give up fetching a remote after this long")]
    pub fetch_timeout: Duration,

    #[arg(long, default_value_t = 1, help = "Number of groups processed in parallel")]
    pub jobs: usize,

    #[arg(long, help = "Directory of the commit statistics cache")]
    pub cache: Option<PathBuf>,

    #[clap(flatten)]
    pub thresholds: ThresholdArgs,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ThresholdArgs {
    #[arg(long, default_value_t = 10, help = "Low activity threshold")]
    pub low_threshold: u64,

    #[arg(long, default_value_t = 30, help = "Medium activity threshold")]
    pub medium_threshold: u64,

    #[arg(long, default_value_t = 100, help = "High activity threshold")]
    pub high_threshold: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count commits of every group and write the CSV files
    Analyze(AnalyzeArgs),
    /// Print the summary and balance of a previously written volumes CSV
    Report {
        #[arg(long, default_value = "total_member_volumes.csv", help = "CSV for global statistics")]
        output_csv: PathBuf,

        #[clap(flatten)]
        thresholds: ThresholdArgs,

        #[arg(long, help = "Output balance as JSON")]
        json: bool,
    },
    /// Fetch every repository of every group
    Sync {
        #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, help = "Give up fetching a remote after this long")]
        fetch_timeout: Duration,

        #[arg(long, help = "Show this many recent commits per repository")]
        log: Option<usize>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze(args) => crate::analyze::exec(self.common, args),
            Commands::Report {
                output_csv,
                thresholds,
                json,
            } => crate::report::exec(&output_csv, thresholds.into(), json),
            Commands::Sync { fetch_timeout, log } => {
                crate::sync::exec(&self.common, fetch_timeout, log)
            }
        }
    }
}

impl From<ThresholdArgs> for crate::output::Thresholds {
    fn from(args: ThresholdArgs) -> Self {
        Self {
            low: args.low_threshold,
            medium: args.medium_threshold,
            high: args.high_threshold,
        }
    }
}
