use crate::aggregate::{AggregationOptions, BranchCounting};
use crate::balance::compute_balance;
use crate::cli::{AnalyzeArgs, CommonArgs};
use crate::collect::{run, RunOptions};
use crate::config::{build_window, parse_date, RunConfig};
use crate::model::{AnalysisOutput, SCHEMA_VERSION};
use crate::output::{output_balance, output_json, output_summary, write_daily_csv, write_volumes_csv};
use anyhow::Context;
use chrono::Utc;
use tracing::warn;

pub fn exec(common: CommonArgs, args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = RunConfig::load(&common.config_file);

    // The window must be valid before any repository is touched.
    let target = parse_date(&args.target_date).context("Invalid --target-date")?;
    let project_start = config
        .project_start()
        .context("Invalid project start date")?;
    let window = build_window(project_start, target, args.analysis_days)
        .context("Invalid analysis window")?;

    let options = RunOptions {
        aggregation: AggregationOptions {
            window,
            excluded: config.excluded(),
            aliases: config.aliases(),
            counting: if args.dedupe_commits {
                BranchCounting::UniqueCommits
            } else {
                BranchCounting::PerBranch
            },
        },
        fetch_timeout: (!args.no_fetch).then_some(args.fetch_timeout),
        cache_dir: args.cache.clone(),
        jobs: args.jobs.max(1),
        progress: !args.json,
    };

    let dataset = run(&common.student_folders, &options)
        .context("Failed to collect group statistics")?;
    if dataset.is_empty() {
        warn!(
            root = %common.student_folders.display(),
            "No group produced commits in the analysis window"
        );
    }

    let members = dataset.member_rows();
    let daily = dataset.daily_rows(&window.days());
    let balance = compute_balance(&dataset);

    write_volumes_csv(&args.output_csv, &members)
        .with_context(|| format!("Failed to write {}", args.output_csv.display()))?;
    write_daily_csv(&args.daily_csv, &daily)
        .with_context(|| format!("Failed to write {}", args.daily_csv.display()))?;

    if args.json {
        output_json(&AnalysisOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            student_folders: common.student_folders.to_string_lossy().to_string(),
            window,
            members,
            daily,
            balance,
        })?;
    } else {
        output_summary(&members, &balance, &args.thresholds.into())?;
        output_balance(&balance)?;
        println!(
            "\nAnalysis complete. Results written to {} and {}.",
            args.output_csv.display(),
            args.daily_csv.display()
        );
    }

    Ok(())
}
