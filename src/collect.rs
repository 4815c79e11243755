use crate::aggregate::{aggregate_repository, AggregationOptions};
use crate::cache::StatsCache;
use crate::error::{GroupStatError, Result};
use crate::git::GroupRepo;
use crate::model::{GroupDataset, GroupStats};
use crate::util::{dir_name, subdirectories};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One folder under the root: a group label and the repository it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFolder {
    pub name: String,
    pub path: PathBuf,
    /// First subdirectory by name, if any.
    pub repo_path: Option<PathBuf>,
}

/// Everything a run needs besides the root folder.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub aggregation: AggregationOptions,
    /// Fetch the tracking remote before counting, bounded by this timeout.
    pub fetch_timeout: Option<Duration>,
    pub cache_dir: Option<PathBuf>,
    /// Number of groups processed at once.
    pub jobs: usize,
    pub progress: bool,
}

/// Group folders under `root`, sorted by name.
pub fn discover_groups(root: &Path) -> Result<Vec<GroupFolder>> {
    if !root.is_dir() {
        return Err(GroupStatError::Config(format!(
            "Student folders directory {} does not exist",
            root.display()
        )));
    }

    let mut groups = Vec::new();
    for path in subdirectories(root)? {
        let repo_path = repository_folders(&path).into_iter().next();
        groups.push(GroupFolder {
            name: dir_name(&path),
            path,
            repo_path,
        });
    }
    Ok(groups)
}

/// Subdirectories of a group folder, sorted by name. An unreadable folder is
/// logged and treated as holding no repository.
pub fn repository_folders(group_path: &Path) -> Vec<PathBuf> {
    match subdirectories(group_path) {
        Ok(dirs) => dirs,
        Err(e) => {
            warn!(path = %group_path.display(), "Unable to list group folder: {e}");
            Vec::new()
        }
    }
}

/// Aggregates every group under `root` into one dataset.
///
/// Per-group problems are logged and leave the group out of the dataset;
/// only an unusable root folder or thread pool fails the run.
pub fn run(root: &Path, options: &RunOptions) -> Result<GroupDataset> {
    let groups = discover_groups(root)?;

    let pb = if options.progress {
        let pb = ProgressBar::new(groups.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let process = |folder: &GroupFolder| {
        pb.set_message(folder.name.clone());
        let stats = process_group(folder, options);
        pb.inc(1);
        stats
    };

    let partials: Vec<GroupStats> = if options.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .map_err(|e| GroupStatError::Config(format!("Cannot start {} workers: {e}", options.jobs)))?;
        pool.install(|| groups.par_iter().map(process).collect())
    } else {
        groups.iter().map(process).collect()
    };

    pb.finish_and_clear();
    Ok(GroupDataset::from_partials(partials))
}

/// Aggregates a single group folder. Never fails: a missing or unreadable
/// repository yields empty statistics.
pub fn process_group(folder: &GroupFolder, options: &RunOptions) -> GroupStats {
    let Some(repo_path) = &folder.repo_path else {
        info!(group = %folder.name, "No repository folder, skipping");
        return GroupStats::new(&folder.name);
    };

    let repo = match GroupRepo::open(repo_path) {
        Ok(Some(repo)) => repo,
        Ok(None) => {
            warn!(group = %folder.name, path = %repo_path.display(), "Not a git repository");
            return GroupStats::new(&folder.name);
        }
        Err(e) => {
            warn!(group = %folder.name, path = %repo_path.display(), "Unable to open repository: {e}");
            return GroupStats::new(&folder.name);
        }
    };

    if let Some(timeout) = options.fetch_timeout {
        if let Err(e) = repo.sync_remote(timeout) {
            debug!(group = %folder.name, "Remote sync skipped: {e}");
        }
    }

    let cache = options.cache_dir.as_deref().and_then(|dir| match StatsCache::open(dir) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(path = %dir.display(), "Commit stats cache disabled: {e}");
            None
        }
    });

    let stats = aggregate_repository(&repo, &folder.name, &options.aggregation, cache);
    if stats.is_empty() {
        info!(group = %folder.name, path = %repo_path.display(), "No data found");
    } else {
        info!(
            group = %folder.name,
            members = stats.members.len(),
            commits = stats.total_commits(),
            "Group aggregated"
        );
    }
    stats
}
