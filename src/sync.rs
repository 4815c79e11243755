use crate::cli::CommonArgs;
use crate::collect::{discover_groups, repository_folders};
use crate::git::GroupRepo;
use anyhow::Context;
use console::style;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Fetches every repository folder of every group, optionally listing their
/// latest commits.
pub fn exec(common: &CommonArgs, fetch_timeout: Duration, log: Option<usize>) -> anyhow::Result<()> {
    let groups = discover_groups(&common.student_folders)
        .context("Failed to list group folders")?;

    for group in groups {
        println!("{}", style(format!("Group: {}", group.name)).bold());
        println!("{}", "─".repeat(60));

        let repo_dirs = repository_folders(&group.path);
        if repo_dirs.is_empty() {
            println!("  no repository folder");
        }
        for repo_dir in repo_dirs {
            sync_one(&repo_dir, fetch_timeout, log);
        }
        println!();
    }
    Ok(())
}

fn sync_one(path: &Path, fetch_timeout: Duration, log: Option<usize>) {
    let repo = match GroupRepo::open(path) {
        Ok(Some(repo)) => repo,
        Ok(None) => {
            warn!(path = %path.display(), "Not a git repository");
            return;
        }
        Err(e) => {
            warn!(path = %path.display(), "Unable to open repository: {e}");
            return;
        }
    };

    match repo.sync_remote(fetch_timeout) {
        Ok(()) => println!("  {} {}", style("fetched").green(), path.display()),
        Err(e) => println!("  {} {}: {e}", style("not fetched").red(), path.display()),
    }

    if let Some(limit) = log {
        match repo.recent_commits(limit) {
            Ok(entries) => {
                for entry in entries {
                    println!("    {} {}", style(entry.short_id).yellow(), entry.summary);
                }
            }
            Err(e) => warn!(path = %path.display(), "Unable to read recent commits: {e}"),
        }
    }
}
