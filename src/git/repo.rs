use crate::error::{GroupStatError, Result};
use crate::git::diff::line_changes;
use crate::model::LineStats;
use crate::util::local_day;
use chrono::NaiveDate;
use gix::object::tree::diff::ChangeDetached;
use gix::remote::Direction;
use gix::{ObjectId, Repository};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Remote preferred for fetching and remote-tracking branches.
pub const ORIGIN: &str = "origin";

const REMOTES_PREFIX: &str = "refs/remotes/";

pub struct GroupRepo {
    repo: Repository,
    path: PathBuf,
}

/// A branch to traverse: a local branch or a remote-tracking ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub tip: ObjectId,
}

/// What the aggregator needs to know about a commit before diffing it.
#[derive(Debug, Clone)]
pub struct CommitHeader {
    pub id: ObjectId,
    pub author_name: String,
    /// Committer date in the committer's time zone.
    pub day: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub short_id: String,
    pub summary: String,
}

fn git_err(e: impl std::fmt::Display) -> GroupStatError {
    GroupStatError::GitRepo(e.to_string())
}

fn sync_err(e: impl std::fmt::Display) -> GroupStatError {
    GroupStatError::Sync(e.to_string())
}

impl GroupRepo {
    /// Opens the working copy at `path`.
    ///
    /// Returns `Ok(None)` when `path` has no `.git` directory.
    ///
    /// Updating remote-tracking refs writes reflog entries, which need a
    /// committer; a placeholder is set in memory when none is configured.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        if !path.join(".git").is_dir() {
            return Ok(None);
        }
        let mut repo = gix::open(path)?;
        repo.committer_or_set_generic_fallback()?;
        Ok(Some(Self {
            repo,
            path: path.to_path_buf(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `origin` if configured, otherwise the first remote by name.
    pub fn tracking_remote(&self) -> Option<String> {
        let names: Vec<String> = self
            .repo
            .remote_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        if names.iter().any(|n| n == ORIGIN) {
            return Some(ORIGIN.to_string());
        }
        names.into_iter().next()
    }

    /// Fetches the tracking remote, giving up after `timeout`.
    pub fn sync_remote(&self, timeout: Duration) -> Result<()> {
        let name = self
            .tracking_remote()
            .ok_or_else(|| GroupStatError::Sync("no remote configured".to_string()))?;

        let interrupt = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let watchdog = {
            let flag = Arc::clone(&interrupt);
            thread::spawn(move || {
                if let Err(mpsc::RecvTimeoutError::Timeout) = done_rx.recv_timeout(timeout) {
                    flag.store(true, Ordering::Relaxed);
                }
            })
        };

        let result = self.fetch(&name, &interrupt);
        drop(done_tx);
        let _ = watchdog.join();

        if result.is_err() && interrupt.load(Ordering::Relaxed) {
            return Err(GroupStatError::Sync(format!(
                "fetching '{name}' timed out after {}",
                humantime::format_duration(timeout)
            )));
        }
        result
    }

    fn fetch(&self, name: &str, interrupt: &AtomicBool) -> Result<()> {
        let remote = self.repo.find_remote(name).map_err(sync_err)?;
        remote
            .connect(Direction::Fetch)
            .map_err(sync_err)?
            .prepare_fetch(gix::progress::Discard, Default::default())
            .map_err(sync_err)?
            .receive(gix::progress::Discard, interrupt)
            .map_err(sync_err)?;
        Ok(())
    }

    /// Local branches followed by the tracking remote's branches.
    ///
    /// Branches sharing history are all returned; symbolic refs such as
    /// `origin/HEAD` are skipped since they alias another branch.
    pub fn branches(&self) -> Result<Vec<BranchRef>> {
        let platform = self.repo.references().map_err(git_err)?;
        let mut branches = Vec::new();

        for reference in platform.local_branches().map_err(git_err)? {
            let reference = reference.map_err(git_err)?;
            if let Some(tip) = reference.try_id() {
                branches.push(BranchRef {
                    name: reference.name().shorten().to_string(),
                    tip: tip.detach(),
                });
            }
        }

        if let Some(remote) = self.tracking_remote() {
            let prefix = format!("{REMOTES_PREFIX}{remote}/");
            for reference in platform.remote_branches().map_err(git_err)? {
                let reference = reference.map_err(git_err)?;
                let full_name = reference.name().as_bstr().to_string();
                if !full_name.starts_with(&prefix) {
                    continue;
                }
                if let Some(tip) = reference.try_id() {
                    branches.push(BranchRef {
                        name: full_name[REMOTES_PREFIX.len()..].to_string(),
                        tip: tip.detach(),
                    });
                }
            }
        }

        Ok(branches)
    }

    /// Every commit reachable from the branch tip, each visited once.
    pub fn branch_commits(&self, branch: &BranchRef) -> Result<Vec<CommitHeader>> {
        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([branch.tip]);

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let time = commit.time()?;
            let day = local_day(time.seconds, time.offset).ok_or_else(|| {
                GroupStatError::InvalidDate(format!("Invalid timestamp: {}", time.seconds))
            })?;
            let author = commit.author()?;

            commits.push(CommitHeader {
                id: commit_id,
                author_name: author.name.to_string(),
                day,
            });

            stack.extend(commit.parent_ids().map(|id| id.detach()));
        }

        Ok(commits)
    }

    /// Lines inserted and deleted by a commit relative to its first parent,
    /// or to the empty tree for a root commit.
    ///
    /// Renames are not detected: a moved file counts as deleted then added.
    pub fn line_stats(&self, commit_id: ObjectId) -> Result<LineStats> {
        let commit = self.repo.find_commit(commit_id)?;
        let commit_tree = commit.tree()?;
        let parent_tree = match commit.parent_ids().next() {
            Some(parent_id) => Some(self.repo.find_commit(parent_id.detach())?.tree()?),
            None => None,
        };

        let options = gix::diff::Options::default().with_rewrites(None);
        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), options)?;

        let mut total = LineStats::default();
        for change in changes {
            let stats = self.change_stats(change)?;
            total.insertions += stats.insertions;
            total.deletions += stats.deletions;
        }
        Ok(total)
    }

    fn change_stats(&self, change: ChangeDetached) -> Result<LineStats> {
        let (old_id, new_id, mode) = match change {
            ChangeDetached::Addition { entry_mode, id, .. } => (None, Some(id), entry_mode),
            ChangeDetached::Deletion { entry_mode, id, .. } => (Some(id), None, entry_mode),
            ChangeDetached::Modification {
                previous_id,
                entry_mode,
                id,
                ..
            } => (Some(previous_id), Some(id), entry_mode),
            ChangeDetached::Rewrite {
                source_id,
                entry_mode,
                id,
                ..
            } => (Some(source_id), Some(id), entry_mode),
        };

        // Directories and submodules carry no lines of their own.
        if mode.is_tree() || mode.is_commit() {
            return Ok(LineStats::default());
        }

        let old = self.blob_data(old_id)?;
        let new = self.blob_data(new_id)?;
        Ok(line_changes(&old, &new))
    }

    fn blob_data(&self, id: Option<ObjectId>) -> Result<Vec<u8>> {
        match id {
            Some(id) => Ok(self.repo.find_object(id)?.detach().data),
            None => Ok(Vec::new()),
        }
    }

    /// The most recent commits reachable from HEAD.
    pub fn recent_commits(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut head = self.repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;

        let walk = self.repo.rev_walk([head_commit.id]).all().map_err(git_err)?;
        let mut entries = Vec::with_capacity(limit);
        for info in walk.take(limit) {
            let info = info.map_err(git_err)?;
            let commit = self.repo.find_commit(info.id)?;
            let message = commit.message()?;
            entries.push(LogEntry {
                short_id: info.id.to_hex_with_len(7).to_string(),
                summary: message.title.to_string(),
            });
        }
        Ok(entries)
    }
}
