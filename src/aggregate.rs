use crate::alias::{AliasTable, ExcludedAuthors};
use crate::cache::StatsCache;
use crate::error::Result;
use crate::git::{BranchRef, GroupRepo};
use crate::model::{AnalysisWindow, GroupStats, LineStats};
use gix::ObjectId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// How commits reachable from several branches are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BranchCounting {
    /// Each branch traversal counts every commit it reaches, so shared
    /// history is counted once per branch.
    #[default]
    PerBranch,
    /// A commit id is counted at most once per repository.
    UniqueCommits,
}

/// Read-only inputs shared by every group of a run.
#[derive(Debug, Clone)]
pub struct AggregationOptions {
    pub window: AnalysisWindow,
    pub excluded: ExcludedAuthors,
    pub aliases: AliasTable,
    pub counting: BranchCounting,
}

/// Accumulates the commits of one repository into a group's statistics.
pub struct RepoAggregator<'a> {
    repo: &'a GroupRepo,
    options: &'a AggregationOptions,
    cache: Option<StatsCache>,
    computed: HashMap<ObjectId, LineStats>,
    pending: Vec<(String, LineStats)>,
    counted: HashSet<ObjectId>,
    stats: GroupStats,
}

impl<'a> RepoAggregator<'a> {
    pub fn new(repo: &'a GroupRepo, group: &str, options: &'a AggregationOptions) -> Self {
        Self {
            repo,
            options,
            cache: None,
            computed: HashMap::new(),
            pending: Vec::new(),
            counted: HashSet::new(),
            stats: GroupStats::new(group),
        }
    }

    pub fn with_cache(mut self, cache: Option<StatsCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Adds the qualifying commits of one branch and returns how many were
    /// counted. On error nothing from this branch is kept.
    pub fn aggregate_branch(&mut self, branch: &BranchRef) -> Result<usize> {
        let headers = self.repo.branch_commits(branch)?;
        let dedupe = self.options.counting == BranchCounting::UniqueCommits;

        let mut branch_stats = GroupStats::new(self.stats.group.clone());
        let mut branch_ids = Vec::new();

        for header in headers {
            if !self.options.window.contains(header.day) {
                continue;
            }
            if self.options.excluded.contains(&header.author_name) {
                continue;
            }
            if dedupe && self.counted.contains(&header.id) {
                continue;
            }

            let author = self
                .options
                .aliases
                .resolve(&header.author_name, &self.stats.group);
            let line_stats = self.line_stats(header.id)?;
            branch_stats
                .members
                .entry(author)
                .or_default()
                .record(header.day, line_stats);
            branch_ids.push(header.id);
        }

        let counted = branch_ids.len();
        if dedupe {
            self.counted.extend(branch_ids);
        }
        for (author, stats) in branch_stats.members {
            self.stats.members.entry(author).or_default().absorb(stats);
        }
        Ok(counted)
    }

    fn line_stats(&mut self, id: ObjectId) -> Result<LineStats> {
        if let Some(stats) = self.computed.get(&id) {
            return Ok(*stats);
        }

        let key = id.to_string();
        let cached = match &self.cache {
            Some(cache) => cache.get(&key).unwrap_or_else(|e| {
                debug!(commit = %key, "Cache lookup failed: {e}");
                None
            }),
            None => None,
        };

        let stats = match cached {
            Some(stats) => stats,
            None => {
                let stats = self.repo.line_stats(id)?;
                if self.cache.is_some() {
                    self.pending.push((key, stats));
                }
                stats
            }
        };
        self.computed.insert(id, stats);
        Ok(stats)
    }

    pub fn finish(mut self) -> GroupStats {
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.store(&self.pending) {
                warn!(group = %self.stats.group, "Failed to store commit stats in cache: {e}");
            }
        }
        self.stats
    }
}

/// Aggregates every branch of `repo` under `group`.
///
/// A branch that cannot be traversed is logged and skipped; the others are
/// still counted.
pub fn aggregate_repository(
    repo: &GroupRepo,
    group: &str,
    options: &AggregationOptions,
    cache: Option<StatsCache>,
) -> GroupStats {
    let branches = match repo.branches() {
        Ok(branches) => branches,
        Err(e) => {
            warn!(group, repo = %repo.path().display(), "Unable to list branches: {e}");
            return GroupStats::new(group);
        }
    };

    let mut aggregator = RepoAggregator::new(repo, group, options).with_cache(cache);
    for branch in &branches {
        match aggregator.aggregate_branch(branch) {
            Ok(counted) => debug!(group, branch = %branch.name, counted, "Branch aggregated"),
            Err(e) => warn!(
                group,
                branch = %branch.name,
                repo = %repo.path().display(),
                "Error on branch: {e}"
            ),
        }
    }
    aggregator.finish()
}
