use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// Lines inserted and deleted by a single commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub insertions: u64,
    pub deletions: u64,
}

/// Activity of one author on one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub commits: u64,
    pub insertions: u64,
    pub deletions: u64,
}

impl DailyMetric {
    pub fn add_commit(&mut self, stats: LineStats) {
        self.commits += 1;
        self.insertions += stats.insertions;
        self.deletions += stats.deletions;
    }
}

/// Contribution of one unified author within one group.
///
/// Only the per-day buckets are stored. Every total is computed from them, so
/// the daily and total views can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorStats {
    daily: BTreeMap<NaiveDate, DailyMetric>,
}

impl AuthorStats {
    pub fn record(&mut self, day: NaiveDate, stats: LineStats) {
        self.daily.entry(day).or_default().add_commit(stats);
    }

    pub fn absorb(&mut self, other: AuthorStats) {
        for (day, metric) in other.daily {
            let entry = self.daily.entry(day).or_default();
            entry.commits += metric.commits;
            entry.insertions += metric.insertions;
            entry.deletions += metric.deletions;
        }
    }

    pub fn day(&self, day: NaiveDate) -> DailyMetric {
        self.daily.get(&day).copied().unwrap_or_default()
    }

    pub fn insertions(&self) -> u64 {
        self.daily.values().map(|d| d.insertions).sum()
    }

    pub fn deletions(&self) -> u64 {
        self.daily.values().map(|d| d.deletions).sum()
    }

    pub fn commits(&self) -> u64 {
        self.daily.values().map(|d| d.commits).sum()
    }

    pub fn active_days(&self) -> u64 {
        self.daily.values().filter(|d| d.commits > 0).count() as u64
    }
}

/// The result of aggregating a single group's repository.
#[derive(Debug, Clone, Default)]
pub struct GroupStats {
    pub group: String,
    pub members: BTreeMap<String, AuthorStats>,
}

impl GroupStats {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn total_commits(&self) -> u64 {
        self.members.values().map(AuthorStats::commits).sum()
    }
}

/// Statistics for every group, keyed by group label then unified author.
///
/// Groups and members iterate in lexicographic order. Groups whose repository
/// was missing or produced no qualifying commit are absent.
#[derive(Debug, Clone, Default)]
pub struct GroupDataset {
    groups: BTreeMap<String, BTreeMap<String, AuthorStats>>,
}

impl GroupDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds independently computed partial results into one dataset.
    pub fn from_partials(partials: impl IntoIterator<Item = GroupStats>) -> Self {
        let mut dataset = Self::new();
        for partial in partials {
            dataset.merge(partial);
        }
        dataset
    }

    pub fn merge(&mut self, partial: GroupStats) {
        if partial.is_empty() {
            return;
        }
        let members = self.groups.entry(partial.group).or_default();
        for (author, stats) in partial.members {
            members.entry(author).or_default().absorb(stats);
        }
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeMap<String, AuthorStats>> {
        &self.groups
    }

    pub fn group(&self, group: &str) -> Option<&BTreeMap<String, AuthorStats>> {
        self.groups.get(group)
    }

    pub fn member(&self, group: &str, author: &str) -> Option<&AuthorStats> {
        self.groups.get(group).and_then(|m| m.get(author))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn member_rows(&self) -> Vec<MemberRow> {
        self.groups
            .iter()
            .flat_map(|(group, members)| {
                members.iter().map(move |(member, stats)| MemberRow {
                    group: group.clone(),
                    member: member.clone(),
                    insertions: stats.insertions(),
                    deletions: stats.deletions(),
                    total_commits: stats.commits(),
                    active_days: stats.active_days(),
                })
            })
            .collect()
    }

    /// One row per (group, member, day) over every day of `days`, zero-filled.
    pub fn daily_rows(&self, days: &[NaiveDate]) -> Vec<DailyRow> {
        let mut rows = Vec::new();
        for (group, members) in &self.groups {
            for (member, stats) in members {
                for &date in days {
                    let metric = stats.day(date);
                    rows.push(DailyRow {
                        group: group.clone(),
                        member: member.clone(),
                        date,
                        insertions: metric.insertions,
                        deletions: metric.deletions,
                        commits: metric.commits,
                    });
                }
            }
        }
        rows
    }
}

/// Per (group, member) totals. Column names match the volumes CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRow {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Member")]
    pub member: String,
    #[serde(rename = "Added rows")]
    pub insertions: u64,
    #[serde(rename = "Removed rows")]
    pub deletions: u64,
    #[serde(rename = "Total commits")]
    pub total_commits: u64,
    #[serde(rename = "Active days")]
    pub active_days: u64,
}

/// Per (group, member, day) activity. Column names match the daily CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRow {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Member")]
    pub member: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Added rows (day)")]
    pub insertions: u64,
    #[serde(rename = "Removed rows (day)")]
    pub deletions: u64,
    #[serde(rename = "Commits (day)")]
    pub commits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceIndicator {
    /// Author with the most commits; `None` when the group has no commit.
    pub dominant: Option<String>,
    /// Dominant author's share of the group's commits, in `[0.0, 1.0]`.
    pub ratio: f64,
    pub total_commits: u64,
}

/// Half-open interval of calendar days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        let len = (self.end - self.start).num_days().max(0);
        (0..len).map(|i| self.start + Duration::days(i)).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub student_folders: String,
    pub window: AnalysisWindow,
    pub members: Vec<MemberRow>,
    pub daily: Vec<DailyRow>,
    pub balance: BTreeMap<String, BalanceIndicator>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn stats(insertions: u64, deletions: u64) -> LineStats {
        LineStats { insertions, deletions }
    }

    #[test]
    fn totals_follow_daily_buckets() {
        let mut author = AuthorStats::default();
        author.record(day(3), stats(10, 2));
        author.record(day(3), stats(1, 1));
        author.record(day(5), stats(4, 0));

        assert_eq!(author.commits(), 3);
        assert_eq!(author.insertions(), 15);
        assert_eq!(author.deletions(), 3);
        assert_eq!(author.active_days(), 2);
        assert_eq!(
            author.day(day(3)),
            DailyMetric { commits: 2, insertions: 11, deletions: 3 }
        );
        assert_eq!(author.day(day(4)), DailyMetric::default());
    }

    #[test]
    fn window_is_half_open() {
        let window = AnalysisWindow { start: day(1), end: day(10) };
        assert!(window.contains(day(1)));
        assert!(window.contains(day(9)));
        assert!(!window.contains(day(10)));
        assert_eq!(window.days().len(), 9);
        assert_eq!(window.days().first(), Some(&day(1)));
    }

    #[test]
    fn empty_partials_leave_no_group() {
        let mut filled = GroupStats::new("team-a");
        filled.members.entry("alice".into()).or_default().record(day(2), stats(1, 0));
        let dataset = GroupDataset::from_partials([filled, GroupStats::new("team-b")]);

        assert!(dataset.group("team-a").is_some());
        assert!(dataset.group("team-b").is_none());
        assert!(!dataset.is_empty());
        assert!(GroupDataset::from_partials([GroupStats::new("team-c")]).is_empty());
    }

    #[test]
    fn daily_rows_are_zero_filled() {
        let mut partial = GroupStats::new("team-a");
        partial.members.entry("alice".into()).or_default().record(day(2), stats(3, 1));
        let dataset = GroupDataset::from_partials([partial]);

        let window = AnalysisWindow { start: day(1), end: day(4) };
        let rows = dataset.daily_rows(&window.days());
        let commits: Vec<u64> = rows.iter().map(|r| r.commits).collect();
        assert_eq!(commits, vec![0, 1, 0]);
        assert_eq!(rows[1].insertions, 3);
    }
}
