use crate::model::{BalanceIndicator, GroupDataset, MemberRow};
use std::collections::BTreeMap;

/// Dominant member and its share of commits for every group of the dataset.
pub fn compute_balance(dataset: &GroupDataset) -> BTreeMap<String, BalanceIndicator> {
    dataset
        .groups()
        .iter()
        .map(|(group, members)| {
            let indicator =
                balance_of(members.iter().map(|(name, stats)| (name.as_str(), stats.commits())));
            (group.clone(), indicator)
        })
        .collect()
}

/// Same as [`compute_balance`], from per-member rows such as a volumes CSV.
/// Members are considered in row order.
pub fn balance_from_rows(rows: &[MemberRow]) -> BTreeMap<String, BalanceIndicator> {
    let mut groups: BTreeMap<&str, Vec<(&str, u64)>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.group.as_str())
            .or_default()
            .push((row.member.as_str(), row.total_commits));
    }
    groups
        .into_iter()
        .map(|(group, members)| (group.to_string(), balance_of(members)))
        .collect()
}

/// Ties go to the first member seen.
fn balance_of<'a>(members: impl IntoIterator<Item = (&'a str, u64)>) -> BalanceIndicator {
    let mut total = 0u64;
    let mut dominant: Option<(&str, u64)> = None;
    for (name, commits) in members {
        total += commits;
        if dominant.map_or(true, |(_, best)| commits > best) {
            dominant = Some((name, commits));
        }
    }

    match dominant {
        Some((name, commits)) if total > 0 => BalanceIndicator {
            dominant: Some(name.to_string()),
            ratio: commits as f64 / total as f64,
            total_commits: total,
        },
        _ => BalanceIndicator {
            dominant: None,
            ratio: 0.0,
            total_commits: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthorStats, GroupStats, LineStats};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn row(group: &str, member: &str, commits: u64) -> MemberRow {
        MemberRow {
            group: group.into(),
            member: member.into(),
            insertions: 0,
            deletions: 0,
            total_commits: commits,
            active_days: u64::from(commits > 0),
        }
    }

    fn with_commits(n: u64) -> AuthorStats {
        let mut stats = AuthorStats::default();
        let day = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        for _ in 0..n {
            stats.record(day, LineStats::default());
        }
        stats
    }

    #[test]
    fn dominant_share_of_commits() {
        let balance = balance_from_rows(&[row("A", "m1", 5), row("A", "m2", 15), row("B", "m3", 0)]);

        assert_eq!(balance["A"].dominant.as_deref(), Some("m2"));
        assert_eq!(balance["A"].ratio, 0.75);
        assert_eq!(balance["A"].total_commits, 20);
        assert_eq!(balance["B"].dominant, None);
        assert_eq!(balance["B"].ratio, 0.0);
    }

    #[test]
    fn ties_go_to_the_first_member() {
        let balance = balance_from_rows(&[row("A", "zed", 4), row("A", "amy", 4)]);
        assert_eq!(balance["A"].dominant.as_deref(), Some("zed"));
        assert_eq!(balance["A"].ratio, 0.5);
    }

    #[test]
    fn computed_from_dataset() {
        let mut a = GroupStats::new("A");
        a.members.insert("m1".into(), with_commits(5));
        a.members.insert("m2".into(), with_commits(15));
        let mut b = GroupStats::new("B");
        b.members.insert("m3".into(), with_commits(0));
        let dataset = GroupDataset::from_partials([a, b]);

        let balance = compute_balance(&dataset);
        assert_eq!(balance["A"].dominant.as_deref(), Some("m2"));
        assert_eq!(balance["A"].ratio, 0.75);
        assert_eq!(balance["B"].dominant, None);
        assert_eq!(balance["B"].ratio, 0.0);
    }

    #[test]
    fn single_member_owns_everything() {
        let balance = balance_from_rows(&[row("solo", "only", 7)]);
        assert_eq!(balance["solo"].ratio, 1.0);
    }
}
