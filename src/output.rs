use crate::error::Result;
use crate::model::{AnalysisOutput, BalanceIndicator, DailyRow, MemberRow};
use console::{style, StyledObject};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Line-count thresholds used to highlight the added and removed cells of the
/// summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 10,
            medium: 30,
            high: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    /// Below the low threshold, left unhighlighted.
    Quiet,
    Low,
    Medium,
    High,
}

impl Thresholds {
    pub fn level(&self, lines: u64) -> ActivityLevel {
        if lines >= self.high {
            ActivityLevel::High
        } else if lines >= self.medium {
            ActivityLevel::Medium
        } else if lines >= self.low {
            ActivityLevel::Low
        } else {
            ActivityLevel::Quiet
        }
    }

    fn cell(&self, lines: u64) -> StyledObject<String> {
        let text = format!("{lines:>8}");
        match self.level(lines) {
            ActivityLevel::Quiet => style(text),
            ActivityLevel::Low => style(text).yellow(),
            ActivityLevel::Medium => style(text).green(),
            ActivityLevel::High => style(text).red(),
        }
    }
}

/// The group's dominant ratio as a percentage, `N/A` when it is zero.
pub fn dominant_ratio_text(indicator: Option<&BalanceIndicator>) -> String {
    match indicator {
        Some(b) if b.ratio > 0.0 => format!("{:.1}%", b.ratio * 100.0),
        _ => "N/A".to_string(),
    }
}

const VOLUME_HEADER: [&str; 6] = [
    "Group",
    "Member",
    "Added rows",
    "Removed rows",
    "Total commits",
    "Active days",
];

const DAILY_HEADER: [&str; 6] = [
    "Group",
    "Member",
    "Date",
    "Added rows (day)",
    "Removed rows (day)",
    "Commits (day)",
];

/// Serializes `rows` with a header line, even when there is no row.
fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_volumes_csv(path: &Path, rows: &[MemberRow]) -> Result<()> {
    write_rows(path, &VOLUME_HEADER, rows)
}

pub fn write_daily_csv(path: &Path, rows: &[DailyRow]) -> Result<()> {
    write_rows(path, &DAILY_HEADER, rows)
}

pub fn read_volumes(path: &Path) -> Result<Vec<MemberRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<MemberRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn output_json(output: &AnalysisOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

pub fn output_summary(
    rows: &[MemberRow],
    balance: &BTreeMap<String, BalanceIndicator>,
    thresholds: &Thresholds,
) -> anyhow::Result<()> {
    if rows.is_empty() {
        println!("No data to display");
        return Ok(());
    }

    println!("{}", style("Member Activity Summary").bold());
    println!(
        "{:<20} {:<24} {:>8} {:>8} {:>8} {:>6} {:>9}",
        style("Group").bold(),
        style("Member").bold(),
        style("Added").bold(),
        style("Removed").bold(),
        style("Commits").bold(),
        style("Days").bold(),
        style("Dominant").bold()
    );
    println!("{}", "─".repeat(90));

    for row in rows {
        println!(
            "{:<20} {:<24} {} {} {:>8} {:>6} {:>9}",
            row.group,
            row.member,
            thresholds.cell(row.insertions),
            thresholds.cell(row.deletions),
            row.total_commits,
            row.active_days,
            dominant_ratio_text(balance.get(&row.group))
        );
    }
    Ok(())
}

pub fn output_balance(balance: &BTreeMap<String, BalanceIndicator>) -> anyhow::Result<()> {
    if balance.is_empty() {
        return Ok(());
    }

    println!("\n{}", style("Group Balance").bold());
    println!("{}", "─".repeat(60));
    for (group, indicator) in balance {
        let dominant = indicator.dominant.as_deref().unwrap_or("-");
        let ratio = format!("{:.2}", indicator.ratio);
        let ratio = if indicator.ratio > 0.5 {
            style(ratio).red()
        } else {
            style(ratio).green()
        };
        println!(
            "{:<20} dominant: {:<24} ratio: {} ({} commits)",
            group, dominant, ratio, indicator.total_commits
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn activity_levels_follow_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.level(0), ActivityLevel::Quiet);
        assert_eq!(t.level(9), ActivityLevel::Quiet);
        assert_eq!(t.level(10), ActivityLevel::Low);
        assert_eq!(t.level(29), ActivityLevel::Low);
        assert_eq!(t.level(30), ActivityLevel::Medium);
        assert_eq!(t.level(100), ActivityLevel::High);
    }

    #[test]
    fn dominant_ratio_is_shown_per_group() {
        let indicator = BalanceIndicator {
            dominant: Some("alice".into()),
            ratio: 0.75,
            total_commits: 20,
        };
        assert_eq!(dominant_ratio_text(Some(&indicator)), "75.0%");

        let idle = BalanceIndicator {
            dominant: None,
            ratio: 0.0,
            total_commits: 0,
        };
        assert_eq!(dominant_ratio_text(Some(&idle)), "N/A");
        assert_eq!(dominant_ratio_text(None), "N/A");
    }

    #[test]
    fn volumes_csv_has_expected_header_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes.csv");
        let rows = vec![MemberRow {
            group: "team-a".into(),
            member: "Alice, Jr.".into(),
            insertions: 10,
            deletions: 2,
            total_commits: 1,
            active_days: 1,
        }];

        write_volumes_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("Group,Member,Added rows,Removed rows,Total commits,Active days")
        );
        assert_eq!(read_volumes(&path).unwrap(), rows);
    }

    #[test]
    fn empty_volumes_still_get_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes.csv");
        write_volumes_csv(&path, &[]).unwrap();
        assert!(read_volumes(&path).unwrap().is_empty());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), VOLUME_HEADER.join(","));
    }

    #[test]
    fn daily_csv_writes_iso_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        let rows = vec![DailyRow {
            group: "team-a".into(),
            member: "alice".into(),
            date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            insertions: 10,
            deletions: 2,
            commits: 1,
        }];

        write_daily_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Group,Member,Date,Added rows (day),Removed rows (day),Commits (day)",
                "team-a,alice,2025-02-03,10,2,1",
            ]
        );
    }
}
