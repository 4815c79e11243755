use chrono::{DateTime, FixedOffset, NaiveDate};
use std::path::{Path, PathBuf};

/// Calendar day of a timestamp as seen in the committer's own time zone.
pub fn local_day(seconds: i64, offset_seconds: i32) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(offset_seconds)?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Immediate subdirectories of `dir`, sorted by name.
pub fn subdirectories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn day_follows_committer_offset() {
        // 2025-02-03T23:30:00Z
        let secs = 1_738_625_400;
        assert_eq!(local_day(secs, 0), NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(local_day(secs, 3600), NaiveDate::from_ymd_opt(2025, 2, 4));
        assert_eq!(local_day(secs, -5 * 3600), NaiveDate::from_ymd_opt(2025, 2, 3));
    }

    #[test]
    fn subdirectories_are_sorted_and_skip_files() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("b")).unwrap();
        std::fs::create_dir(root.path().join("a")).unwrap();
        std::fs::write(root.path().join("notes.txt"), "x").unwrap();

        let names: Vec<String> = subdirectories(root.path())
            .unwrap()
            .iter()
            .map(|p| dir_name(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
