use crate::alias::{AliasTable, ExcludedAuthors};
use crate::error::{GroupStatError, Result};
use crate::model::AnalysisWindow;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::error;

/// First day counted when the configuration does not name one.
pub const DEFAULT_PROJECT_START: (i32, u32, u32) = (2025, 2, 1);

/// Contents of the JSON configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub excluded_members: Vec<String>,
    pub alias_mapping_by_group: HashMap<String, HashMap<String, String>>,
    pub fixed_project_start_date: Option<String>,
}

impl RunConfig {
    /// Reads the configuration file. A missing or malformed file is logged and
    /// yields an empty configuration so the analysis can still run.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), "Error loading config file: {e}");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn aliases(&self) -> AliasTable {
        AliasTable::from_mapping(self.alias_mapping_by_group.clone())
    }

    pub fn excluded(&self) -> ExcludedAuthors {
        ExcludedAuthors::new(&self.excluded_members)
    }

    pub fn project_start(&self) -> Result<NaiveDate> {
        match &self.fixed_project_start_date {
            Some(raw) => parse_date(raw).map_err(|_| {
                GroupStatError::Config(format!("Invalid fixed_project_start_date: {raw}"))
            }),
            None => {
                let (y, m, d) = DEFAULT_PROJECT_START;
                NaiveDate::from_ymd_opt(y, m, d)
                    .ok_or_else(|| GroupStatError::InvalidDate(format!("{y}-{m}-{d}")))
            }
        }
    }
}

/// Parses `YYYY-MM-DD`; month and day may omit their leading zero.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| GroupStatError::InvalidDate(format!("'{input}' (expected YYYY-MM-DD): {e}")))
}

/// Counting starts at the project start and stops `analysis_days` after the
/// target date.
pub fn build_window(
    project_start: NaiveDate,
    target: NaiveDate,
    analysis_days: u32,
) -> Result<AnalysisWindow> {
    let end = target
        .checked_add_days(Days::new(u64::from(analysis_days)))
        .ok_or_else(|| {
            GroupStatError::Config(format!(
                "{analysis_days} days after {target} is past the last representable date"
            ))
        })?;
    if end < project_start {
        return Err(GroupStatError::Config(format!(
            "Analysis ends on {end}, before the project start {project_start}"
        )));
    }
    Ok(AnalysisWindow {
        start: project_start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_dates_with_short_day() {
        assert_eq!(parse_date("2025-02-14").unwrap(), date(2025, 2, 14));
        assert_eq!(parse_date("2025-02-1").unwrap(), date(2025, 2, 1));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("14/02/2025").is_err());
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn loads_a_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"excluded_members": ["user1", "user2"],
                "alias_mapping_by_group": {{"group1": {{"user1": "User One"}}}},
                "fixed_project_start_date": "2025-03-01"}}"#
        )
        .unwrap();

        let config = RunConfig::load(file.path());
        assert_eq!(config.excluded_members, vec!["user1", "user2"]);
        assert_eq!(config.aliases().resolve("USER1", "group1"), "User One");
        assert_eq!(config.project_start().unwrap(), date(2025, 3, 1));
    }

    #[test]
    fn invalid_file_yields_empty_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid json").unwrap();

        let config = RunConfig::load(file.path());
        assert!(config.excluded_members.is_empty());
        assert!(config.alias_mapping_by_group.is_empty());
        assert_eq!(config.project_start().unwrap(), date(2025, 2, 1));
    }

    #[test]
    fn malformed_start_date_is_an_error() {
        let config = RunConfig {
            fixed_project_start_date: Some("first of february".into()),
            ..RunConfig::default()
        };
        assert!(matches!(config.project_start(), Err(GroupStatError::Config(_))));
    }

    #[test]
    fn window_spans_start_to_target_plus_days() {
        let window = build_window(date(2025, 2, 1), date(2025, 2, 1), 10).unwrap();
        assert_eq!(window.start, date(2025, 2, 1));
        assert_eq!(window.end, date(2025, 2, 11));
        assert!(build_window(date(2025, 3, 1), date(2025, 2, 1), 1).is_err());
    }

    #[test]
    fn window_past_the_calendar_is_a_configuration_error() {
        let result = build_window(date(2025, 2, 1), date(2025, 2, 1), u32::MAX);
        assert!(matches!(result, Err(GroupStatError::Config(_))));
    }
}
