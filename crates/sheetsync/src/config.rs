//! Job definitions loaded from a JSON file.

use std::path::Path;

use serde::Deserialize;

use crate::errors::{JobError, Result};

/// Top-level config: the set of sync jobs this process knows about.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub jobs: Vec<JobConfig>,
}

impl SyncConfig {
    pub fn from_file(path: &Path) -> Result<SyncConfig> {
        let contents = std::fs::read_to_string(path)?;
        SyncConfig::parse(&contents)
    }

    pub fn parse(raw: &str) -> Result<SyncConfig> {
        let config: SyncConfig = serde_json::from_str(raw)?;
        // A selection with no columns would clear the destination and write
        // nothing meaningful back; reject it before any job runs.
        for job in &config.jobs {
            for selection in &job.source.selections {
                if selection.columns.is_empty() {
                    return Err(JobError::EmptySelection {
                        job: job.name.clone(),
                        sheet: selection.sheet.clone(),
                    });
                }
            }
        }
        Ok(config)
    }

    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// One source-to-destination sync.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub spreadsheet_id: String,
    /// Projections to fetch and stack side by side, in order.
    pub selections: Vec<SourceSelection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSelection {
    /// Worksheet title within the source spreadsheet.
    pub sheet: String,
    /// Zero-based column indices to project, in output order.
    pub columns: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    pub spreadsheet_id: String,
    pub sheet: String,
    #[serde(default)]
    pub clear: ClearMode,
}

/// How much of the destination sheet to clear before writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearMode {
    /// Clear the whole sheet.
    #[default]
    Sheet,
    /// Clear only the column band the new table will occupy, leaving
    /// anything to the right of it alone.
    WrittenColumns,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let raw = r#"{
            "jobs": [
                {
                    "name": "roster",
                    "source": {
                        "spreadsheet_id": "src-id",
                        "selections": [
                            {"sheet": "people", "columns": [0, 3, 5]},
                            {"sheet": "extra", "columns": [1]}
                        ]
                    },
                    "destination": {
                        "spreadsheet_id": "dst-id",
                        "sheet": "mirror",
                        "clear": "written_columns"
                    }
                },
                {
                    "name": "scores",
                    "source": {
                        "spreadsheet_id": "src-id",
                        "selections": [{"sheet": "grades", "columns": [0, 1]}]
                    },
                    "destination": {
                        "spreadsheet_id": "dst-id",
                        "sheet": "grades"
                    }
                }
            ]
        }"#;

        let config = SyncConfig::parse(raw).unwrap();
        assert_eq!(2, config.jobs.len());

        let roster = config.job("roster").unwrap();
        assert_eq!("src-id", roster.source.spreadsheet_id);
        assert_eq!(2, roster.source.selections.len());
        assert_eq!(vec![0, 3, 5], roster.source.selections[0].columns);
        assert_eq!(ClearMode::WrittenColumns, roster.destination.clear);

        // Clear mode defaults to wiping the whole sheet.
        let scores = config.job("scores").unwrap();
        assert_eq!(ClearMode::Sheet, scores.destination.clear);

        assert!(config.job("missing").is_none());
    }

    #[test]
    fn test_empty_selection_rejected() {
        let raw = r#"{
            "jobs": [
                {
                    "name": "roster",
                    "source": {
                        "spreadsheet_id": "src-id",
                        "selections": [{"sheet": "people", "columns": []}]
                    },
                    "destination": {
                        "spreadsheet_id": "dst-id",
                        "sheet": "mirror"
                    }
                }
            ]
        }"#;

        let err = SyncConfig::parse(raw).unwrap_err();
        match err {
            JobError::EmptySelection { job, sheet } => {
                assert_eq!("roster", job);
                assert_eq!("people", sheet);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
