//! Runs a configured sync job end to end: fetch every source projection,
//! stack them, then clear and rewrite the destination sheet.

use std::sync::Arc;

use sheets_connector::{range, SheetsClient};
use tracing::info;

use crate::config::{ClearMode, JobConfig};
use crate::errors::{JobError, Result};
use crate::fetch::FallbackFetchPipeline;
use crate::retry::RetryPolicy;
use crate::table::Table;

pub struct JobRunner {
    client: Arc<SheetsClient>,
    pipeline: FallbackFetchPipeline,
    retry: RetryPolicy,
}

impl JobRunner {
    pub fn new(client: Arc<SheetsClient>) -> Self {
        let pipeline = FallbackFetchPipeline::with_default_strategies(client.clone());
        Self::with_pipeline(client, pipeline)
    }

    pub fn with_pipeline(client: Arc<SheetsClient>, pipeline: FallbackFetchPipeline) -> Self {
        JobRunner {
            client,
            pipeline,
            retry: RetryPolicy::default(),
        }
    }

    /// Run one job. The destination is only touched once every selection
    /// has produced usable data; a job that can't fetch leaves the
    /// destination exactly as it was.
    pub async fn run(&self, job: &JobConfig) -> Result<()> {
        info!(job = %job.name, "starting sync job");

        let source = self
            .retry
            .execute("spreadsheets:get", || {
                self.client.open(&job.source.spreadsheet_id)
            })
            .await?;

        let mut parts = Vec::with_capacity(job.source.selections.len());
        for selection in &job.source.selections {
            let sheet = source.worksheet(&selection.sheet)?;
            let table = self
                .pipeline
                .fetch_projection(&sheet, &selection.columns)
                .await?
                .ok_or_else(|| JobError::NoUsableData(selection.sheet.clone()))?;
            parts.push(table);
        }
        let table = Table::hstack(parts);

        let destination = self
            .retry
            .execute("spreadsheets:get", || {
                self.client.open(&job.destination.spreadsheet_id)
            })
            .await?;
        let dest_sheet = destination.worksheet(&job.destination.sheet)?;

        let clear_range = match job.destination.clear {
            ClearMode::Sheet => range::all_cells(&dest_sheet.title),
            ClearMode::WrittenColumns => {
                range::column_band(&dest_sheet.title, table.num_columns())
            }
        };
        self.retry
            .execute("values:clear", || {
                self.client.clear_values(&dest_sheet, &clear_range)
            })
            .await?;

        let origin = range::origin(&dest_sheet.title);
        let rows = table.to_rows();
        let summary = self
            .retry
            .execute("values:update", || {
                self.client.update_values(&dest_sheet, &origin, &rows)
            })
            .await?;

        info!(
            job = %job.name,
            rows = summary.updated_rows,
            columns = summary.updated_columns,
            cells = summary.updated_cells,
            "sync job finished",
        );
        Ok(())
    }
}
