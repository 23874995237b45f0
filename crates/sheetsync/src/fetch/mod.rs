//! Fetch strategies and the fallback pipeline that orders them.
//!
//! Each strategy trades round-trip efficiency for robustness; the pipeline
//! prefers the cheapest to minimize load on the rate-limited backend and
//! falls through the chain when an API surface is degraded.

pub mod columns;
pub mod export;
pub mod grid;

use std::sync::Arc;

use async_trait::async_trait;
use sheets_connector::{SheetsClient, Worksheet};
use tracing::{info, warn};

use crate::errors::{JobError, Result};
use crate::table::Table;

/// Result of one strategy attempt, after the strategy's internal retries.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Usable table with at least one data row.
    Fetched(Table),
    /// Transport-wise success but nothing beyond a header.
    Degenerate,
    /// The strategy is exhausted or broken.
    Failed(JobError),
}

impl FetchOutcome {
    fn from_fetch(res: Result<Table>) -> FetchOutcome {
        match res {
            Ok(table) if table.num_rows() == 0 => FetchOutcome::Degenerate,
            Ok(table) => FetchOutcome::Fetched(table),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// One way of retrieving sheet contents.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the produced table is already narrowed to the requested
    /// columns, or needs projecting by the pipeline.
    fn projects(&self) -> bool;

    async fn attempt(&self, sheet: &Worksheet, columns: &[usize]) -> FetchOutcome;
}

/// Tries strategies in order and returns the first usable, projected table.
pub struct FallbackFetchPipeline {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FallbackFetchPipeline {
    /// Pipeline over an explicit, ordered strategy list.
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        FallbackFetchPipeline { strategies }
    }

    /// The standard chain: batched column read, then CSV export, then the
    /// full grid read.
    pub fn with_default_strategies(client: Arc<SheetsClient>) -> Self {
        FallbackFetchPipeline::new(vec![
            Box::new(columns::ColumnFetcher::new(client.clone())),
            Box::new(export::BulkExporter::new(client.clone())),
            Box::new(grid::GridReader::new(client)),
        ])
    }

    /// Fetch the requested column projection from `sheet`.
    ///
    /// Returns `Ok(None)` when every strategy failed or produced no data
    /// rows; callers must treat that as "no update performed" and leave the
    /// destination untouched. A requested column index past the source's
    /// width is a configuration error and aborts instead of falling
    /// through.
    pub async fn fetch_projection(
        &self,
        sheet: &Worksheet,
        columns: &[usize],
    ) -> Result<Option<Table>> {
        for strategy in &self.strategies {
            info!(
                strategy = strategy.name(),
                sheet = %sheet.title,
                "attempting fetch strategy",
            );
            match strategy.attempt(sheet, columns).await {
                FetchOutcome::Fetched(table) => {
                    let table = if strategy.projects() {
                        table
                    } else {
                        table.project(columns)?
                    };
                    info!(
                        strategy = strategy.name(),
                        rows = table.num_rows(),
                        "fetch strategy succeeded",
                    );
                    return Ok(Some(table));
                }
                FetchOutcome::Degenerate => {
                    warn!(
                        strategy = strategy.name(),
                        sheet = %sheet.title,
                        "strategy returned no usable rows",
                    );
                }
                FetchOutcome::Failed(e) => {
                    warn!(
                        strategy = strategy.name(),
                        sheet = %sheet.title,
                        error = %e,
                        "strategy failed",
                    );
                }
            }
        }

        warn!(sheet = %sheet.title, "all fetch strategies exhausted");
        Ok(None)
    }
}
