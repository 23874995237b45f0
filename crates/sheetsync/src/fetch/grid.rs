//! Last-resort strategy: read the entire grid through the values API.

use std::sync::Arc;

use async_trait::async_trait;
use sheets_connector::{SheetsClient, Worksheet};

use crate::errors::Result;
use crate::fetch::{FetchOutcome, FetchStrategy};
use crate::retry::RetryPolicy;
use crate::table::Table;

/// Fetches every cell of the worksheet in one values read.
pub struct GridReader {
    client: Arc<SheetsClient>,
    retry: RetryPolicy,
}

impl GridReader {
    pub fn new(client: Arc<SheetsClient>) -> Self {
        Self::with_retry(client, RetryPolicy::default())
    }

    pub fn with_retry(client: Arc<SheetsClient>, retry: RetryPolicy) -> Self {
        GridReader { client, retry }
    }

    async fn fetch(&self, sheet: &Worksheet) -> Result<Table> {
        let rows = self
            .retry
            .execute("values:get", || self.client.get_values(sheet))
            .await?;

        Ok(Table::from_rows(rows))
    }
}

#[async_trait]
impl FetchStrategy for GridReader {
    fn name(&self) -> &'static str {
        "grid-read"
    }

    fn projects(&self) -> bool {
        false
    }

    async fn attempt(&self, sheet: &Worksheet, _columns: &[usize]) -> FetchOutcome {
        FetchOutcome::from_fetch(self.fetch(sheet).await)
    }
}
