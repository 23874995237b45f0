//! Fallback strategy: download the whole worksheet as a CSV export.
//!
//! The export endpoint is a separate surface from the values API, so it
//! often keeps working when that API is rate-limited or degraded. It gets a
//! larger retry budget since it's reached only once the cheap path is gone.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sheets_connector::{SheetsClient, Worksheet};

use crate::errors::Result;
use crate::fetch::{FetchOutcome, FetchStrategy};
use crate::retry::RetryPolicy;
use crate::table::Table;

const EXPORT_MAX_ATTEMPTS: u32 = 6;

/// Fetches the full sheet through the CSV export endpoint.
pub struct BulkExporter {
    client: Arc<SheetsClient>,
    retry: RetryPolicy,
}

impl BulkExporter {
    pub fn new(client: Arc<SheetsClient>) -> Self {
        Self::with_retry(
            client,
            RetryPolicy::new(EXPORT_MAX_ATTEMPTS, Duration::from_secs(1)),
        )
    }

    pub fn with_retry(client: Arc<SheetsClient>, retry: RetryPolicy) -> Self {
        BulkExporter { client, retry }
    }

    async fn fetch(&self, sheet: &Worksheet) -> Result<Table> {
        let text = self
            .retry
            .execute("export", || self.client.export_csv(sheet))
            .await?;

        // Parse outside the retry loop: a malformed body won't improve on
        // a second download.
        Table::from_csv(&text)
    }
}

#[async_trait]
impl FetchStrategy for BulkExporter {
    fn name(&self) -> &'static str {
        "csv-export"
    }

    fn projects(&self) -> bool {
        false
    }

    async fn attempt(&self, sheet: &Worksheet, _columns: &[usize]) -> FetchOutcome {
        FetchOutcome::from_fetch(self.fetch(sheet).await)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockito::Matcher;
    use sheets_connector::auth::Token;

    use super::*;

    fn test_client(server: &mockito::Server) -> Arc<SheetsClient> {
        Arc::new(
            SheetsClient::builder()
                .api_base(server.url())
                .export_base(server.url())
                .build(Token::new("test-token".to_string(), 3600, Utc::now()))
                .unwrap(),
        )
    }

    fn ws() -> Worksheet {
        Worksheet {
            spreadsheet_id: "sid".to_string(),
            sheet_id: 77,
            title: "data".to_string(),
        }
    }

    #[tokio::test]
    async fn test_export_parses_full_sheet() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/spreadsheets/d/sid/export")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".to_string(), "csv".to_string()),
                Matcher::UrlEncoded("gid".to_string(), "77".to_string()),
            ]))
            .with_body("a,b,c\n1,2,3\n4,5,6\n")
            .create_async()
            .await;

        let exporter = BulkExporter::new(test_client(&server));
        let table = match exporter.attempt(&ws(), &[0, 2]).await {
            FetchOutcome::Fetched(t) => t,
            other => panic!("unexpected outcome: {other:?}"),
        };

        // Not projected here; the pipeline narrows afterwards.
        assert_eq!(3, table.num_columns());
        assert_eq!(2, table.num_rows());
    }

    #[tokio::test]
    async fn test_export_retries_transient_failures() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/spreadsheets/d/sid/export")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/spreadsheets/d/sid/export")
            .match_query(Matcher::Any)
            .with_body("a\n1\n")
            .create_async()
            .await;

        let exporter = BulkExporter::with_retry(
            test_client(&server),
            RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::ZERO,
                max_backoff: Duration::ZERO,
            },
        );
        assert!(matches!(
            exporter.attempt(&ws(), &[0]).await,
            FetchOutcome::Fetched(_)
        ));
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_export_is_degenerate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/spreadsheets/d/sid/export")
            .match_query(Matcher::Any)
            .with_body("a,b\n")
            .create_async()
            .await;

        let exporter = BulkExporter::new(test_client(&server));
        assert!(matches!(
            exporter.attempt(&ws(), &[0]).await,
            FetchOutcome::Degenerate
        ));
    }
}
