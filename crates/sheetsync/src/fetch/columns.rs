//! Preferred strategy: one batched range read for exactly the requested
//! columns.

use std::sync::Arc;

use async_trait::async_trait;
use sheets_connector::{range, SheetsClient, Worksheet};

use crate::errors::Result;
use crate::fetch::{FetchOutcome, FetchStrategy};
use crate::retry::RetryPolicy;
use crate::table::Table;

/// Fetches the requested column indices in a single round trip.
///
/// The cheapest strategy against the rate-limited backend, so it runs
/// first. Output is already projected.
pub struct ColumnFetcher {
    client: Arc<SheetsClient>,
    retry: RetryPolicy,
}

impl ColumnFetcher {
    pub fn new(client: Arc<SheetsClient>) -> Self {
        Self::with_retry(client, RetryPolicy::default())
    }

    pub fn with_retry(client: Arc<SheetsClient>, retry: RetryPolicy) -> Self {
        ColumnFetcher { client, retry }
    }

    async fn fetch(&self, sheet: &Worksheet, columns: &[usize]) -> Result<Table> {
        let ranges: Vec<String> = columns
            .iter()
            .map(|&index| range::full_column(&sheet.title, index))
            .collect();

        let raw = self
            .retry
            .execute("values:batchGet", || {
                self.client.batch_get_columns(sheet, &ranges)
            })
            .await?;

        Ok(Table::from_raw_columns(raw))
    }
}

#[async_trait]
impl FetchStrategy for ColumnFetcher {
    fn name(&self) -> &'static str {
        "column-batch"
    }

    fn projects(&self) -> bool {
        true
    }

    async fn attempt(&self, sheet: &Worksheet, columns: &[usize]) -> FetchOutcome {
        FetchOutcome::from_fetch(self.fetch(sheet, columns).await)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use mockito::Matcher;
    use sheets_connector::auth::Token;

    use super::*;

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

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
            sheet_id: 0,
            title: "data".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ragged_columns_become_rectangular() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v4/spreadsheets/sid/values:batchGet")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"valueRanges": [
                    {"values": [["name", "alice", "bob", "carol"]]},
                    {"values": [["score", "1"]]},
                    {}
                ]}"#,
            )
            .create_async()
            .await;

        let fetcher = ColumnFetcher::new(test_client(&server));
        let outcome = fetcher.attempt(&ws(), &[0, 1, 2]).await;

        let table = match outcome {
            FetchOutcome::Fetched(t) => t,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(
            vec!["name".to_string(), "score".to_string(), String::new()],
            table.columns()
        );
        assert_eq!(
            vec![
                vec!["alice".to_string(), "1".to_string(), String::new()],
                vec!["bob".to_string(), String::new(), String::new()],
                vec!["carol".to_string(), String::new(), String::new()],
            ],
            table.rows()
        );
    }

    #[tokio::test]
    async fn test_projection_round_trip() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v4/spreadsheets/sid/values:batchGet")
            // Matcher::UrlEncoded collapses repeated keys into a HashMap, so
            // two `ranges` pairs cannot both match it; match the encoded
            // query text instead ('data'!A1:A and 'data'!C1:C).
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("ranges=%27data%27%21A1%3AA".to_string()),
                Matcher::Regex("ranges=%27data%27%21C1%3AC".to_string()),
            ]))
            .with_body(
                r#"{"valueRanges": [
                    {"values": [["A", "1", "4"]]},
                    {"values": [["C", "3", "6"]]}
                ]}"#,
            )
            .create_async()
            .await;

        let fetcher = ColumnFetcher::new(test_client(&server));
        let table = match fetcher.attempt(&ws(), &[0, 2]).await {
            FetchOutcome::Fetched(t) => t,
            other => panic!("unexpected outcome: {other:?}"),
        };

        assert_eq!(vec!["A".to_string(), "C".to_string()], table.columns());
        assert_eq!(
            vec![
                vec!["1".to_string(), "3".to_string()],
                vec!["4".to_string(), "6".to_string()],
            ],
            table.rows()
        );
    }

    #[tokio::test]
    async fn test_header_only_sheet_is_degenerate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v4/spreadsheets/sid/values:batchGet")
            .match_query(Matcher::Any)
            .with_body(r#"{"valueRanges": [{"values": [["name"]]}]}"#)
            .create_async()
            .await;

        let fetcher = ColumnFetcher::new(test_client(&server));
        assert!(matches!(
            fetcher.attempt(&ws(), &[0]).await,
            FetchOutcome::Degenerate
        ));
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v4/spreadsheets/sid/values:batchGet")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let fetcher = ColumnFetcher::with_retry(test_client(&server), fast_retry(3));
        assert!(matches!(
            fetcher.attempt(&ws(), &[0]).await,
            FetchOutcome::Failed(_)
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_fail_fast() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v4/spreadsheets/sid/values:batchGet")
            .match_query(Matcher::Any)
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let fetcher = ColumnFetcher::with_retry(test_client(&server), fast_retry(3));
        assert!(matches!(
            fetcher.attempt(&ws(), &[0]).await,
            FetchOutcome::Failed(_)
        ));
        mock.assert_async().await;
    }
}
