//! Minimal client for a Google-Sheets-style spreadsheet service.
//!
//! Covers exactly the surface the sync jobs consume: resolving worksheet
//! handles from document metadata, targeted column range reads, full grid
//! reads, whole-document CSV export, and clear/overwrite writes. Requests
//! are authenticated with a bearer token obtained from a service account
//! key (see [`auth`]).

pub mod auth;
pub mod errors;
pub mod range;
pub mod req;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use errors::{Result, SheetsError};
pub use req::{SheetsClient, SheetsClientBuilder};

/// Metadata handle for an opened spreadsheet document.
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    pub id: String,
    sheets: Vec<SheetProperties>,
}

#[derive(Debug, Clone)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}

/// Handle for one named sheet within a document.
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub spreadsheet_id: String,
    /// Numeric sheet id (the "gid" in export URLs).
    pub sheet_id: i64,
    pub title: String,
}

impl Spreadsheet {
    pub fn sheets(&self) -> &[SheetProperties] {
        &self.sheets
    }

    /// Resolve a worksheet handle by exact title.
    pub fn worksheet(&self, title: &str) -> Result<Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| Worksheet {
                spreadsheet_id: self.id.clone(),
                sheet_id: s.sheet_id,
                title: s.title.clone(),
            })
            .ok_or_else(|| SheetsError::WorksheetNotFound(title.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetPropertiesJson,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetPropertiesJson {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    range: &'a str,
    major_dimension: &'a str,
    values: &'a [Vec<String>],
}

/// What a write touched, as reported by the service.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    #[serde(default)]
    pub updated_rows: u64,
    #[serde(default)]
    pub updated_columns: u64,
    #[serde(default)]
    pub updated_cells: u64,
}

/// The service returns cells as JSON scalars; the sync core works with
/// strings only.
fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetsClient {
    /// Fetch document metadata and return a handle for worksheet lookup.
    pub async fn open(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let url = self.api_url(&["v4", "spreadsheets", spreadsheet_id])?;
        let meta: SpreadsheetMeta = self
            .execute(
                Method::GET,
                url,
                Some(&[("fields", "sheets.properties")]),
                None::<&()>,
            )
            .await?;

        Ok(Spreadsheet {
            id: spreadsheet_id.to_string(),
            sheets: meta
                .sheets
                .into_iter()
                .map(|s| SheetProperties {
                    sheet_id: s.properties.sheet_id,
                    title: s.properties.title,
                })
                .collect(),
        })
    }

    /// Read several ranges in a single round trip, column-major.
    ///
    /// Returns one cell vector per requested range, in request order. A
    /// range with no populated cells yields an empty vector.
    pub async fn batch_get_columns(
        &self,
        sheet: &Worksheet,
        ranges: &[String],
    ) -> Result<Vec<Vec<String>>> {
        let url = self.api_url(&[
            "v4",
            "spreadsheets",
            &sheet.spreadsheet_id,
            "values:batchGet",
        ])?;

        let mut query: Vec<(&str, &str)> = ranges.iter().map(|r| ("ranges", r.as_str())).collect();
        query.push(("majorDimension", "COLUMNS"));

        let res: BatchGetResponse = self
            .execute(Method::GET, url, Some(&query), None::<&()>)
            .await?;

        if res.value_ranges.len() != ranges.len() {
            return Err(SheetsError::MalformedResponse(format!(
                "requested {} ranges, got {}",
                ranges.len(),
                res.value_ranges.len()
            )));
        }

        Ok(res
            .value_ranges
            .into_iter()
            .map(|vr| {
                vr.values
                    .into_iter()
                    .next()
                    .unwrap_or_default()
                    .into_iter()
                    .map(cell_to_string)
                    .collect()
            })
            .collect())
    }

    /// Read every populated cell of a sheet as rows of strings.
    pub async fn get_values(&self, sheet: &Worksheet) -> Result<Vec<Vec<String>>> {
        let url = self.api_url(&[
            "v4",
            "spreadsheets",
            &sheet.spreadsheet_id,
            "values",
            &range::all_cells(&sheet.title),
        ])?;
        let res: ValueRange = self.execute(Method::GET, url, None::<&()>, None::<&()>).await?;

        Ok(res
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// Download the whole sheet as delimited text via the document export
    /// endpoint.
    pub async fn export_csv(&self, sheet: &Worksheet) -> Result<String> {
        let url = self.export_url(&sheet.spreadsheet_id, sheet.sheet_id)?;
        self.fetch_export(url).await
    }

    /// Clear a range on the sheet.
    pub async fn clear_values(&self, sheet: &Worksheet, range: &str) -> Result<()> {
        let url = self.api_url(&[
            "v4",
            "spreadsheets",
            &sheet.spreadsheet_id,
            "values",
            &format!("{range}:clear"),
        ])?;
        let _: serde_json::Value = self
            .execute(Method::POST, url, None::<&()>, None::<&()>)
            .await?;
        Ok(())
    }

    /// Overwrite cells starting at `range` with raw (uninterpreted) values.
    pub async fn update_values(
        &self,
        sheet: &Worksheet,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<UpdateSummary> {
        let url = self.api_url(&[
            "v4",
            "spreadsheets",
            &sheet.spreadsheet_id,
            "values",
            range,
        ])?;
        let body = UpdateRequest {
            range,
            major_dimension: "ROWS",
            values,
        };
        self.execute(
            Method::PUT,
            url,
            Some(&[("valueInputOption", "RAW")]),
            Some(&body),
        )
        .await
    }
}
