//! Rectangular string tables and the reshaping steps between service
//! responses and destination writes.

use std::iter;

use crate::errors::{JobError, Result};

/// A rectangular collection of named columns.
///
/// Row order is preserved from the source. Every row has exactly one cell
/// per column; missing cells are empty strings, never absent. Constructed
/// fresh per job run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Build a table from independently fetched columns, each carrying its
    /// header as element 0.
    ///
    /// Columns may be ragged; data regions are right-padded with empty
    /// strings to the longest column. An empty column block is replaced by
    /// a placeholder of one empty header and one empty cell so a sparse
    /// trailing column never loses rows for the others.
    pub fn from_raw_columns(raw: Vec<Vec<String>>) -> Table {
        let raw: Vec<Vec<String>> = raw
            .into_iter()
            .map(|col| {
                if col.is_empty() {
                    vec![String::new(), String::new()]
                } else {
                    col
                }
            })
            .collect();

        let max_len = raw.iter().map(|col| col.len()).max().unwrap_or(0);
        let data_len = max_len.saturating_sub(1);

        let mut columns = Vec::with_capacity(raw.len());
        let mut bodies = Vec::with_capacity(raw.len());
        for col in raw {
            let mut cells = col.into_iter();
            columns.push(cells.next().unwrap_or_default());
            let mut body: Vec<String> = cells.collect();
            body.resize(data_len, String::new());
            bodies.push(body);
        }

        let rows = (0..data_len)
            .map(|r| bodies.iter_mut().map(|b| std::mem::take(&mut b[r])).collect())
            .collect();

        Table { columns, rows }
    }

    /// Build a table from row-major values with the first row as header.
    ///
    /// Rows may be ragged (trailing empty cells omitted by the service);
    /// everything is padded to the widest row.
    pub fn from_rows(mut all: Vec<Vec<String>>) -> Table {
        if all.is_empty() {
            return Table {
                columns: Vec::new(),
                rows: Vec::new(),
            };
        }

        let width = all.iter().map(|row| row.len()).max().unwrap_or(0);
        let mut columns = all.remove(0);
        columns.resize(width, String::new());

        let rows = all
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Table { columns, rows }
    }

    /// Parse delimited export text, first record as header.
    pub fn from_csv(text: &str) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut all = Vec::new();
        for record in reader.records() {
            let record = record?;
            all.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(Table::from_rows(all))
    }

    /// Select columns by position.
    ///
    /// Output column order follows `indices`; duplicates are preserved. An
    /// index past the table's width is a configuration error, not a silent
    /// empty column.
    pub fn project(&self, indices: &[usize]) -> Result<Table> {
        let width = self.columns.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= width) {
            return Err(JobError::ColumnOutOfRange { index, width });
        }

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table { columns, rows })
    }

    /// Concatenate tables side by side, padding shorter ones with empty
    /// rows so no table loses data.
    pub fn hstack(parts: Vec<Table>) -> Table {
        let height = parts.iter().map(|t| t.num_rows()).max().unwrap_or(0);

        let mut columns = Vec::new();
        let mut rows: Vec<Vec<String>> = (0..height).map(|_| Vec::new()).collect();
        for part in parts {
            let width = part.num_columns();
            columns.extend(part.columns);
            for (r, row) in rows.iter_mut().enumerate() {
                match part.rows.get(r) {
                    Some(cells) => row.extend(cells.iter().cloned()),
                    None => row.extend(iter::repeat_with(String::new).take(width)),
                }
            }
        }

        Table { columns, rows }
    }

    /// Header row followed by data rows, the shape the destination write
    /// expects.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        iter::once(self.columns.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}
