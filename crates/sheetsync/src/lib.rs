//! Resilient spreadsheet-to-spreadsheet column sync.
//!
//! Jobs read configured column projections out of source worksheets,
//! falling through progressively blunter fetch strategies when the
//! preferred API surface is rate-limited or degraded, then rewrite a
//! destination sheet with the stacked result.

pub mod config;
pub mod errors;
pub mod fetch;
pub mod job;
pub mod retry;
pub mod table;
