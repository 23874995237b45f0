use sheets_connector::errors::SheetsError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Sheets(#[from] SheetsError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("Requested column index {index} is out of range for a source with {width} columns")]
    ColumnOutOfRange { index: usize, width: usize },

    #[error("Job '{job}' selects no columns from sheet '{sheet}'")]
    EmptySelection { job: String, sheet: String },

    #[error("No fetch strategy produced usable data for sheet '{0}'")]
    NoUsableData(String),

    #[error("No job named '{0}' in the configuration")]
    UnknownJob(String),

    #[error("{0} job(s) failed")]
    JobsFailed(usize),
}

pub type Result<T, E = JobError> = std::result::Result<T, E>;
