#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Failed to sign auth assertion: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid URL: {0}")]
    UrlParseError(String),

    #[error("Request errored with status code {status}: {message}")]
    HttpError {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Auth token exchange failed: {0}")]
    AuthError(String),

    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Export redirected without a location header")]
    MissingRedirectLocation,

    #[error("Too many redirects while fetching export")]
    TooManyRedirects,
}

impl SheetsError {
    /// Whether a retry is expected to help.
    ///
    /// Server-side errors and transport-level timeouts/connection failures
    /// are transient; everything else (4xx, auth, malformed responses) will
    /// recur identically on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            SheetsError::HttpError { status, .. } => status.is_server_error(),
            SheetsError::ReqwestError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T, E = SheetsError> = std::result::Result<T, E>;
