use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, LOCATION};
use reqwest::{redirect, Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{trace, warn};

use crate::auth::{self, ServiceAccountKey, Token};
use crate::errors::{Result, SheetsError};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/";
const DEFAULT_EXPORT_BASE: &str = "https://docs.google.com/";
const DEFAULT_SCOPES: &[&str] = &[auth::SPREADSHEETS_SCOPE, auth::DRIVE_SCOPE];

/// How many explicit redirect hops the export path will follow.
const MAX_REDIRECT_HOPS: usize = 5;

/// How much of an error response body to keep in the error message.
const ERROR_BODY_SNIPPET_LEN: usize = 512;

#[derive(Debug, Default)]
pub struct SheetsClientBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    api_base: Option<String>,
    export_base: Option<String>,
}

impl SheetsClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    /// Override the API endpoint, mainly for tests.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Override the document export endpoint, mainly for tests.
    pub fn export_base(mut self, base: impl Into<String>) -> Self {
        self.export_base = Some(base.into());
        self
    }

    /// Authenticate with a service account key and build the client.
    pub async fn connect(self, service_account_json: &str) -> Result<SheetsClient> {
        let key = ServiceAccountKey::from_json(service_account_json)?;
        let http = self.build_http()?;
        let token = auth::authenticate(&http, &key, DEFAULT_SCOPES).await?;
        self.assemble(http, token)
    }

    /// Build the client around an existing bearer token.
    pub fn build(self, token: Token) -> Result<SheetsClient> {
        let http = self.build_http()?;
        self.assemble(http, token)
    }

    fn build_http(&self) -> Result<Client> {
        // Redirects are handled explicitly by the export path so the bearer
        // credential is never forwarded to a redirect target automatically.
        let mut builder = Client::builder()
            .user_agent(APP_USER_AGENT)
            .redirect(redirect::Policy::none());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        Ok(builder.build()?)
    }

    fn assemble(self, inner: Client, token: Token) -> Result<SheetsClient> {
        let api_base = parse_base(self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE))?;
        let export_base = parse_base(self.export_base.as_deref().unwrap_or(DEFAULT_EXPORT_BASE))?;
        Ok(SheetsClient {
            api_base,
            export_base,
            token,
            inner,
        })
    }
}

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| SheetsError::UrlParseError(format!("{base}: {e}")))
}

#[derive(Debug)]
pub struct SheetsClient {
    api_base: Url,
    export_base: Url,
    token: Token,
    inner: Client,
}

impl SheetsClient {
    pub fn builder() -> SheetsClientBuilder {
        SheetsClientBuilder::default()
    }

    /// Authenticate with a service account key using default settings.
    pub async fn connect(service_account_json: &str) -> Result<SheetsClient> {
        SheetsClientBuilder::default().connect(service_account_json).await
    }

    fn bearer(&self) -> Result<HeaderValue> {
        if !self.token.is_valid() {
            warn!("bearer token is past its validity window");
        }
        let val = format!("Bearer {}", self.token.value());
        HeaderValue::from_str(&val)
            .map_err(|_| SheetsError::AuthError("token is not a valid header value".to_string()))
    }

    /// Build an API URL from path segments; segments are percent-encoded.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::UrlParseError("api base cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn export_url(&self, spreadsheet_id: &str, sheet_id: i64) -> Result<Url> {
        let mut url = self.export_base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::UrlParseError("export base cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", "d", spreadsheet_id, "export"]);
        url.query_pairs_mut()
            .append_pair("format", "csv")
            .append_pair("gid", &sheet_id.to_string());
        Ok(url)
    }

    /// Issue an authenticated request expecting a JSON response.
    pub(crate) async fn execute<Q, B, R>(
        &self,
        method: Method,
        url: Url,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<R>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut req = self
            .inner
            .request(method, url)
            .header(AUTHORIZATION, self.bearer()?);
        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Self::status_error(status, res.text().await.unwrap_or_default()));
        }

        let res = res.text().await?;
        trace!(%res, "response");

        Ok(serde_json::from_str(&res)?)
    }

    /// Fetch a document export, following redirects by hand so the original
    /// bearer credential is attached to every hop.
    pub(crate) async fn fetch_export(&self, url: Url) -> Result<String> {
        let mut url = url;
        for _ in 0..MAX_REDIRECT_HOPS {
            let res = self
                .inner
                .get(url.clone())
                .header(AUTHORIZATION, self.bearer()?)
                .send()
                .await?;

            let status = res.status();
            if status.is_redirection() {
                let location = res
                    .headers()
                    .get(LOCATION)
                    .ok_or(SheetsError::MissingRedirectLocation)?
                    .to_str()
                    .map_err(|_| {
                        SheetsError::MalformedResponse(
                            "redirect location is not valid utf-8".to_string(),
                        )
                    })?;
                trace!(%location, "following export redirect");
                url = url
                    .join(location)
                    .map_err(|e| SheetsError::UrlParseError(format!("{location}: {e}")))?;
                continue;
            }
            if !status.is_success() {
                return Err(Self::status_error(status, res.text().await.unwrap_or_default()));
            }

            return Ok(res.text().await?);
        }
        Err(SheetsError::TooManyRedirects)
    }

    fn status_error(status: StatusCode, body: String) -> SheetsError {
        let mut message = body;
        if message.len() > ERROR_BODY_SNIPPET_LEN {
            let mut cut = ERROR_BODY_SNIPPET_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        SheetsError::HttpError { status, message }
    }
}
