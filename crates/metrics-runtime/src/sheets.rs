//! Google Sheets row source.
//!
//! Authenticates with a service account (signed JWT exchanged for a bearer
//! token), reads one worksheet's formatted values and turns the grid into
//! header-keyed records.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use metrics_core::coercion::numericise;
use metrics_core::error::{MetricsError, Result};
use metrics_core::models::{CellValue, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::Credentials;
use crate::source::RowSource;

/// Read-only spreadsheet scope requested for the access token.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of the signed assertion, in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Which worksheet to read and how to reach the API.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// e.g. `https://sheets.googleapis.com`
    pub api_base: String,
    pub timeout: Duration,
}

impl SheetsConfig {
    /// Values endpoint for the whole worksheet.
    pub fn values_url(&self) -> Result<Url> {
        let range = a1_sheet_range(&self.sheet_name);
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| MetricsError::Config(format!("invalid api base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| MetricsError::Config(format!("invalid api base: {}", self.api_base)))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE")
            .append_pair("majorDimension", "ROWS");
        Ok(url)
    }
}

/// A1 range covering a whole sheet; single quotes are doubled.
fn a1_sheet_range(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

// ── SheetsClient ──────────────────────────────────────────────────────────────

/// Row source backed by one worksheet of a Google spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    credentials: Credentials,
    config: SheetsConfig,
}

impl SheetsClient {
    pub fn new(credentials: Credentials, config: SheetsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(http_err)?;
        Ok(Self {
            http,
            credentials,
            config,
        })
    }

    /// Signed RS256 assertion for the token endpoint.
    fn signed_assertion(&self) -> Result<String> {
        let key = &self.credentials.key;
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SHEETS_READONLY_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| MetricsError::InvalidCredentials(e.to_string()))?;
        encode(&header, &claims, &encoding_key)
            .map_err(|e| MetricsError::InvalidCredentials(e.to_string()))
    }

    /// Exchange the signed assertion for a bearer token.
    async fn access_token(&self) -> Result<String> {
        let assertion = self.signed_assertion()?;
        let response = self
            .http
            .post(&self.credentials.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(http_err)?;
        debug!(
            "Obtained access token for {}",
            self.credentials.key.client_email
        );
        Ok(token.access_token)
    }

    async fn fetch_values(&self, token: &str) -> Result<Vec<Vec<Value>>> {
        let url = self.config.values_url()?;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::SourceHttp {
                status: status.as_u16(),
                body,
            });
        }

        let range: ValueRange = response.json().await.map_err(http_err)?;
        Ok(range.values)
    }
}

impl RowSource for SheetsClient {
    fn describe(&self) -> String {
        format!(
            "sheet \"{}\" of spreadsheet {}",
            self.config.sheet_name, self.config.spreadsheet_id
        )
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>> {
        let token = self.access_token().await?;
        let grid = self.fetch_values(&token).await?;
        Ok(grid_to_rows(&self.config.sheet_name, grid))
    }
}

fn http_err(e: reqwest::Error) -> MetricsError {
    MetricsError::Http(e.to_string())
}

// ── Grid conversion ───────────────────────────────────────────────────────────

/// Turn a value grid into records keyed by the first row.
///
/// Short rows are padded with empty cells and cells beyond the header are
/// dropped. When a header repeats, the rightmost column's value is kept in
/// the position of the first occurrence. An empty grid yields no rows.
pub fn grid_to_rows(sheet_name: &str, grid: Vec<Vec<Value>>) -> Vec<Row> {
    let mut lines = grid.into_iter();
    let Some(header_line) = lines.next() else {
        warn!("Sheet \"{}\" is empty", sheet_name);
        return Vec::new();
    };

    let header: Vec<String> = header_line.into_iter().map(header_name).collect();
    for name in duplicate_headers(&header) {
        warn!(
            "Sheet \"{}\" repeats header \"{}\"; the rightmost column wins",
            sheet_name, name
        );
    }

    lines
        .map(|line| {
            let mut cells = line.into_iter();
            header
                .iter()
                .map(|name| {
                    let cell = cells.next().map(wire_cell).unwrap_or(CellValue::Empty);
                    (name.clone(), cell)
                })
                .collect::<Row>()
        })
        .collect()
}

/// Header names that occur more than once, in first-repeat order.
fn duplicate_headers(header: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for name in header {
        if !seen.insert(name.as_str()) && !repeated.contains(&name.as_str()) {
            repeated.push(name.as_str());
        }
    }
    repeated
}

fn header_name(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn wire_cell(value: Value) -> CellValue {
    match value {
        Value::String(s) => numericise(&s),
        other => CellValue::from(other),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
