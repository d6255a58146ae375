//! HTTP client for the league API.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::FetchError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.balldontlie.io/";

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("epl-etl/", env!("CARGO_PKG_VERSION"));

/// One upstream request: an endpoint, optionally scoped to a parent key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub endpoint: String,
    pub parent: Option<String>,
}

impl FetchRequest {
    /// Request for a top-level collection, e.g. `epl/v1/teams`.
    pub fn root(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            parent: None,
        }
    }

    /// Request for the collection owned by `parent`, e.g. one team's players.
    pub fn scoped(endpoint: impl Into<String>, parent: impl ToString) -> Self {
        Self {
            endpoint: endpoint.into(),
            parent: Some(parent.to_string()),
        }
    }
}

/// Something that can answer a [`FetchRequest`] with raw JSON records.
///
/// An empty `Vec` means the upstream had no data for the request.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>, FetchError>;
}

/// API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub season: u16,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            season: 2024,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// The `{"data": ...}` response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

/// League API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    season: u16,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| FetchError::Config(format!("invalid API key header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            season: config.season,
        })
    }

    /// Full request URL.
    ///
    /// `{base}/{endpoint}?season={season}` for root requests and
    /// `{base}/{endpoint}/{parent}/players?season={season}` for scoped ones.
    pub fn build_url(&self, request: &FetchRequest) -> String {
        let endpoint = request.endpoint.trim_matches('/');
        match &request.parent {
            Some(parent) => format!(
                "{}/{endpoint}/{parent}/players?season={}",
                self.base_url, self.season
            ),
            None => format!("{}/{endpoint}?season={}", self.base_url, self.season),
        }
    }
}

impl RecordSource for ApiClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>, FetchError> {
        let url = self.build_url(request);
        debug!(%url, "requesting");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "API request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let records = envelope_records(&body)?;
        info!(
            endpoint = %request.endpoint,
            parent = request.parent.as_deref().unwrap_or("-"),
            records = records.len(),
            "API request succeeded"
        );
        Ok(records)
    }
}

/// Records carried by a response body.
///
/// A `data` array yields its elements, a single `data` object yields one record,
/// and a missing or null `data` yields no records.
pub fn envelope_records(body: &str) -> Result<Vec<Value>, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    match envelope.data {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        record @ Value::Object(_) => Ok(vec![record]),
        other => Err(FetchError::Decode(format!(
            "expected `data` to be an array or object, found {other}"
        ))),
    }
}
