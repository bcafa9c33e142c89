//! Read-side client for the time-tracking API.
//!
//! Resolves the authenticated user and fetches monthly diary
//! summaries. Responses are cached in-process under semantic keys for
//! the client's lifetime; there is no eviction.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::model::{DiaryEntry, MonthWindow, UserId};
use crate::token;

/// Errors from a single API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, ApiError>;

/// Raw response off the wire: status code and body text.
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Blocking transport seam.
///
/// One authenticated GET in, status and body out. The real
/// implementation is [`HttpTransport`]; tests substitute a fake.
pub trait Transport {
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<Response>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build the transport.
    ///
    /// `insecure` disables TLS certificate verification. Only for
    /// installations with broken certificate chains, and only by
    /// explicit operator opt-in.
    pub fn new(insecure: bool) -> Result<Self> {
        if insecure {
            tracing::warn!("TLS certificate verification is disabled");
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<Response> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Response { status, body })
    }
}

/// Client for the time-tracking API with a process-lifetime cache.
pub struct ApiClient<T> {
    token: String,
    base_url: String,
    transport: T,
    cache: HashMap<String, Value>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(token: String, base_url: &str, transport: T) -> Self {
        Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            cache: HashMap::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Resolve the authenticated user's id.
    ///
    /// Tries the cheap local claim decode first; on any structural
    /// failure falls back to `GET /users/self`. `None` means both
    /// paths failed, which the caller must treat as fatal.
    pub fn resolve_user_id(&mut self) -> Option<UserId> {
        if let Some(id) = token::user_id_from_token(&self.token) {
            tracing::debug!("extracted user id {id} from token");
            return Some(id);
        }

        tracing::info!("token claim unavailable, fetching user info from the API");
        self.user_id_from_api()
    }

    fn user_id_from_api(&mut self) -> Option<UserId> {
        let response = match self.get_json("users_self", "/users/self") {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to fetch user info: {e}");
                return None;
            }
        };

        let id = response.get("id").and_then(Value::as_i64);
        if id.is_none() {
            tracing::error!("user info response carries no id field");
        }
        id
    }

    /// Fetch the diary summary for one month.
    ///
    /// Any failure (network, non-2xx, or a response without a
    /// `diaries` array) degrades to an empty list, so the caller can
    /// tell "no data" apart from a crash.
    pub fn monthly_diaries(&mut self, user_id: UserId, year: i16, month: i8) -> Vec<DiaryEntry> {
        let window = match MonthWindow::new(year, month) {
            Ok(window) => window,
            Err(e) => {
                tracing::error!("invalid month {year}-{month}: {e}");
                return Vec::new();
            }
        };

        let key = format!("monthly_diaries_{user_id}_{year}_{month}");
        let path = format!(
            "/svc/core/diariesquery/users/{user_id}/diaries/summary/presence\
             ?userId={user_id}&fromDate={from}&toDate={to}&pageSize={page}\
             &includeHourTypes=true&includeNotHourTypes=true&includeDifference=true",
            from = window.first,
            to = window.last,
            page = window.days(),
        );

        let response = match self.get_json(&key, &path) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to fetch monthly diaries: {e}");
                return Vec::new();
            }
        };

        let Some(diaries) = response.get("diaries") else {
            tracing::error!("diary summary response carries no diaries field");
            return Vec::new();
        };

        match serde_json::from_value(diaries.clone()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("malformed diaries array: {e}");
                Vec::new()
            }
        }
    }

    /// GET a JSON endpoint, consulting the cache first.
    fn get_json(&mut self, cache_key: &str, path: &str) -> Result<Value> {
        if let Some(cached) = self.cache.get(cache_key) {
            tracing::debug!("cache hit for {cache_key}");
            return Ok(cached.clone());
        }

        let url = format!("{}{path}", self.base_url);
        let headers = [
            ("Authorization", format!("Bearer {}", self.token)),
            ("Content-Type", "application/json".to_string()),
        ];

        tracing::debug!("GET {url}");
        let response = self.transport.get(&url, &headers)?;
        if !(200..300).contains(&response.status) {
            return Err(ApiError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let value: Value = serde_json::from_str(&response.body)?;
        self.cache.insert(cache_key.to_string(), value.clone());
        Ok(value)
    }
}
