use crate::error::ApiError;
use crate::responses::{ApiErrorResponse, LeaderboardResponse, ListEnvelope, RawTransaction, RawUser, RawUserSummary};
use analytics::{LeaderboardEntry, UserSummaryReport};
use async_trait::async_trait;
use configuration::ApiSettings;
use core_types::{DateWindow, SortDirection, Transaction, User};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

pub mod error;
pub mod responses;
pub mod retry;


// --- Public API ---
pub use responses::{RawMovie, RawUserInfo};
pub use retry::RetryPolicy;

/// The server compares window bounds to its stored ISO timestamps as text.
const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// The abstract interface to the marketplace API.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// `GET /users/{userId}`
    async fn get_user(&self, user_id: &str) -> Result<User, ApiError>;

    /// `GET /user-transactions/{userId}?limit=N`, most recent first.
    ///
    /// With a window, the server only returns transactions stamped inside it.
    async fn get_user_transactions(
        &self,
        user_id: &str,
        limit: u32,
        window: Option<DateWindow>,
    ) -> Result<Vec<Transaction>, ApiError>;

    /// `GET /users`
    async fn get_all_users(&self) -> Result<Vec<User>, ApiError>;

    /// `GET /users/leaderboard?limit=N&order=asc|desc`, ranked by the server.
    async fn get_leaderboard(&self, limit: i64, order: SortDirection) -> Result<Vec<LeaderboardEntry>, ApiError>;

    /// `GET /users/{userId}/summary`, composed by the server.
    async fn get_user_summary(&self, user_id: &str) -> Result<UserSummaryReport, ApiError>;
}

/// A concrete implementation of the `ApiClient` over HTTP.
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim()).map_err(|e| {
            ApiError::Validation(format!("invalid API base URL '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "API base URL '{}' cannot carry a path",
                settings.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::from_settings(settings),
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Validation(format!("API base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issues a GET, retrying connectivity failures according to the retry policy.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            match self.get_once(&url, query).await {
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying."
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &Url, query: &[(&str, String)]) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "GET");

        let response = self.client.get(url.clone()).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| {
                ApiError::Validation(format!("unexpected response body from {}: {}", url.path(), e))
            })
        } else {
            Err(error_from_body(status, &text))
        }
    }
}

/// Builds an `ApiError` from a non-success response, pulling the message out
/// of the body when there is one.
fn error_from_body(status: StatusCode, text: &str) -> ApiError {
    let fallback = match status {
        StatusCode::NOT_FOUND => "The requested resource was not found".to_string(),
        _ => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
    };
    let message = serde_json::from_str::<ApiErrorResponse>(text)
        .unwrap_or_default()
        .message_or(&fallback);
    ApiError::from_status(status, message)
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        let url = self.endpoint(&["users", user_id])?;
        let raw: RawUser = self.get_json(url, &[]).await?;
        User::try_from(raw)
    }

    async fn get_user_transactions(
        &self,
        user_id: &str,
        limit: u32,
        window: Option<DateWindow>,
    ) -> Result<Vec<Transaction>, ApiError> {
        let url = self.endpoint(&["user-transactions", user_id])?;
        let mut query = vec![("limit", limit.to_string())];
        if let Some(window) = window {
            query.push(("start_date", window.start.format(WINDOW_FORMAT).to_string()));
            query.push(("end_date", window.end.format(WINDOW_FORMAT).to_string()));
        }
        let raw: ListEnvelope<RawTransaction> = self.get_json(url, &query).await?;
        raw.into_items().into_iter().map(Transaction::try_from).collect()
    }

    async fn get_all_users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.endpoint(&["users"])?;
        let raw: ListEnvelope<RawUser> = self.get_json(url, &[]).await?;
        raw.into_items().into_iter().map(User::try_from).collect()
    }

    async fn get_leaderboard(&self, limit: i64, order: SortDirection) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let url = self.endpoint(&["users", "leaderboard"])?;
        let response: LeaderboardResponse = self
            .get_json(url, &[("limit", limit.to_string()), ("order", order.to_string())])
            .await?;
        tracing::debug!(
            rows = response.leaderboard.len(),
            total_users = ?response.total_users,
            "Leaderboard received."
        );
        Ok(response.leaderboard)
    }

    async fn get_user_summary(&self, user_id: &str) -> Result<UserSummaryReport, ApiError> {
        let url = self.endpoint(&["users", user_id, "summary"])?;
        let raw: RawUserSummary = self.get_json(url, &[]).await?;
        UserSummaryReport::try_from(raw)
    }
}
