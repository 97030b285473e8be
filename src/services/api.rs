// src/services/api.rs

//! Typed GitHub REST API client.
//!
//! Maps non-success responses onto the crawl's error taxonomy: permanent
//! access blocks, exhausted rate limits (with the reset instant from the
//! `x-ratelimit-*` headers), and everything else as a plain API error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, OrgProfile, Repository};

/// Page size used when exhausting a repository's event feed.
const EVENT_PAGE_SIZE: u32 = 100;

/// Rate-limit metadata carried by every response and error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Remaining quota in the current window
    pub remaining: Option<u32>,
    /// Instant (epoch seconds) at which the quota resets
    pub reset_at: Option<i64>,
}

impl RateLimitInfo {
    /// Parse the `x-ratelimit-remaining` / `x-ratelimit-reset` headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)?
                .to_str()
                .ok()?
                .parse()
                .ok()
        }

        Self {
            remaining: parse(headers, "x-ratelimit-remaining"),
            reset_at: parse(headers, "x-ratelimit-reset"),
        }
    }

    /// Whether the quota is known to be exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// A decoded payload together with its rate-limit metadata.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub rate: RateLimitInfo,
}

/// One page of organization search results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub items: Vec<OrgSummary>,
}

/// A search hit: just enough identity to drive enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgSummary {
    pub login: String,
    pub id: u64,
}

/// A recent-activity event on a repository. Only its presence is counted.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
}

/// The remote operations the crawl consumes.
#[async_trait]
pub trait OrgApi: Send + Sync {
    /// Search organization accounts matching a query.
    async fn search_organizations(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ApiResponse<SearchResults>>;

    /// Fetch a full organization profile.
    async fn get_organization(&self, login: &str) -> Result<ApiResponse<OrgProfile>>;

    /// List all repositories owned by an organization, exhausting
    /// pagination with pages of `per_page`.
    async fn list_repositories(
        &self,
        login: &str,
        per_page: u32,
    ) -> Result<ApiResponse<Vec<Repository>>>;

    /// List recent activity events for one repository, exhausting
    /// pagination (the upstream feed itself only retains recent events).
    async fn list_repo_events(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<ApiResponse<Vec<RepoEvent>>>;
}

/// Fetch pages of a listing until a short (or empty) page signals the end,
/// concatenating the results. The rate metadata of the last page is kept.
async fn fetch_all_pages<T, F, Fut>(per_page: u32, fetch: F) -> Result<ApiResponse<Vec<T>>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<ApiResponse<Vec<T>>>>,
{
    let mut all = Vec::new();
    let mut page = 1;

    loop {
        let response = fetch(page).await?;
        let fetched = response.data.len() as u32;
        all.extend(response.data);

        if fetched < per_page {
            return Ok(ApiResponse {
                data: all,
                rate: response.rate,
            });
        }
        page += 1;
    }
}

/// Error body shape for non-success responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    block: Option<ApiErrorBlock>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBlock {
    #[serde(default)]
    reason: Option<String>,
}

/// reqwest-backed implementation of [`OrgApi`].
pub struct GithubClient {
    config: ApiConfig,
    client: Client,
}

impl GithubClient {
    /// Create a new client from the API configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Issue a GET request and decode the JSON payload, classifying
    /// non-success statuses into the error taxonomy.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let mut request = self
            .client
            .get(&url)
            .header("accept", "application/vnd.github+json")
            .query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let rate = RateLimitInfo::from_headers(response.headers());

        if status.is_success() {
            let data = response.json::<T>().await?;
            return Ok(ApiResponse { data, rate });
        }

        Err(Self::classify_failure(status, rate, &response.text().await?))
    }

    /// Map a non-success response to the error taxonomy, by metadata:
    /// permanent blocks first, then exhausted quota, then a plain API error.
    fn classify_failure(status: StatusCode, rate: RateLimitInfo, body: &str) -> AppError {
        let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| status.to_string());

        let block_reason = parsed.as_ref().and_then(|b| {
            b.block
                .as_ref()
                .and_then(|block| block.reason.clone())
                .or_else(|| {
                    b.message
                        .as_ref()
                        .filter(|m| m.to_lowercase().contains("blocked"))
                        .cloned()
                })
        });
        if status == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS || block_reason.is_some() {
            return AppError::ResourceBlocked {
                reason: block_reason.unwrap_or(message),
            };
        }

        if rate.is_exhausted() {
            return AppError::RateLimited {
                reset_at: rate.reset_at.unwrap_or_else(|| Utc::now().timestamp()),
            };
        }

        AppError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl OrgApi for GithubClient {
    async fn search_organizations(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ApiResponse<SearchResults>> {
        self.get_json(
            "/search/users",
            &[
                ("q", query.to_string()),
                ("sort", sort.to_string()),
                ("order", order.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    async fn get_organization(&self, login: &str) -> Result<ApiResponse<OrgProfile>> {
        self.get_json(&format!("/orgs/{login}"), &[]).await
    }

    async fn list_repositories(
        &self,
        login: &str,
        per_page: u32,
    ) -> Result<ApiResponse<Vec<Repository>>> {
        fetch_all_pages(per_page, |page| async move {
            self.get_json(
                &format!("/orgs/{login}/repos"),
                &[
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await
        })
        .await
    }

    async fn list_repo_events(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<ApiResponse<Vec<RepoEvent>>> {
        fetch_all_pages(EVENT_PAGE_SIZE, |page| async move {
            self.get_json(
                &format!("/repos/{owner}/{repo}/events"),
                &[
                    ("per_page", EVENT_PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await
        })
        .await
    }
}
