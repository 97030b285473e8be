//! Service layer for the crawler application.
//!
//! This module contains the remote-facing logic:
//! - Typed GitHub API access (`GithubClient`, behind the `OrgApi` trait)
//! - Rate-limit and retry discipline around every call (`Governor`)

mod api;
mod governor;

pub use api::{
    ApiResponse, GithubClient, OrgApi, OrgSummary, RateLimitInfo, RepoEvent, SearchResults,
};
pub use governor::Governor;
