//! Organization data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters derived from an organization's repositories.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgStats {
    /// Sum of stargazers across all repositories
    pub total_stars: u64,

    /// Sum of watchers across all repositories
    pub total_watchers: u64,

    /// Sum of forks across all repositories
    pub total_forks: u64,

    /// Sum of open issues across all repositories
    pub total_open_issues: u64,

    /// Sum of recent-activity events across all repositories
    pub total_events: u64,
}

/// A full organization profile as returned by the API, before enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgProfile {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An enriched organization record.
///
/// Immutable once appended to the checkpoint within a run; never updated
/// in place even if the upstream counters change later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    /// Account login (dedup key)
    pub login: String,

    /// Numeric account id
    pub id: u64,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Web profile URL
    pub html_url: String,

    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,

    /// Profile description
    #[serde(default)]
    pub description: Option<String>,

    /// Blog / website URL
    #[serde(default)]
    pub blog: Option<String>,

    /// Location string
    #[serde(default)]
    pub location: Option<String>,

    /// Public contact email
    #[serde(default)]
    pub email: Option<String>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last profile update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Derived aggregate counters
    #[serde(flatten)]
    pub stats: OrgStats,
}

impl Organization {
    /// Assemble an enriched record from a profile and its aggregated
    /// repository activity.
    pub fn enriched(profile: OrgProfile, stats: OrgStats) -> Self {
        Self {
            login: profile.login,
            id: profile.id,
            name: profile.name,
            html_url: profile.html_url,
            avatar_url: profile.avatar_url,
            description: profile.description,
            blog: profile.blog,
            location: profile.location,
            email: profile.email,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            stats,
        }
    }

    /// Display name for progress output, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.login)
    }
}
