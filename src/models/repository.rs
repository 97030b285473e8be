//! Repository data structures.

use serde::{Deserialize, Serialize};

/// A repository owned by an organization, as returned by the API.
///
/// The numeric counters are optional because the API omits them for some
/// repository states; aggregation treats absent values as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// Repository name
    pub name: String,

    /// Stargazer count
    #[serde(default)]
    pub stargazers_count: Option<u64>,

    /// Watcher count
    #[serde(default)]
    pub watchers_count: Option<u64>,

    /// Fork count
    #[serde(default)]
    pub forks_count: Option<u64>,

    /// Open issue count
    #[serde(default)]
    pub open_issues_count: Option<u64>,
}

/// A repository paired with its recent-activity event count.
///
/// A repository whose event feed is access-blocked contributes zero events
/// rather than failing the enrichment of its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoActivity {
    pub repo: Repository,
    pub events: u64,
}

impl RepoActivity {
    pub fn new(repo: Repository, events: u64) -> Self {
        Self { repo, events }
    }
}
