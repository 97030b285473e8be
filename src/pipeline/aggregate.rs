// src/pipeline/aggregate.rs

//! Pure aggregation of repository activity into organization counters.

use crate::models::{OrgStats, RepoActivity};

/// Sum the five counters across a list of repositories.
///
/// Absent upstream counts contribute zero. An empty list yields all-zero
/// counters.
pub fn aggregate(activity: &[RepoActivity]) -> OrgStats {
    activity.iter().fold(OrgStats::default(), |mut acc, a| {
        acc.total_stars += a.repo.stargazers_count.unwrap_or(0);
        acc.total_watchers += a.repo.watchers_count.unwrap_or(0);
        acc.total_forks += a.repo.forks_count.unwrap_or(0);
        acc.total_open_issues += a.repo.open_issues_count.unwrap_or(0);
        acc.total_events += a.events;
        acc
    })
}
