//! Persisted crawl progress document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::organization::Organization;
use crate::utils::time;

/// The single persisted crawl-progress document.
///
/// Field names are fixed by the on-disk format: the cursor and date always
/// describe the window from which the next page fetch will be issued, so a
/// loaded checkpoint is always a consistent resumption point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checkpoint {
    /// 1-based page cursor within the current window
    #[serde(rename = "nextPageToScrape")]
    pub next_page_to_scrape: u32,

    /// End date of the current window, i.e. the crawl position
    #[serde(rename = "searchingDate")]
    pub searching_date: NaiveDate,

    /// Accumulated enriched organizations, deduplicated by login
    pub organizations: Vec<Organization>,
}

impl Checkpoint {
    /// A fresh checkpoint: page 1, today's window, nothing accumulated.
    pub fn starting() -> Self {
        Self {
            next_page_to_scrape: 1,
            searching_date: time::today(),
            organizations: Vec::new(),
        }
    }

    /// Whether an organization with this login was already recorded.
    pub fn contains_login(&self, login: &str) -> bool {
        self.organizations.iter().any(|o| o.login == login)
    }

    /// Move to the next page within the current window.
    pub fn advance_page(&mut self) {
        self.next_page_to_scrape += 1;
    }

    /// Move the window one week earlier and reset the page cursor.
    pub fn advance_window(&mut self) {
        self.searching_date = time::weeks_back(self.searching_date, 1);
        self.next_page_to_scrape = 1;
    }

    /// Append an enriched organization. Returns false (and appends nothing)
    /// if the login was already recorded.
    pub fn append(&mut self, org: Organization) -> bool {
        if self.contains_login(&org.login) {
            return false;
        }
        self.organizations.push(org);
        true
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::starting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrgProfile, OrgStats, Organization};

    fn org(login: &str) -> Organization {
        let profile: OrgProfile = serde_json::from_value(serde_json::json!({
            "login": login,
            "id": 1,
            "html_url": format!("https://github.com/{login}"),
            "created_at": "2015-04-01T10:00:00Z"
        }))
        .unwrap();
        Organization::enriched(profile, OrgStats::default())
    }

    #[test]
    fn test_starting_checkpoint() {
        let cp = Checkpoint::starting();
        assert_eq!(cp.next_page_to_scrape, 1);
        assert!(cp.organizations.is_empty());
    }

    #[test]
    fn test_append_dedups_by_login() {
        let mut cp = Checkpoint::starting();
        assert!(cp.append(org("acme")));
        assert!(!cp.append(org("acme")));
        assert_eq!(cp.organizations.len(), 1);
    }

    #[test]
    fn test_advance_window_resets_page() {
        let mut cp = Checkpoint::starting();
        cp.searching_date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        cp.next_page_to_scrape = 7;

        cp.advance_window();

        assert_eq!(cp.next_page_to_scrape, 1);
        assert_eq!(
            cp.searching_date,
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
        );
    }

    #[test]
    fn test_on_disk_field_names() {
        let mut cp = Checkpoint::starting();
        cp.searching_date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        cp.next_page_to_scrape = 3;

        let json = serde_json::to_value(&cp).unwrap();
        assert_eq!(json["nextPageToScrape"], 3);
        assert_eq!(json["searchingDate"], "2026-08-28");
        assert!(json["organizations"].is_array());
    }
}
