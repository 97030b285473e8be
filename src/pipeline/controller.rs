// src/pipeline/controller.rs

//! Date-windowed crawl controller.
//!
//! The search endpoint caps how many results one query can page through,
//! so the controller partitions the result space into 7-day creation-date
//! windows and walks them backward from today toward the creation date of
//! the oldest matching organization. Every state-changing step (entity
//! append, page advance, window advance) persists the checkpoint before
//! the next remote call is issued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{CrawlConfig, Organization, RepoActivity};
use crate::pipeline::aggregate::aggregate;
use crate::services::{Governor, OrgApi, OrgSummary};
use crate::storage::CheckpointStore;
use crate::utils::{log, time};

/// Windows shrink backward by one calendar week at a time.
const WINDOW_WEEKS: i64 = 1;

/// Page size for repository listings during enrichment.
const REPO_PAGE_SIZE: u32 = 100;

/// Crawl bounds computed once at bootstrap.
#[derive(Debug, Clone, Copy)]
struct CrawlBounds {
    /// Total candidate count reported by the unwindowed search
    total_candidates: u64,
    /// Creation date of the chronologically oldest matching organization
    lower_bound: NaiveDate,
}

/// Summary of one controller run.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Organizations appended during this run
    pub appended: usize,
    /// Total candidates reported at bootstrap
    pub total_candidates: u64,
    /// Window position when the run ended
    pub final_date: NaiveDate,
    /// Whether the run stopped on the cancel flag rather than completing
    pub cancelled: bool,
}

/// Orchestrates the windowed pagination state machine.
pub struct CrawlController<A, S> {
    api: A,
    store: S,
    governor: Governor,
    config: CrawlConfig,
    show_progress: bool,
    cancel: Arc<AtomicBool>,
}

impl<A: OrgApi, S: CheckpointStore> CrawlController<A, S> {
    pub fn new(
        api: A,
        store: S,
        governor: Governor,
        config: CrawlConfig,
        show_progress: bool,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            api,
            store,
            governor,
            config,
            show_progress,
            cancel,
        }
    }

    /// Run the crawl to completion (or cancellation), resuming from the
    /// persisted checkpoint.
    pub async fn run(&self) -> Result<CrawlOutcome> {
        let mut checkpoint = self.store.load_or_default().await;
        let already_recorded = checkpoint.organizations.len();

        if self.is_cancelled() {
            log::warn("Crawl cancelled before bootstrap; checkpoint retained for resume");
            return Ok(CrawlOutcome {
                appended: 0,
                total_candidates: 0,
                final_date: checkpoint.searching_date,
                cancelled: true,
            });
        }

        let Some(bounds) = self.bootstrap().await? else {
            log::info("Search returned no matching organizations");
            return Ok(CrawlOutcome {
                appended: 0,
                total_candidates: 0,
                final_date: checkpoint.searching_date,
                cancelled: false,
            });
        };
        log::info(&format!(
            "{} candidates; crawling back to {}",
            bounds.total_candidates, bounds.lower_bound
        ));

        let mut cancelled = false;
        'crawl: while checkpoint.searching_date > bounds.lower_bound {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            let query = self.window_query(checkpoint.searching_date);
            let page = checkpoint.next_page_to_scrape;
            let results = self
                .governor
                .run("organization search", || {
                    self.api
                        .search_organizations(&query, "joined", "asc", page, self.config.per_page)
                })
                .await?
                .data;

            if results.items.is_empty() {
                // Window exhausted; never terminal by itself.
                checkpoint.advance_window();
                self.store.save(&checkpoint).await?;
                continue;
            }

            for candidate in &results.items {
                if self.is_cancelled() {
                    cancelled = true;
                    break 'crawl;
                }
                if checkpoint.contains_login(&candidate.login) {
                    continue;
                }

                let Some(org) = self.enrich(candidate).await? else {
                    // Zero repositories: nothing to aggregate, nothing persisted.
                    continue;
                };

                if self.show_progress {
                    log::progress(&format!(
                        "[{}/{}] {}  events: {}  stars: {}",
                        checkpoint.organizations.len() + 1,
                        bounds.total_candidates,
                        org.display_name(),
                        org.stats.total_events,
                        org.stats.total_stars,
                    ));
                }

                checkpoint.append(org);
                self.store.save(&checkpoint).await?;
            }

            checkpoint.advance_page();
            self.store.save(&checkpoint).await?;
        }

        if cancelled {
            log::warn("Crawl cancelled; checkpoint retained for resume");
        } else {
            log::success("Crawl complete: window passed the oldest matching organization");
        }

        Ok(CrawlOutcome {
            appended: checkpoint.organizations.len() - already_recorded,
            total_candidates: bounds.total_candidates,
            final_date: checkpoint.searching_date,
            cancelled,
        })
    }

    /// Fetch the chronologically-first matching organization to obtain the
    /// total candidate count and the crawl's lower-bound creation date.
    async fn bootstrap(&self) -> Result<Option<CrawlBounds>> {
        let results = self
            .governor
            .run("bootstrap search", || {
                self.api
                    .search_organizations(&self.config.query, "joined", "asc", 1, 1)
            })
            .await?
            .data;

        let Some(oldest) = results.items.first() else {
            return Ok(None);
        };

        let profile = self
            .governor
            .run("bootstrap profile", || {
                self.api.get_organization(&oldest.login)
            })
            .await?
            .data;

        Ok(Some(CrawlBounds {
            total_candidates: results.total_count,
            lower_bound: profile.created_at.date_naive(),
        }))
    }

    /// Enrich one candidate: repositories, full profile, per-repository
    /// event counts, aggregated counters.
    ///
    /// Returns None for an organization without repositories. A blocked
    /// event feed contributes zero events for that repository only; any
    /// other failure propagates and aborts the run.
    async fn enrich(&self, candidate: &OrgSummary) -> Result<Option<Organization>> {
        let repos = self
            .governor
            .run("repository list", || {
                self.api.list_repositories(&candidate.login, REPO_PAGE_SIZE)
            })
            .await?
            .data;
        if repos.is_empty() {
            return Ok(None);
        }

        let profile = self
            .governor
            .run("organization profile", || {
                self.api.get_organization(&candidate.login)
            })
            .await?
            .data;

        let mut activity = Vec::with_capacity(repos.len());
        for repo in repos {
            let events = match self
                .governor
                .run("event list", || {
                    self.api.list_repo_events(&candidate.login, &repo.name)
                })
                .await
            {
                Ok(response) => response.data.len() as u64,
                Err(err) if err.is_blocked() => {
                    log::warn(&format!(
                        "Events blocked for {}/{}; counting zero",
                        candidate.login, repo.name
                    ));
                    0
                }
                Err(err) => return Err(err),
            };
            activity.push(RepoActivity::new(repo, events));
        }

        let stats = aggregate(&activity);
        Ok(Some(Organization::enriched(profile, stats)))
    }

    /// Search query for the window ending at `end`: the base query plus a
    /// creation-date qualifier one week wide.
    fn window_query(&self, end: NaiveDate) -> String {
        let start = time::weeks_back(end, WINDOW_WEEKS);
        format!("{} created:{}..{}", self.config.query, start, end)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::error::AppError;
    use crate::models::{Checkpoint, OrgProfile, Repository};
    use crate::services::{ApiResponse, RateLimitInfo, RepoEvent, SearchResults};

    /// Event feed behavior for one fake repository.
    #[derive(Clone)]
    enum FakeEvents {
        Count(u64),
        Blocked,
        Broken,
    }

    #[derive(Clone)]
    struct FakeOrg {
        login: String,
        id: u64,
        created: NaiveDate,
        repos: Vec<(Repository, FakeEvents)>,
    }

    struct FakeApi {
        orgs: Vec<FakeOrg>,
        remote_calls: Arc<AtomicU32>,
    }

    impl FakeApi {
        fn new(orgs: Vec<FakeOrg>) -> Self {
            Self {
                orgs,
                remote_calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn count_call(&self) {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn respond<T>(data: T) -> Result<ApiResponse<T>> {
        Ok(ApiResponse {
            data,
            rate: RateLimitInfo::default(),
        })
    }

    /// Parse the `created:START..END` qualifier our controller appends.
    fn parse_window(query: &str) -> Option<(NaiveDate, NaiveDate)> {
        let range = query
            .split_whitespace()
            .find_map(|term| term.strip_prefix("created:"))?;
        let (start, end) = range.split_once("..")?;
        Some((start.parse().ok()?, end.parse().ok()?))
    }

    #[async_trait]
    impl OrgApi for FakeApi {
        async fn search_organizations(
            &self,
            query: &str,
            _sort: &str,
            _order: &str,
            page: u32,
            per_page: u32,
        ) -> Result<ApiResponse<SearchResults>> {
            self.count_call();
            let window = parse_window(query);
            let mut matched: Vec<&FakeOrg> = self
                .orgs
                .iter()
                .filter(|o| match window {
                    Some((start, end)) => o.created >= start && o.created <= end,
                    None => true,
                })
                .collect();
            matched.sort_by_key(|o| o.created);

            let total_count = matched.len() as u64;
            let items = matched
                .into_iter()
                .skip(((page - 1) * per_page) as usize)
                .take(per_page as usize)
                .map(|o| OrgSummary {
                    login: o.login.clone(),
                    id: o.id,
                })
                .collect();

            respond(SearchResults { total_count, items })
        }

        async fn get_organization(&self, login: &str) -> Result<ApiResponse<OrgProfile>> {
            self.count_call();
            let org = self
                .orgs
                .iter()
                .find(|o| o.login == login)
                .expect("unknown login in test fixture");
            let created_at: DateTime<Utc> = org
                .created
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc();

            respond(OrgProfile {
                login: org.login.clone(),
                id: org.id,
                name: None,
                html_url: format!("https://github.com/{}", org.login),
                avatar_url: None,
                description: None,
                blog: None,
                location: None,
                email: None,
                created_at,
                updated_at: None,
            })
        }

        async fn list_repositories(
            &self,
            login: &str,
            _per_page: u32,
        ) -> Result<ApiResponse<Vec<Repository>>> {
            self.count_call();
            let org = self.orgs.iter().find(|o| o.login == login).unwrap();
            respond(org.repos.iter().map(|(r, _)| r.clone()).collect())
        }

        async fn list_repo_events(
            &self,
            owner: &str,
            repo: &str,
        ) -> Result<ApiResponse<Vec<RepoEvent>>> {
            self.count_call();
            let org = self.orgs.iter().find(|o| o.login == owner).unwrap();
            let (_, events) = org
                .repos
                .iter()
                .find(|(r, _)| r.name == repo)
                .unwrap();

            match events {
                FakeEvents::Count(n) => respond(
                    (0..*n)
                        .map(|i| RepoEvent {
                            id: Some(i.to_string()),
                            event_type: Some("PushEvent".into()),
                        })
                        .collect(),
                ),
                FakeEvents::Blocked => Err(AppError::blocked("events blocked")),
                FakeEvents::Broken => Err(AppError::Api {
                    status: 500,
                    message: "server error".into(),
                }),
            }
        }
    }

    /// In-memory store recording every save for state-machine assertions.
    #[derive(Default)]
    struct MemoryStore {
        current: Mutex<Checkpoint>,
        saves: Mutex<Vec<Checkpoint>>,
    }

    impl MemoryStore {
        fn starting_from(checkpoint: Checkpoint) -> Self {
            Self {
                current: Mutex::new(checkpoint),
                saves: Mutex::new(Vec::new()),
            }
        }

        fn saves(&self) -> Vec<Checkpoint> {
            self.saves.lock().unwrap().clone()
        }

        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }

        fn current(&self) -> Checkpoint {
            self.current.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<'a> CheckpointStore for &'a MemoryStore {
        async fn load_or_default(&self) -> Checkpoint {
            self.current.lock().unwrap().clone()
        }

        async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
            *self.current.lock().unwrap() = checkpoint.clone();
            self.saves.lock().unwrap().push(checkpoint.clone());
            Ok(())
        }
    }

    fn repo(name: &str, stars: u64, watchers: u64, forks: u64, issues: u64) -> Repository {
        Repository {
            name: name.to_string(),
            stargazers_count: Some(stars),
            watchers_count: Some(watchers),
            forks_count: Some(forks),
            open_issues_count: Some(issues),
        }
    }

    fn days_ago(days: i64) -> NaiveDate {
        time::today() - chrono::Duration::days(days)
    }

    /// Four-window fixture: alpha in the current window, beta one window
    /// back with a blocked repo, an empty third window, then gamma (no
    /// repos) and delta in the oldest.
    fn fixture() -> FakeApi {
        FakeApi::new(vec![
            FakeOrg {
                login: "alpha".into(),
                id: 1,
                created: days_ago(3),
                repos: vec![
                    (repo("a", 3, 1, 0, 4), FakeEvents::Count(10)),
                    (repo("b", 0, 1, 2, 0), FakeEvents::Count(0)),
                    (repo("c", 5, 1, 0, 0), FakeEvents::Count(7)),
                ],
            },
            FakeOrg {
                login: "beta".into(),
                id: 2,
                created: days_ago(10),
                repos: vec![
                    (repo("open", 2, 0, 0, 0), FakeEvents::Count(4)),
                    (repo("walled", 9, 0, 0, 0), FakeEvents::Blocked),
                ],
            },
            FakeOrg {
                login: "gamma".into(),
                id: 3,
                created: days_ago(25),
                repos: vec![],
            },
            FakeOrg {
                login: "delta".into(),
                id: 4,
                created: days_ago(25),
                repos: vec![(repo("solo", 1, 1, 1, 1), FakeEvents::Count(2))],
            },
        ])
    }

    fn controller<'a>(
        api: FakeApi,
        store: &'a MemoryStore,
    ) -> CrawlController<FakeApi, &'a MemoryStore> {
        CrawlController::new(
            api,
            store,
            Governor::default(),
            CrawlConfig::default(),
            false,
            Arc::new(AtomicBool::new(false)),
        )
    }

    fn logins(checkpoint: &Checkpoint) -> Vec<String> {
        let mut names: Vec<String> = checkpoint
            .organizations
            .iter()
            .map(|o| o.login.clone())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_full_crawl_enriches_all_windows() {
        let store = MemoryStore::default();
        let outcome = controller(fixture(), &store).run().await.unwrap();

        assert!(!outcome.cancelled);
        assert_eq!(outcome.appended, 3);

        let final_cp = store.current();
        assert_eq!(logins(&final_cp), vec!["alpha", "beta", "delta"]);

        let alpha = final_cp
            .organizations
            .iter()
            .find(|o| o.login == "alpha")
            .unwrap();
        assert_eq!(alpha.stats.total_stars, 8);
        assert_eq!(alpha.stats.total_watchers, 3);
        assert_eq!(alpha.stats.total_forks, 2);
        assert_eq!(alpha.stats.total_open_issues, 4);
        assert_eq!(alpha.stats.total_events, 17);
    }

    #[tokio::test]
    async fn test_zero_repo_org_never_persisted() {
        let store = MemoryStore::default();
        controller(fixture(), &store).run().await.unwrap();

        for save in store.saves() {
            assert!(!save.contains_login("gamma"));
        }
    }

    #[tokio::test]
    async fn test_blocked_events_count_zero_and_enrichment_completes() {
        let store = MemoryStore::default();
        controller(fixture(), &store).run().await.unwrap();

        let final_cp = store.current();
        let beta = final_cp
            .organizations
            .iter()
            .find(|o| o.login == "beta")
            .unwrap();
        // Only the open repository's events count; the walled one adds 0.
        assert_eq!(beta.stats.total_events, 4);
        assert_eq!(beta.stats.total_stars, 11);
    }

    #[tokio::test]
    async fn test_non_blocked_event_error_aborts_run() {
        let mut api = fixture();
        api.orgs[1].repos[0].1 = FakeEvents::Broken;

        let store = MemoryStore::default();
        let result = controller(api, &store).run().await;
        assert!(matches!(
            result.unwrap_err(),
            AppError::Api { status: 500, .. }
        ));

        // alpha's append survived; beta never made it in.
        let final_cp = store.current();
        assert_eq!(logins(&final_cp), vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_window_monotonicity_and_empty_page_advance() {
        let store = MemoryStore::default();
        controller(fixture(), &store).run().await.unwrap();

        let saves = store.saves();
        let mut prev: Option<&Checkpoint> = None;
        for save in &saves {
            if let Some(p) = prev {
                // The searching date never moves forward, and moves
                // backward only by exactly one week with the cursor reset.
                assert!(save.searching_date <= p.searching_date);
                if save.searching_date < p.searching_date {
                    assert_eq!(
                        save.searching_date,
                        time::weeks_back(p.searching_date, 1)
                    );
                    assert_eq!(save.next_page_to_scrape, 1);
                }
            }
            prev = Some(save);
        }

        // The fixture has an empty window between beta and delta, so at
        // least one save must be a pure window advance.
        assert!(
            saves
                .windows(2)
                .any(|w| w[1].searching_date < w[0].searching_date
                    && w[1].organizations.len() == w[0].organizations.len())
        );
    }

    #[tokio::test]
    async fn test_resume_equivalence_after_any_checkpoint() {
        let store = MemoryStore::default();
        controller(fixture(), &store).run().await.unwrap();
        let expected = logins(&store.current());
        let saves = store.saves();

        // Restart from every persisted checkpoint; the final set must not
        // depend on where the interruption happened.
        for (i, save) in saves.iter().enumerate() {
            let resumed = MemoryStore::starting_from(save.clone());
            controller(fixture(), &resumed).run().await.unwrap();
            assert_eq!(
                logins(&resumed.current()),
                expected,
                "divergence resuming from save {i}"
            );
        }
    }

    #[tokio::test]
    async fn test_completed_checkpoint_reruns_without_side_effects() {
        let store = MemoryStore::default();
        controller(fixture(), &store).run().await.unwrap();

        let finished = store.current();
        let rerun_store = MemoryStore::starting_from(finished.clone());
        let outcome = controller(fixture(), &rerun_store).run().await.unwrap();

        assert_eq!(outcome.appended, 0);
        assert_eq!(rerun_store.save_count(), 0);
        assert_eq!(rerun_store.current(), finished);
    }

    #[tokio::test]
    async fn test_cancel_flag_stops_between_checkpoints() {
        let store = MemoryStore::default();
        let cancel = Arc::new(AtomicBool::new(true));
        let ctl = CrawlController::new(
            fixture(),
            &store,
            Governor::default(),
            CrawlConfig::default(),
            false,
            cancel,
        );

        let outcome = ctl.run().await.unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.appended, 0);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_bootstrap_makes_no_remote_calls() {
        let store = MemoryStore::default();
        let api = fixture();
        let calls = api.remote_calls.clone();
        let ctl = CrawlController::new(
            api,
            &store,
            Governor::default(),
            CrawlConfig::default(),
            false,
            Arc::new(AtomicBool::new(true)),
        );

        let outcome = ctl.run().await.unwrap();
        assert!(outcome.cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_large_repository_listing_fully_aggregated() {
        // Well past one page of repositories; every one must contribute.
        let repos = (0..150)
            .map(|i| (repo(&format!("r{i}"), 1, 0, 0, 1), FakeEvents::Count(2)))
            .collect();
        let api = FakeApi::new(vec![FakeOrg {
            login: "omega".into(),
            id: 1,
            created: days_ago(3),
            repos,
        }]);

        let store = MemoryStore::default();
        controller(api, &store).run().await.unwrap();

        let final_cp = store.current();
        let omega = final_cp
            .organizations
            .iter()
            .find(|o| o.login == "omega")
            .unwrap();
        assert_eq!(omega.stats.total_stars, 150);
        assert_eq!(omega.stats.total_open_issues, 150);
        assert_eq!(omega.stats.total_events, 300);
    }

    #[tokio::test]
    async fn test_no_candidates_is_a_clean_noop() {
        let store = MemoryStore::default();
        let outcome = controller(FakeApi::new(vec![]), &store)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.total_candidates, 0);
        assert_eq!(outcome.appended, 0);
        assert_eq!(store.save_count(), 0);
    }
}
