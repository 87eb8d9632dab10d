// Favorites aggregation.
// Tracks one fetch per favorite URL per session and reports when every fetch has settled.

use std::collections::HashMap;

use crate::error::{ButlerError, Result};
use crate::jenkins::{Build, Job};
use crate::store::{Account, Favorite, FavoriteKind};

/// A resolved entity paired with the account it was fetched with.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// URL of the favorite this entry came from.
    pub url: String,
    pub entity: T,
    pub account: Account,
}

/// A fetch the caller must issue on behalf of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub session: u64,
    /// Identifies this fetch among every fetch of the session's URL.
    pub ticket: u64,
    pub favorite: Favorite,
    pub account: Account,
}

/// Result of a single fetch.
#[derive(Debug)]
pub enum Outcome {
    Job(Result<Job>),
    Build(Result<Build>),
}

/// Message posted back to the owner thread when a fetch finishes.
#[derive(Debug)]
pub struct Completion {
    pub session: u64,
    pub ticket: u64,
    pub favorite: Favorite,
    pub account: Account,
    pub outcome: Outcome,
}

impl Completion {
    pub fn job(request: FetchRequest, result: Result<Job>) -> Self {
        Self {
            session: request.session,
            ticket: request.ticket,
            favorite: request.favorite,
            account: request.account,
            outcome: Outcome::Job(result),
        }
    }

    pub fn build(request: FetchRequest, result: Result<Build>) -> Self {
        Self {
            session: request.session,
            ticket: request.ticket,
            favorite: request.favorite,
            account: request.account,
            outcome: Outcome::Build(result),
        }
    }

    /// The fetch error, if the fetch failed.
    pub fn error(&self) -> Option<&ButlerError> {
        match &self.outcome {
            Outcome::Job(Err(e)) | Outcome::Build(Err(e)) => Some(e),
            _ => None,
        }
    }
}

/// Notification for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A result list grew or shrank; re-render.
    ListsChanged,
    /// Every requested favorite has resolved or failed; stop the loading indicator.
    Settled,
}

/// Work produced by starting or extending a session.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub requests: Vec<FetchRequest>,
    pub signals: Vec<Signal>,
}

/// State of one aggregation pass.
#[derive(Debug, Default)]
struct Session {
    id: u64,
    /// Requested URL to the ticket of its latest fetch.
    requested: HashMap<String, u64>,
    jobs: Vec<Resolved<Job>>,
    builds: Vec<Resolved<Build>>,
    failed: Vec<Favorite>,
    settled: bool,
}

impl Session {
    fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn settled_count(&self) -> usize {
        self.jobs.len() + self.builds.len() + self.failed.len()
    }
}

/// Drives the per-favorite fetches of the current session.
///
/// All mutation happens on the owner thread. Fetches run elsewhere and come
/// back as [`Completion`] messages passed to [`Aggregator::apply`].
#[derive(Debug, Default)]
pub struct Aggregator {
    session: Session,
    last_session_id: u64,
    last_ticket: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current session and start a new one over `favorites`.
    pub fn begin(&mut self, favorites: &[Favorite], accounts: &[Account]) -> Dispatch {
        self.last_session_id += 1;
        self.session = Session::new(self.last_session_id);
        tracing::info!(
            session = self.session.id,
            favorites = favorites.len(),
            "starting favorites session"
        );
        self.issue(favorites, accounts)
    }

    /// Request any favorites not yet requested in the current session.
    pub fn extend(&mut self, favorites: &[Favorite], accounts: &[Account]) -> Dispatch {
        self.issue(favorites, accounts)
    }

    fn issue(&mut self, favorites: &[Favorite], accounts: &[Account]) -> Dispatch {
        let mut dispatch = Dispatch::default();
        let mut newly_failed = false;

        let jobs = favorites.iter().filter(|f| f.kind == FavoriteKind::Job);
        let builds = favorites.iter().filter(|f| f.kind == FavoriteKind::Build);

        for favorite in jobs.chain(builds) {
            // Mark before issuing so a second pass never re-requests the URL
            if self.session.requested.contains_key(&favorite.url) {
                continue;
            }
            self.last_ticket += 1;
            let ticket = self.last_ticket;
            self.session.requested.insert(favorite.url.clone(), ticket);

            match accounts.iter().find(|a| a.name == favorite.account) {
                Some(account) => dispatch.requests.push(FetchRequest {
                    session: self.session.id,
                    ticket,
                    favorite: favorite.clone(),
                    account: account.clone(),
                }),
                None => {
                    tracing::warn!(
                        url = %favorite.url,
                        account = %favorite.account,
                        "favorite refers to an unknown account"
                    );
                    self.session.failed.push(favorite.clone());
                    newly_failed = true;
                }
            }
        }

        if !dispatch.requests.is_empty() || newly_failed {
            // New work reopens a settled session
            self.session.settled = false;
        }
        dispatch.signals.extend(self.check_settlement());
        dispatch
    }

    /// Whether `completion` answers the latest fetch of a favorite in the current session.
    pub fn accepts(&self, completion: &Completion) -> bool {
        completion.session == self.session.id
            && self.session.requested.get(&completion.favorite.url) == Some(&completion.ticket)
    }

    /// Fold a fetch completion into the session.
    pub fn apply(&mut self, completion: Completion) -> Vec<Signal> {
        let mut signals = Vec::new();

        if completion.session != self.session.id {
            tracing::debug!(
                session = completion.session,
                current = self.session.id,
                url = %completion.favorite.url,
                "discarding completion from a superseded session"
            );
            return signals;
        }
        if !self.accepts(&completion) {
            tracing::debug!(
                url = %completion.favorite.url,
                ticket = completion.ticket,
                "discarding completion for a forgotten or re-requested favorite"
            );
            return signals;
        }

        let Completion {
            favorite,
            account,
            outcome,
            ..
        } = completion;

        match outcome {
            Outcome::Job(Ok(job)) => {
                self.session.jobs.push(Resolved {
                    url: favorite.url,
                    entity: job,
                    account,
                });
                signals.push(Signal::ListsChanged);
            }
            Outcome::Build(Ok(build)) => {
                self.session.builds.push(Resolved {
                    url: favorite.url,
                    entity: build,
                    account,
                });
                signals.push(Signal::ListsChanged);
            }
            Outcome::Job(Err(e)) | Outcome::Build(Err(e)) => {
                tracing::warn!(url = %favorite.url, error = %e, "favorite fetch failed");
                self.session.failed.push(favorite);
            }
        }

        signals.extend(self.check_settlement());
        signals
    }

    /// Drop a favorite from the current session, whether resolved, failed or in flight.
    pub fn forget(&mut self, url: &str) -> Vec<Signal> {
        let mut signals = Vec::new();
        if self.session.requested.remove(url).is_none() {
            return signals;
        }

        let before = self.session.jobs.len() + self.session.builds.len();
        self.session.jobs.retain(|r| r.url != url);
        self.session.builds.retain(|r| r.url != url);
        self.session.failed.retain(|f| f.url != url);
        if self.session.jobs.len() + self.session.builds.len() != before {
            signals.push(Signal::ListsChanged);
        }

        signals.extend(self.check_settlement());
        signals
    }

    /// Emit `Settled` the first time every requested favorite has an outcome.
    pub fn check_settlement(&mut self) -> Option<Signal> {
        if self.session.settled || self.session.settled_count() < self.target() {
            return None;
        }
        self.session.settled = true;
        tracing::info!(
            session = self.session.id,
            jobs = self.session.jobs.len(),
            builds = self.session.builds.len(),
            failed = self.session.failed.len(),
            "favorites session settled"
        );
        Some(Signal::Settled)
    }

    pub fn session_id(&self) -> u64 {
        self.session.id
    }

    pub fn jobs(&self) -> &[Resolved<Job>] {
        &self.session.jobs
    }

    pub fn builds(&self) -> &[Resolved<Build>] {
        &self.session.builds
    }

    pub fn failed(&self) -> &[Favorite] {
        &self.session.failed
    }

    pub fn is_settled(&self) -> bool {
        self.session.settled
    }

    /// URLs requested in the current session, in no particular order.
    pub fn requested(&self) -> impl Iterator<Item = &str> {
        self.session.requested.keys().map(String::as_str)
    }

    /// Number of distinct favorites the session is waiting on.
    pub fn target(&self) -> usize {
        self.session.requested.len()
    }

    /// Number of favorites that have an outcome.
    pub fn settled_count(&self) -> usize {
        self.session.settled_count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const JOB_A: &str = "https://ci.example.com/job/a/";
    const JOB_C: &str = "https://ci.example.com/job/c/";
    const BUILD_B: &str = "https://ci.example.com/job/b/4/";

    fn account() -> Account {
        Account {
            name: "work".to_string(),
            base_url: "https://ci.example.com".to_string(),
            username: None,
            api_token: None,
        }
    }

    fn job(name: &str, url: &str) -> Job {
        serde_json::from_value(serde_json::json!({ "name": name, "url": url })).unwrap()
    }

    fn build(number: u64, url: &str) -> Build {
        serde_json::from_value(serde_json::json!({ "number": number, "url": url })).unwrap()
    }

    fn find(dispatch: &Dispatch, url: &str) -> FetchRequest {
        dispatch
            .requests
            .iter()
            .find(|r| r.favorite.url == url)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_empty_settles_immediately() {
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&[], &[account()]);

        assert!(dispatch.requests.is_empty());
        assert_eq!(dispatch.signals, vec![Signal::Settled]);
        assert!(agg.is_settled());
        assert!(agg.jobs().is_empty());
        assert!(agg.builds().is_empty());
    }

    #[test]
    fn test_job_and_build_resolve_in_any_order() {
        let favorites = [Favorite::build(BUILD_B, "work"), Favorite::job(JOB_A, "work")];

        for build_first in [false, true] {
            let mut agg = Aggregator::new();
            let dispatch = agg.begin(&favorites, &[account()]);
            assert_eq!(dispatch.requests.len(), 2);
            // Jobs are issued before builds
            assert_eq!(dispatch.requests[0].favorite.url, JOB_A);
            assert!(dispatch.signals.is_empty());

            let job_done = Completion::job(find(&dispatch, JOB_A), Ok(job("a", JOB_A)));
            let build_done = Completion::build(find(&dispatch, BUILD_B), Ok(build(4, BUILD_B)));
            let (first, second) = if build_first {
                (build_done, job_done)
            } else {
                (job_done, build_done)
            };

            assert_eq!(agg.apply(first), vec![Signal::ListsChanged]);
            assert!(!agg.is_settled());
            assert_eq!(
                agg.apply(second),
                vec![Signal::ListsChanged, Signal::Settled]
            );

            assert_eq!(agg.jobs().len(), 1);
            assert_eq!(agg.jobs()[0].entity.name, "a");
            assert_eq!(agg.jobs()[0].account, account());
            assert_eq!(agg.builds().len(), 1);
            assert_eq!(agg.builds()[0].entity.number, 4);
            assert!(agg.failed().is_empty());
        }
    }

    #[test]
    fn test_failed_job_is_recorded() {
        let favorites = [Favorite::job(JOB_A, "work")];
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&favorites, &[account()]);

        let signals = agg.apply(Completion::job(
            find(&dispatch, JOB_A),
            Err(ButlerError::NotFound(JOB_A.to_string())),
        ));

        assert_eq!(signals, vec![Signal::Settled]);
        assert!(agg.jobs().is_empty());
        assert_eq!(agg.failed(), &favorites);
    }

    #[test]
    fn test_duplicate_urls_requested_once() {
        let favorites = [
            Favorite::job(JOB_A, "work"),
            Favorite::job(JOB_A, "work"),
            Favorite::build(JOB_A, "work"),
        ];
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&favorites, &[account()]);

        assert_eq!(dispatch.requests.len(), 1);
        assert_eq!(agg.target(), 1);

        agg.apply(Completion::job(dispatch.requests[0].clone(), Ok(job("a", JOB_A))));
        assert!(agg.is_settled());
        assert_eq!(agg.settled_count(), agg.target());
    }

    #[test]
    fn test_extend_skips_requested_urls() {
        let mut agg = Aggregator::new();
        let first = agg.begin(&[Favorite::job(JOB_A, "work")], &[account()]);
        assert_eq!(first.requests.len(), 1);

        // Same favorites again before anything settles: nothing new to issue
        let again = agg.extend(&[Favorite::job(JOB_A, "work")], &[account()]);
        assert!(again.requests.is_empty());

        let more = agg.extend(
            &[Favorite::job(JOB_A, "work"), Favorite::job(JOB_C, "work")],
            &[account()],
        );
        assert_eq!(more.requests.len(), 1);
        assert_eq!(more.requests[0].favorite.url, JOB_C);
        assert_eq!(agg.target(), 2);
    }

    #[test]
    fn test_extend_reopens_settled_session() {
        let mut agg = Aggregator::new();
        let first = agg.begin(&[Favorite::job(JOB_A, "work")], &[account()]);
        agg.apply(Completion::job(first.requests[0].clone(), Ok(job("a", JOB_A))));
        assert!(agg.is_settled());

        let more = agg.extend(
            &[Favorite::job(JOB_A, "work"), Favorite::job(JOB_C, "work")],
            &[account()],
        );
        assert!(!agg.is_settled());

        let signals = agg.apply(Completion::job(more.requests[0].clone(), Ok(job("c", JOB_C))));
        assert!(signals.contains(&Signal::Settled));
        assert_eq!(agg.jobs().len(), 2);
    }

    #[test]
    fn test_refresh_resets_lists() {
        let favorites = [Favorite::job(JOB_A, "work"), Favorite::build(BUILD_B, "work")];
        let mut agg = Aggregator::new();
        let first = agg.begin(&favorites, &[account()]);
        agg.apply(Completion::job(find(&first, JOB_A), Ok(job("a", JOB_A))));
        agg.apply(Completion::build(
            find(&first, BUILD_B),
            Err(ButlerError::Other("boom".to_string())),
        ));
        assert!(agg.is_settled());

        let second = agg.begin(&favorites, &[account()]);
        assert_eq!(second.requests.len(), 2);
        assert!(agg.jobs().is_empty());
        assert!(agg.builds().is_empty());
        assert!(agg.failed().is_empty());
        assert!(!agg.is_settled());
        assert!(second.requests.iter().all(|r| r.session == agg.session_id()));
    }

    #[test]
    fn test_stale_completion_discarded() {
        let favorites = [Favorite::job(JOB_A, "work")];
        let mut agg = Aggregator::new();
        let first = agg.begin(&favorites, &[account()]);
        let second = agg.begin(&favorites, &[account()]);

        let stale = agg.apply(Completion::job(first.requests[0].clone(), Ok(job("old", JOB_A))));
        assert!(stale.is_empty());
        assert!(agg.jobs().is_empty());
        assert!(!agg.is_settled());

        agg.apply(Completion::job(second.requests[0].clone(), Ok(job("new", JOB_A))));
        assert_eq!(agg.jobs().len(), 1);
        assert_eq!(agg.jobs()[0].entity.name, "new");
        assert!(agg.is_settled());
    }

    #[test]
    fn test_settled_fires_once() {
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&[Favorite::job(JOB_A, "work")], &[account()]);
        let signals = agg.apply(Completion::job(dispatch.requests[0].clone(), Ok(job("a", JOB_A))));
        assert!(signals.contains(&Signal::Settled));

        assert_eq!(agg.check_settlement(), None);
        assert_eq!(agg.check_settlement(), None);
        assert!(agg.is_settled());
    }

    #[test]
    fn test_unknown_account_fails_immediately() {
        let favorites = [Favorite::job(JOB_A, "home"), Favorite::job(JOB_C, "work")];
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&favorites, &[account()]);

        assert_eq!(dispatch.requests.len(), 1);
        assert_eq!(agg.failed().len(), 1);
        assert_eq!(agg.failed()[0].url, JOB_A);
        assert!(!agg.is_settled());

        agg.apply(Completion::job(dispatch.requests[0].clone(), Ok(job("c", JOB_C))));
        assert!(agg.is_settled());
    }

    #[test]
    fn test_forget_in_flight_favorite() {
        let favorites = [Favorite::job(JOB_A, "work"), Favorite::job(JOB_C, "work")];
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&favorites, &[account()]);
        agg.apply(Completion::job(find(&dispatch, JOB_C), Ok(job("c", JOB_C))));

        // Forgetting the last outstanding favorite settles the session
        assert_eq!(agg.forget(JOB_A), vec![Signal::Settled]);
        assert_eq!(agg.target(), 1);

        // Its late completion is ignored
        let late = agg.apply(Completion::job(find(&dispatch, JOB_A), Ok(job("a", JOB_A))));
        assert!(late.is_empty());
        assert_eq!(agg.jobs().len(), 1);
    }

    #[test]
    fn test_forget_then_extend_ignores_old_completion() {
        let favorites = [Favorite::job(JOB_A, "work"), Favorite::job(JOB_C, "work")];
        let mut agg = Aggregator::new();
        let first = agg.begin(&favorites, &[account()]);
        agg.apply(Completion::job(find(&first, JOB_C), Ok(job("c", JOB_C))));

        agg.forget(JOB_A);
        let again = agg.extend(&favorites, &[account()]);
        assert_eq!(again.requests.len(), 1);
        assert_ne!(again.requests[0].ticket, find(&first, JOB_A).ticket);
        assert!(!agg.is_settled());

        // The fetch issued before the favorite was forgotten lands late
        let old = agg.apply(Completion::job(find(&first, JOB_A), Ok(job("old", JOB_A))));
        assert!(old.is_empty());
        assert!(!agg.is_settled());
        assert_eq!(agg.jobs().len(), 1);

        let new = agg.apply(Completion::job(again.requests[0].clone(), Ok(job("a", JOB_A))));
        assert_eq!(new, vec![Signal::ListsChanged, Signal::Settled]);
        assert_eq!(agg.jobs().len(), 2);
        assert_eq!(agg.settled_count(), agg.target());
        assert!(agg.jobs().iter().all(|r| r.entity.name != "old"));
    }

    #[test]
    fn test_requested_covers_in_flight() {
        let favorites = [Favorite::job(JOB_A, "work"), Favorite::build(BUILD_B, "work")];
        let mut agg = Aggregator::new();
        agg.begin(&favorites, &[account()]);

        let mut requested: Vec<&str> = agg.requested().collect();
        requested.sort();
        assert_eq!(requested, vec![JOB_A, BUILD_B]);

        agg.forget(JOB_A);
        assert_eq!(agg.requested().collect::<Vec<_>>(), vec![BUILD_B]);
    }

    #[test]
    fn test_forget_resolved_favorite() {
        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&[Favorite::build(BUILD_B, "work")], &[account()]);
        agg.apply(Completion::build(dispatch.requests[0].clone(), Ok(build(4, BUILD_B))));

        assert_eq!(agg.forget(BUILD_B), vec![Signal::ListsChanged]);
        assert!(agg.builds().is_empty());
        assert!(agg.forget(BUILD_B).is_empty());
    }

    #[test]
    fn test_settled_sum_matches_distinct_favorites() {
        let favorites: Vec<Favorite> = (0..6)
            .map(|i| {
                let url = format!("https://ci.example.com/job/j{}/", i % 4);
                if i % 2 == 0 {
                    Favorite::job(url, "work")
                } else {
                    Favorite::build(url, "work")
                }
            })
            .collect();
        let distinct: HashSet<&str> = favorites.iter().map(|f| f.url.as_str()).collect();

        let mut agg = Aggregator::new();
        let dispatch = agg.begin(&favorites, &[account()]);
        for (i, request) in dispatch.requests.into_iter().enumerate() {
            let url = request.favorite.url.clone();
            let completion = match (request.favorite.kind, i % 3 == 0) {
                (_, true) => Completion::job(request, Err(ButlerError::Other("x".into()))),
                (FavoriteKind::Job, false) => Completion::job(request, Ok(job("j", &url))),
                (FavoriteKind::Build, false) => Completion::build(request, Ok(build(1, &url))),
            };
            agg.apply(completion);
        }

        assert!(agg.is_settled());
        assert_eq!(
            agg.jobs().len() + agg.builds().len() + agg.failed().len(),
            distinct.len()
        );
    }
}
