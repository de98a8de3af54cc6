//! Integration tests for the search coordinator.
//!
//! These exercise resolution, fan-out, deadlines, aggregation and caching
//! end to end with in-process mock sources (no network calls). Live source
//! tests are marked `#[ignore]` for manual/periodic validation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bookfinder_search::adapters::{SessionBackend, SubscriptionAdapter};
use bookfinder_search::{
    AdapterCapabilities, BookRecord, Candidate, CandidateCatalog, QueryTerm, SearchConfig,
    SearchCoordinator, SearchError, SearchQuery, SearchRequest, SearchResponse, SourceAdapter,
    SourceDescriptor, SourceKind, SourceRegistry,
};

/// Returns a fixed record set and remembers every term it was asked for.
struct MockSource {
    caps: AdapterCapabilities,
    records: Vec<BookRecord>,
    delay: Duration,
    calls: AtomicUsize,
    terms: Mutex<Vec<QueryTerm>>,
}

impl MockSource {
    fn new(caps: AdapterCapabilities, titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            caps,
            records: titles.iter().map(|t| BookRecord::titled(*t)).collect(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            terms: Mutex::new(Vec::new()),
        })
    }

    fn slow(caps: AdapterCapabilities, titles: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            caps,
            records: titles.iter().map(|t| BookRecord::titled(*t)).collect(),
            delay,
            calls: AtomicUsize::new(0),
            terms: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn terms(&self) -> Vec<QueryTerm> {
        self.terms.lock().expect("terms lock").clone()
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn capabilities(&self) -> AdapterCapabilities {
        self.caps
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        _max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.terms.lock().expect("terms lock").push(term.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.records.clone())
    }
}

/// Never completes.
struct StalledSource;

#[async_trait]
impl SourceAdapter for StalledSource {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::BOTH
    }

    async fn lookup(&self, _: &QueryTerm, _: usize) -> Result<Vec<BookRecord>, SearchError> {
        std::future::pending().await
    }
}

struct PanickingSource;

#[async_trait]
impl SourceAdapter for PanickingSource {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::BOTH
    }

    async fn lookup(&self, _: &QueryTerm, _: usize) -> Result<Vec<BookRecord>, SearchError> {
        panic!("source blew up")
    }
}

/// A subscription backend whose every session is rejected by the service.
struct RejectingBackend {
    logins: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionBackend for RejectingBackend {
    type Session = usize;

    async fn login(&self) -> Result<usize, SearchError> {
        Ok(self.logins.fetch_add(1, Ordering::SeqCst))
    }

    async fn search(&self, _: &usize, _: &str, _: usize) -> Result<Vec<BookRecord>, SearchError> {
        Err(SearchError::SessionExpired("bounced to login".into()))
    }
}

struct MockCatalog(Vec<Candidate>);

#[async_trait]
impl CandidateCatalog for MockCatalog {
    async fn candidates(&self, _: &str, limit: usize) -> Result<Vec<Candidate>, SearchError> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }
}

fn candidate(isbn: &str, title: &str, main: &str) -> Candidate {
    Candidate {
        isbn: isbn.into(),
        title: title.into(),
        main_title: Some(main.into()),
        author: Some("로버트 C. 마틴".into()),
        publisher: None,
        pub_date: None,
        cover: None,
        link: None,
    }
}

fn clean_code_catalog() -> Arc<MockCatalog> {
    Arc::new(MockCatalog(vec![
        candidate("9788966260959", "Clean Code - 애자일 소프트웨어 장인 정신", "Clean Code"),
        candidate("9788966261161", "클린 코드 - 개정판", "클린 코드"),
        candidate("9791190665216", "클린 아키텍처", "클린 아키텍처"),
    ]))
}

fn descriptor(name: &str, priority: i32) -> SourceDescriptor {
    SourceDescriptor::new(name, priority, SourceKind::Api)
}

fn coordinator(registry: SourceRegistry) -> SearchCoordinator {
    SearchCoordinator::new(Arc::new(registry), SearchConfig::default())
}

fn results(response: SearchResponse) -> bookfinder_search::AggregatedResult {
    match response {
        SearchResponse::Results(result) => result,
        SearchResponse::Candidates(list) => {
            panic!("expected results, got {} candidates", list.total_count)
        }
    }
}

fn names(result: &bookfinder_search::AggregatedResult) -> Vec<&str> {
    result.sources.iter().map(|o| o.source_name()).collect()
}

// ── Scenario A: identifier query, priority order ─────────────────────────

#[tokio::test]
async fn identifier_query_fans_out_by_identifier_in_priority_order() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["Clean Code"]);
    let library = MockSource::new(AdapterCapabilities::IDENTIFIER_ONLY, &["Central Library"]);
    let shelf = MockSource::new(AdapterCapabilities::BOTH, &["clean-code.pdf"]);

    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 3), store.clone())
        .and_then(|r| r.with_source(descriptor("library", 2), library.clone()))
        .and_then(|r| r.with_source(descriptor("shelf", 1), shelf.clone()))
        .expect("registry");

    let result = results(
        coordinator(registry)
            .handle(SearchRequest::new("9788966261161"))
            .await
            .expect("handle"),
    );

    assert_eq!(result.isbn.as_deref(), Some("9788966261161"));
    assert_eq!(names(&result), ["shelf", "library", "store"]);
    assert_eq!(result.total_sources, 3);
    assert_eq!(result.searched_sources, 3);
    for source in [&store, &library, &shelf] {
        assert_eq!(source.terms(), vec![QueryTerm::Identifier("9788966261161".into())]);
    }
}

// ── Scenario B: ambiguous title, selection, fan-out ──────────────────────

#[tokio::test]
async fn ambiguous_title_presents_candidates_then_searches_selection() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["클린 코드"]);
    let storefront = MockSource::new(AdapterCapabilities::TITLE_ONLY, &["클린 코드 (eBook)"]);

    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store.clone())
        .and_then(|r| r.with_source(descriptor("storefront", 2), storefront.clone()))
        .expect("registry")
        .with_catalog(clean_code_catalog());
    let coordinator = coordinator(registry);

    let response = coordinator
        .handle(SearchRequest::new("클린코드"))
        .await
        .expect("handle");
    let SearchResponse::Candidates(list) = response else {
        panic!("expected candidates");
    };
    assert_eq!(list.total_count, 3);
    assert_eq!(store.calls(), 0, "no fan-out before a selection");

    let picked = &list.books[1];
    let result = results(
        coordinator
            .handle(SearchRequest::new("클린코드").with_selection(&picked.isbn, &picked.title))
            .await
            .expect("handle"),
    );

    assert_eq!(result.isbn.as_deref(), Some("9788966261161"));
    assert_eq!(result.selected_title.as_deref(), Some("클린 코드 - 개정판"));
    assert_eq!(store.terms(), vec![QueryTerm::Identifier("9788966261161".into())]);
    assert_eq!(storefront.terms(), vec![QueryTerm::Title("클린 코드".into())]);
}

#[tokio::test]
async fn explicit_selection_sends_main_title_to_title_only_sources() {
    let storefront = MockSource::new(AdapterCapabilities::TITLE_ONLY, &["Clean Code (eBook)"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("storefront", 1), storefront.clone())
        .expect("registry");
    let coordinator = coordinator(registry);

    let request = SearchRequest::new("클린코드")
        .with_selection("9788966260959", "Clean Code - 애자일 소프트웨어 장인 정신");
    let result = results(coordinator.handle(request).await.expect("handle"));

    assert_eq!(
        result.selected_title.as_deref(),
        Some("Clean Code - 애자일 소프트웨어 장인 정신")
    );
    assert_eq!(storefront.terms(), vec![QueryTerm::Title("Clean Code".into())]);
}

#[tokio::test]
async fn explicit_main_title_overrides_derived_one() {
    let storefront = MockSource::new(AdapterCapabilities::TITLE_ONLY, &["클린 코드"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("storefront", 1), storefront.clone())
        .expect("registry");

    let request = SearchRequest::new("클린코드")
        .with_selection("9788966260959", "Clean Code - 애자일 소프트웨어 장인 정신")
        .with_main_title("클린 코드");
    coordinator(registry).handle(request).await.expect("handle");

    assert_eq!(storefront.terms(), vec![QueryTerm::Title("클린 코드".into())]);
}

#[tokio::test]
async fn resolution_state_machine_drives_selection_by_index() {
    let storefront = MockSource::new(AdapterCapabilities::TITLE_ONLY, &["Clean Code"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("storefront", 1), storefront.clone())
        .expect("registry")
        .with_catalog(clean_code_catalog());
    let coordinator = coordinator(registry);

    let mut resolution = coordinator.resolve("클린코드").await;
    assert_eq!(resolution.candidates().len(), 3);
    resolution.select_index(0).expect("select");
    let query = resolution.into_resolved().expect("resolved");

    let result = coordinator.search(&query).await.expect("search");
    assert_eq!(result.isbn.as_deref(), Some("9788966260959"));
    // Title-only sources get the main title, without the subtitle.
    assert_eq!(storefront.terms(), vec![QueryTerm::Title("Clean Code".into())]);
}

#[tokio::test]
async fn zero_candidates_fails_without_fan_out() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["x"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store.clone())
        .expect("registry")
        .with_catalog(Arc::new(MockCatalog(Vec::new())));

    let err = coordinator(registry)
        .handle(SearchRequest::new("없는 책"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::NotFound(_)));
    assert_eq!(store.calls(), 0);
}

// ── Scenario C: authentication failure is isolated ───────────────────────

#[tokio::test]
async fn authentication_failure_is_isolated_to_its_source() {
    let logins = Arc::new(AtomicUsize::new(0));
    let backend = RejectingBackend {
        logins: Arc::clone(&logins),
    };
    let subscription = Arc::new(SubscriptionAdapter::new(backend, 1));
    let store = MockSource::new(AdapterCapabilities::BOTH, &["Clean Code"]);
    let library = MockSource::new(AdapterCapabilities::IDENTIFIER_ONLY, &["Central Library"]);

    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store)
        .and_then(|r| {
            r.with_source(
                SourceDescriptor::new("subscription", 2, SourceKind::AuthenticatedScrape),
                subscription,
            )
        })
        .and_then(|r| r.with_source(descriptor("library", 3), library))
        .expect("registry");

    let result = results(
        coordinator(registry)
            .handle(SearchRequest::new("9788966261161"))
            .await
            .expect("handle"),
    );

    assert_eq!(result.searched_sources, 3);
    let failed = result.source("subscription").expect("subscription outcome");
    assert!(!failed.is_success());
    assert!(failed.results().is_empty());
    assert!(failed
        .error_message()
        .is_some_and(|m| m.starts_with("authentication failed")));
    // One initial login plus the single permitted re-authentication.
    assert_eq!(logins.load(Ordering::SeqCst), 2);

    for name in ["store", "library"] {
        let ok = result.source(name).expect("outcome");
        assert!(ok.is_success());
        assert!(!ok.results().is_empty());
    }
}

/// Hangs on the first search it is given, then answers normally.
struct HangOnceBackend {
    logins: Arc<AtomicUsize>,
    searches: AtomicUsize,
}

#[async_trait]
impl SessionBackend for HangOnceBackend {
    type Session = usize;

    async fn login(&self) -> Result<usize, SearchError> {
        Ok(self.logins.fetch_add(1, Ordering::SeqCst))
    }

    async fn search(
        &self,
        _: &usize,
        keyword: &str,
        _: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        if self.searches.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(vec![BookRecord::titled(keyword)])
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_source_releases_its_session() {
    let logins = Arc::new(AtomicUsize::new(0));
    let subscription = Arc::new(SubscriptionAdapter::new(
        HangOnceBackend {
            logins: Arc::clone(&logins),
            searches: AtomicUsize::new(0),
        },
        1,
    ));
    let registry = SourceRegistry::new()
        .with_source(
            SourceDescriptor::new("subscription", 1, SourceKind::AuthenticatedScrape)
                .with_timeout(Duration::from_millis(300)),
            subscription.clone(),
        )
        .expect("registry");
    let coordinator = coordinator(registry);

    let first = coordinator
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");
    assert!(first.source("subscription").expect("outcome").is_timeout());
    assert_eq!(subscription.pool().available(), 1, "lease returned after abort");

    let second = coordinator
        .search(&SearchQuery::parse("9791190665216"))
        .await
        .expect("search");
    let outcome = second.source("subscription").expect("outcome");
    assert!(outcome.is_success());
    assert_eq!(outcome.result_count(), 1);
    assert_eq!(logins.load(Ordering::SeqCst), 1, "idle session reused");
}

// ── Scenario D: cache hit ────────────────────────────────────────────────

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["Clean Code"]);
    let shelf = MockSource::new(AdapterCapabilities::BOTH, &["clean-code.pdf"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store.clone())
        .and_then(|r| r.with_source(descriptor("shelf", 2), shelf.clone()))
        .expect("registry");
    let coordinator = coordinator(registry);

    let request = SearchRequest::new("9788966261161");
    let first = results(coordinator.handle(request.clone()).await.expect("first"));
    let second = results(coordinator.handle(request).await.expect("second"));

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("json"),
        serde_json::to_string(&second).expect("json")
    );
    assert_eq!(store.calls(), 1);
    assert_eq!(shelf.calls(), 1);
}

#[tokio::test]
async fn concurrent_identical_queries_share_one_fan_out() {
    let delay = Duration::from_millis(50);
    let store = MockSource::slow(AdapterCapabilities::BOTH, &["Clean Code"], delay);
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store.clone())
        .expect("registry");
    let coordinator = Arc::new(coordinator(registry));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            coordinator.handle(SearchRequest::new("9788966261161")).await
        }));
    }
    for handle in handles {
        let result = results(handle.await.expect("join").expect("handle"));
        assert_eq!(result.searched_sources, 1);
    }
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn disabled_cache_fans_out_every_time() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["Clean Code"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store.clone())
        .expect("registry");
    let config = SearchConfig {
        cache_ttl_seconds: 0,
        ..Default::default()
    };
    let coordinator = SearchCoordinator::new(Arc::new(registry), config);

    let query = SearchQuery::parse("9788966261161");
    coordinator.search(&query).await.expect("first");
    coordinator.search(&query).await.expect("second");
    assert_eq!(store.calls(), 2);
}

// ── Deadlines and failure isolation ──────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stalled_source_times_out_within_bound() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["Clean Code"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store)
        .and_then(|r| {
            r.with_source(
                descriptor("stalled", 2).with_timeout(Duration::from_millis(300)),
                Arc::new(StalledSource),
            )
        })
        .expect("registry");
    let coordinator = coordinator(registry).with_global_timeout(Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    let result = coordinator
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    let stalled = result.source("stalled").expect("stalled outcome");
    assert!(stalled.is_timeout());
    assert!(stalled.results().is_empty());
    assert!(result.source("store").expect("store").is_success());
}

#[tokio::test(start_paused = true)]
async fn global_timeout_caps_per_source_override() {
    let registry = SourceRegistry::new()
        .with_source(
            descriptor("stalled", 1).with_timeout(Duration::from_secs(30)),
            Arc::new(StalledSource),
        )
        .expect("registry");
    let coordinator = coordinator(registry).with_global_timeout(Duration::from_millis(500));

    let started = tokio::time::Instant::now();
    let result = coordinator
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(result.sources[0].is_timeout());
}

#[tokio::test(start_paused = true)]
async fn sources_run_concurrently() {
    let delay = Duration::from_millis(400);
    let mut registry = SourceRegistry::new();
    for i in 0..4 {
        registry
            .register(
                descriptor(&format!("slow-{i}"), i),
                MockSource::slow(AdapterCapabilities::BOTH, &["x"], delay),
            )
            .expect("register");
    }
    let coordinator = coordinator(registry);

    let started = tokio::time::Instant::now();
    let result = coordinator
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");

    assert_eq!(result.succeeded_count(), 4);
    assert!(started.elapsed() < delay * 2, "sources ran sequentially");
}

#[tokio::test]
async fn panicking_source_becomes_failed_outcome() {
    let store = MockSource::new(AdapterCapabilities::BOTH, &["Clean Code"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), store)
        .and_then(|r| r.with_source(descriptor("broken", 2), Arc::new(PanickingSource)))
        .expect("registry");

    let result = coordinator(registry)
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");

    let broken = result.source("broken").expect("broken outcome");
    assert!(!broken.is_success());
    assert_eq!(broken.error_message(), Some("adapter panicked"));
    assert!(result.source("store").expect("store").is_success());
}

// ── Aggregation invariants ───────────────────────────────────────────────

#[tokio::test]
async fn disabled_sources_are_counted_but_never_invoked() {
    let enabled = MockSource::new(AdapterCapabilities::BOTH, &["a"]);
    let disabled = MockSource::new(AdapterCapabilities::BOTH, &["b"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("enabled", 1), enabled.clone())
        .and_then(|r| {
            r.with_source(descriptor("disabled", 0).with_enabled(false), disabled.clone())
        })
        .expect("registry");

    let result = coordinator(registry)
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");

    assert_eq!(result.total_sources, 2);
    assert_eq!(result.searched_sources, 1);
    assert!(result.searched_sources <= result.total_sources);
    assert!(result.source("disabled").is_none());
    assert_eq!(disabled.calls(), 0);
    assert_eq!(enabled.calls(), 1);
}

#[tokio::test]
async fn single_source_search_reaches_disabled_source() {
    let enabled = MockSource::new(AdapterCapabilities::BOTH, &["a"]);
    let disabled = MockSource::new(AdapterCapabilities::TITLE_ONLY, &["파이썬 입문"]);
    let registry = SourceRegistry::new()
        .with_source(descriptor("enabled", 1), enabled.clone())
        .and_then(|r| r.with_source(descriptor("ssafy", 2).with_enabled(false), disabled.clone()))
        .expect("registry");

    let outcome = coordinator(registry)
        .search_source("ssafy", &SearchQuery::parse("파이썬"), 3)
        .await
        .expect("search");

    assert!(outcome.is_success());
    assert_eq!(outcome.result_count(), 1);
    assert_eq!(disabled.terms(), vec![QueryTerm::Title("파이썬".into())]);
    assert_eq!(enabled.calls(), 0);
}

#[tokio::test]
async fn equal_priorities_keep_registration_order() {
    let mut registry = SourceRegistry::new();
    for name in ["delta", "alpha", "charlie", "bravo"] {
        registry
            .register(
                descriptor(name, 5),
                MockSource::slow(AdapterCapabilities::BOTH, &[name], Duration::from_millis(5)),
            )
            .expect("register");
    }
    registry
        .register(descriptor("first", 1), MockSource::new(AdapterCapabilities::BOTH, &["x"]))
        .expect("register");

    let result = coordinator(registry)
        .search(&SearchQuery::parse("9788966261161"))
        .await
        .expect("search");
    assert_eq!(names(&result), ["first", "delta", "alpha", "charlie", "bravo"]);
}

#[tokio::test]
async fn failed_outcomes_never_carry_results() {
    let registry = SourceRegistry::new()
        .with_source(
            descriptor("library", 1),
            MockSource::new(AdapterCapabilities::IDENTIFIER_ONLY, &["x"]),
        )
        .and_then(|r| r.with_source(descriptor("broken", 2), Arc::new(PanickingSource)))
        .expect("registry");
    let coordinator = coordinator(registry);

    // A resolved query whose identifier is not an ISBN still routes by identifier.
    let query = SearchQuery::parse("clean code").resolved_with("K012345", "Clean Code");
    let result = coordinator.search(&query).await.expect("search");
    for outcome in &result.sources {
        if !outcome.is_success() {
            assert!(outcome.results().is_empty());
            assert_eq!(outcome.result_count(), 0);
        }
    }
}

#[tokio::test]
async fn results_are_capped_per_source() {
    let many: Vec<String> = (0..20).map(|i| format!("book {i}")).collect();
    let titles: Vec<&str> = many.iter().map(String::as_str).collect();
    let registry = SourceRegistry::new()
        .with_source(descriptor("store", 1), MockSource::new(AdapterCapabilities::BOTH, &titles))
        .expect("registry");

    let result = results(
        coordinator(registry)
            .handle(SearchRequest::new("9788966261161").with_max_results(3))
            .await
            .expect("handle"),
    );
    assert_eq!(result.sources[0].result_count(), 3);
}

// ── Live sources ─────────────────────────────────────────────────────────

#[tokio::test]
#[ignore] // Requires network access and ALADIN_TTB_KEY.
async fn live_bookstore_candidates() {
    let Ok(key) = std::env::var("ALADIN_TTB_KEY") else {
        return;
    };
    let client = bookfinder_search::http::build_client(&SearchConfig::default()).expect("client");
    let store = bookfinder_search::adapters::BookstoreAdapter::new(
        client,
        key,
        "http://www.aladin.co.kr/ttb/api",
    );
    let candidates = store.candidates("클린 코드", 5).await.expect("candidates");
    assert!(!candidates.is_empty());
}

#[tokio::test]
#[ignore] // Requires network access.
async fn live_storefront_search() {
    let client = bookfinder_search::http::build_client(&SearchConfig::default()).expect("client");
    let storefront = bookfinder_search::adapters::StorefrontAdapter::new(
        client,
        "https://search-api.ridibooks.com",
        "https://ridibooks.com",
        "ridi-select",
    );
    let records = storefront
        .lookup(&QueryTerm::Title("클린 코드".into()), 5)
        .await
        .expect("lookup");
    assert!(records.len() <= 5);
}
