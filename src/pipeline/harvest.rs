// src/pipeline/harvest.rs

//! Resumable harvest loop.
//!
//! ```text
//! FETCH_WINDOW ──empty──────────────────────────┐
//!      │                                        ▼
//!      └──> PROCESS_ITEM (per record) ──> ADVANCE_WINDOW ──> FETCH_WINDOW ...
//! ```
//!
//! The cursor index is persisted before a record is evaluated, so a crash
//! replays the record that was in flight instead of skipping it. Records at
//! positions below the persisted index are skipped without side effects.

use std::time::Duration;

use crate::error::Result;
use crate::models::{CommentOutcome, Config, Cursor, PublishStatus, SubmissionRecord};
use crate::pipeline::window::Window;
use crate::services::{AvailabilityCheck, EligibilityFilter, Publisher, SubmissionSource, Verdict};
use crate::storage::CursorStore;

/// Static inputs of the harvest loop.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Community searched for old submissions
    pub source: String,
    /// Community receiving republished submissions
    pub target: String,
    /// Window length in seconds
    pub window_secs: i64,
    /// Pause after each publish attempt
    pub cooldown: Duration,
}

impl HarvestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source: config.communities.source.clone(),
            target: config.communities.target.clone(),
            window_secs: config.harvest.window_secs,
            cooldown: config.harvest.cooldown(),
        }
    }
}

/// What happened to the records of one window.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowReport {
    pub fetched: usize,
    /// Skipped because an earlier run already reached them
    pub resumed: usize,
    pub rejected: usize,
    pub unavailable: usize,
    pub published: usize,
    /// Posted without the attribution comment
    pub partial: usize,
    pub failed: usize,
    pub cooldowns: usize,
}

impl WindowReport {
    pub fn publish_attempts(&self) -> usize {
        self.published + self.partial + self.failed
    }
}

/// Drives fetch, filter, verify and publish over successive windows.
pub struct Harvester<'a> {
    settings: HarvestSettings,
    store: &'a dyn CursorStore,
    source: &'a dyn SubmissionSource,
    filter: &'a EligibilityFilter,
    checker: &'a dyn AvailabilityCheck,
    publisher: &'a dyn Publisher,
}

impl<'a> Harvester<'a> {
    pub fn new(
        settings: HarvestSettings,
        store: &'a dyn CursorStore,
        source: &'a dyn SubmissionSource,
        filter: &'a EligibilityFilter,
        checker: &'a dyn AvailabilityCheck,
        publisher: &'a dyn Publisher,
    ) -> Self {
        Self {
            settings,
            store,
            source,
            filter,
            checker,
            publisher,
        }
    }

    /// Run until the future is dropped or a storage error occurs.
    ///
    /// Fails immediately if the cursor store was never initialized.
    pub async fn run(&self) -> Result<()> {
        let mut cursor = self.store.load().await?;
        log::info!(
            "Harvesting r/{} into r/{} from {} (item {})",
            self.settings.source,
            self.settings.target,
            self.window_at(cursor.after),
            cursor.index
        );

        loop {
            self.run_window(&mut cursor).await?;
        }
    }

    /// One FETCH_WINDOW → PROCESS_ITEM* → ADVANCE_WINDOW cycle.
    pub async fn run_window(&self, cursor: &mut Cursor) -> Result<WindowReport> {
        let window = self.window_at(cursor.after);
        let batch = self
            .source
            .fetch(&self.settings.source, window.after, window.before)
            .await;

        let report = if batch.is_empty() {
            log::info!("Window {} is empty", window);
            WindowReport::default()
        } else {
            log::info!("Window {}: {} submissions", window, batch.len());
            self.process_batch(cursor, &batch).await?
        };

        self.advance_window(cursor).await?;

        log::info!(
            "Window {} done: {} fetched, {} resumed, {} rejected, {} unavailable, \
             {} published, {} partial, {} failed",
            window,
            report.fetched,
            report.resumed,
            report.rejected,
            report.unavailable,
            report.published,
            report.partial,
            report.failed
        );
        Ok(report)
    }

    /// Evaluate a fetched batch in order, resuming at `cursor.index`.
    pub async fn process_batch(
        &self,
        cursor: &mut Cursor,
        batch: &[SubmissionRecord],
    ) -> Result<WindowReport> {
        let mut report = WindowReport {
            fetched: batch.len(),
            ..WindowReport::default()
        };

        for (position, record) in batch.iter().enumerate() {
            if cursor.already_handled(position) {
                report.resumed += 1;
                continue;
            }

            self.store.set_index(position).await?;
            cursor.index = position;

            self.process_item(record, &mut report).await;
        }

        Ok(report)
    }

    async fn process_item(&self, record: &SubmissionRecord, report: &mut WindowReport) {
        if let Verdict::Rejected(reason) = self.filter.check(record) {
            log::debug!("Rejected {}: {}", record.fullname(), reason);
            report.rejected += 1;
            return;
        }

        let availability = self.checker.check(record).await;
        if !availability.is_available() {
            log::info!("Skipping {}: {}", record.fullname(), availability);
            report.unavailable += 1;
            return;
        }

        let result = self.publisher.publish(record, &self.settings.target).await;
        match result.status() {
            PublishStatus::Published => {
                log::info!(
                    "Republished {} as {}",
                    record.fullname(),
                    result.post_fullname().unwrap_or("?")
                );
                report.published += 1;
            }
            PublishStatus::Partial => {
                let reason = match &result.comment {
                    CommentOutcome::Failed { reason } => reason.as_str(),
                    _ => "unknown",
                };
                log::warn!(
                    "Republished {} as {} WITHOUT attribution ({}); comment needs manual follow-up",
                    record.fullname(),
                    result.post_fullname().unwrap_or("?"),
                    reason
                );
                report.partial += 1;
            }
            PublishStatus::Failed => {
                log::warn!("Failed to republish {}: {:?}", record.fullname(), result.submission);
                report.failed += 1;
            }
        }

        self.cool_down(report).await;
    }

    async fn cool_down(&self, report: &mut WindowReport) {
        let cooldown = self.settings.cooldown;
        if !cooldown.is_zero() {
            log::info!("Cooling down for {}s", cooldown.as_secs());
            tokio::time::sleep(cooldown).await;
        }
        report.cooldowns += 1;
    }

    /// Move the cursor to the next window and persist it.
    ///
    /// The index is reset before `after` moves: a crash in between leaves
    /// `(old after, 0)`, which replays the old window rather than skipping
    /// the head of the new one.
    pub async fn advance_window(&self, cursor: &mut Cursor) -> Result<()> {
        let next = self.window_at(cursor.after).next();

        self.store.set_index(0).await?;
        self.store.set_after(next.after).await?;
        *cursor = Cursor::at_window(next.after);

        log::debug!("Advanced to {}", next);
        Ok(())
    }

    fn window_at(&self, after: i64) -> Window {
        Window::starting_at(after, self.settings.window_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::AppError;
    use crate::models::{FilterConfig, PublishResult, SubmitOutcome};
    use crate::services::availability::{Availability, AvailabilityChecker, SourceRemoval};
    use crate::storage::MemoryCursorStore;
    use crate::utils::http::test_support;

    const JAN_2021: i64 = 1_609_459_200;
    const FEB_2021: i64 = 1_612_137_600;
    const STEP: i64 = 31 * 24 * 60 * 60;
    const COOLDOWN: Duration = Duration::from_secs(2 * 60 * 60);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Fetch(i64, i64),
        SetIndex(usize),
        SetAfter(i64),
        Check(String),
        Publish(String),
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    struct RecordingStore {
        inner: MemoryCursorStore,
        log: Log,
    }

    #[async_trait]
    impl CursorStore for RecordingStore {
        async fn load(&self) -> Result<Cursor> {
            self.inner.load().await
        }
        async fn set_after(&self, after: i64) -> Result<()> {
            self.log.lock().unwrap().push(Event::SetAfter(after));
            self.inner.set_after(after).await
        }
        async fn set_index(&self, index: usize) -> Result<()> {
            self.log.lock().unwrap().push(Event::SetIndex(index));
            self.inner.set_index(index).await
        }
        async fn is_initialized(&self) -> Result<bool> {
            self.inner.is_initialized().await
        }
        fn location(&self) -> String {
            "recording".to_string()
        }
    }

    struct FakeSource {
        batches: HashMap<i64, Vec<SubmissionRecord>>,
        log: Log,
    }

    #[async_trait]
    impl SubmissionSource for FakeSource {
        async fn fetch(&self, _community: &str, after: i64, before: i64) -> Vec<SubmissionRecord> {
            self.log.lock().unwrap().push(Event::Fetch(after, before));
            self.batches.get(&after).cloned().unwrap_or_default()
        }
    }

    struct FakeChecker {
        result: Availability,
        log: Log,
    }

    #[async_trait]
    impl AvailabilityCheck for FakeChecker {
        async fn check(&self, record: &SubmissionRecord) -> Availability {
            self.log.lock().unwrap().push(Event::Check(record.id.clone()));
            self.result.clone()
        }
    }

    struct FakePublisher {
        result: PublishResult,
        log: Log,
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish(&self, record: &SubmissionRecord, target: &str) -> PublishResult {
            assert_eq!(target, "target");
            self.log.lock().unwrap().push(Event::Publish(record.id.clone()));
            self.result.clone()
        }
    }

    fn published() -> PublishResult {
        PublishResult {
            submission: SubmitOutcome::Submitted {
                fullname: "t3_new".to_string(),
            },
            comment: CommentOutcome::Posted { fullname: None },
        }
    }

    fn record(id: &str) -> SubmissionRecord {
        SubmissionRecord {
            url: format!("https://i.imgur.com/{id}.png"),
            title: "Clean title".to_string(),
            score: 50,
            author: "someone".to_string(),
            domain: "i.imgur.com".to_string(),
            is_self: false,
            over_18: false,
            permalink: format!("https://www.reddit.com/r/source/comments/{id}/t/"),
            created_utc: JAN_2021 + 100,
            id: id.to_string(),
        }
    }

    fn untrusted(id: &str) -> SubmissionRecord {
        SubmissionRecord {
            url: format!("https://example.com/{id}"),
            domain: "example.com".to_string(),
            ..record(id)
        }
    }

    fn settings() -> HarvestSettings {
        HarvestSettings {
            source: "source".to_string(),
            target: "target".to_string(),
            window_secs: STEP,
            cooldown: COOLDOWN,
        }
    }

    struct Fixture {
        log: Log,
        store: RecordingStore,
        source: FakeSource,
        filter: EligibilityFilter,
        checker: FakeChecker,
        publisher: FakePublisher,
    }

    impl Fixture {
        fn new(cursor: Cursor, batches: Vec<(i64, Vec<SubmissionRecord>)>) -> Self {
            let log: Log = Arc::default();
            Self {
                store: RecordingStore {
                    inner: MemoryCursorStore::with_cursor(cursor),
                    log: Arc::clone(&log),
                },
                source: FakeSource {
                    batches: batches.into_iter().collect(),
                    log: Arc::clone(&log),
                },
                filter: EligibilityFilter::new(&FilterConfig::default()),
                checker: FakeChecker {
                    result: Availability::Available,
                    log: Arc::clone(&log),
                },
                publisher: FakePublisher {
                    result: published(),
                    log: Arc::clone(&log),
                },
                log,
            }
        }

        fn harvester(&self) -> Harvester<'_> {
            Harvester::new(
                settings(),
                &self.store,
                &self.source,
                &self.filter,
                &self.checker,
                &self.publisher,
            )
        }

        fn events(&self) -> Vec<Event> {
            self.log.lock().unwrap().clone()
        }

        fn published_ids(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Publish(id) => Some(id),
                    _ => None,
                })
                .collect()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn eligible_record_is_published_once_with_one_cooldown() {
        let fixture = Fixture::new(
            Cursor::at_window(JAN_2021),
            vec![(JAN_2021, vec![record("a")])],
        );
        let mut cursor = fixture.store.load().await.unwrap();

        let started = tokio::time::Instant::now();
        let report = fixture.harvester().run_window(&mut cursor).await.unwrap();

        assert_eq!(report.published, 1);
        assert_eq!(report.cooldowns, 1);
        assert!(started.elapsed() >= COOLDOWN);
        assert_eq!(
            fixture.events(),
            vec![
                Event::Fetch(JAN_2021, FEB_2021),
                Event::SetIndex(0),
                Event::Check("a".to_string()),
                Event::Publish("a".to_string()),
                Event::SetIndex(0),
                Event::SetAfter(FEB_2021),
            ]
        );
        assert_eq!(cursor, Cursor::at_window(FEB_2021));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_record_makes_no_network_calls() {
        let fixture = Fixture::new(
            Cursor::at_window(JAN_2021),
            vec![(JAN_2021, vec![untrusted("x")])],
        );
        let mut cursor = fixture.store.load().await.unwrap();

        let started = tokio::time::Instant::now();
        let report = fixture.harvester().run_window(&mut cursor).await.unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.cooldowns, 0);
        assert!(started.elapsed() < COOLDOWN);
        assert!(!fixture
            .events()
            .iter()
            .any(|e| matches!(e, Event::Check(_) | Event::Publish(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_record_is_not_published() {
        let mut fixture = Fixture::new(
            Cursor::at_window(JAN_2021),
            vec![(JAN_2021, vec![record("a")])],
        );
        fixture.checker.result =
            Availability::SourceRemoved(SourceRemoval::Classified("moderator".to_string()));
        let mut cursor = fixture.store.load().await.unwrap();

        let report = fixture.harvester().run_window(&mut cursor).await.unwrap();

        assert_eq!(report.unavailable, 1);
        assert_eq!(report.cooldowns, 0);
        assert!(fixture.published_ids().is_empty());
    }

    #[tokio::test]
    async fn empty_metadata_payload_skips_publish() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/source/comments/a/t.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let mut candidate = record("a");
        candidate.permalink = format!("{}/r/source/comments/a/t/", server.uri());
        let fixture = Fixture::new(Cursor::at_window(JAN_2021), vec![(JAN_2021, vec![candidate])]);
        let checker = AvailabilityChecker::new(
            Arc::new(test_support::quick_client()),
            "Mozilla/5.0 test",
            Vec::new(),
        );
        let harvester = Harvester::new(
            settings(),
            &fixture.store,
            &fixture.source,
            &fixture.filter,
            &checker,
            &fixture.publisher,
        );
        let mut cursor = fixture.store.load().await.unwrap();

        let report = harvester.run_window(&mut cursor).await.unwrap();

        assert_eq!(report.unavailable, 1);
        assert_eq!(report.publish_attempts(), 0);
        assert!(fixture.published_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn resumes_at_persisted_index() {
        let batch: Vec<_> = ["p0", "p1", "p2", "p3", "p4"].iter().map(|id| record(id)).collect();
        let fixture = Fixture::new(Cursor::new(JAN_2021, 3), vec![(JAN_2021, batch.clone())]);
        let mut cursor = fixture.store.load().await.unwrap();

        let report = fixture
            .harvester()
            .process_batch(&mut cursor, &batch)
            .await
            .unwrap();

        assert_eq!(report.resumed, 3);
        assert_eq!(fixture.published_ids(), vec!["p3".to_string(), "p4".to_string()]);
        assert_eq!(fixture.events().first(), Some(&Event::SetIndex(3)));
        assert_eq!(cursor, Cursor::new(JAN_2021, 4));
        assert_eq!(fixture.store.load().await.unwrap(), Cursor::new(JAN_2021, 4));
    }

    #[tokio::test(start_paused = true)]
    async fn index_is_persisted_before_each_evaluation() {
        let batch = vec![untrusted("r0"), record("p1")];
        let fixture = Fixture::new(Cursor::at_window(JAN_2021), vec![]);
        let mut cursor = fixture.store.load().await.unwrap();

        fixture
            .harvester()
            .process_batch(&mut cursor, &batch)
            .await
            .unwrap();

        assert_eq!(
            fixture.events(),
            vec![
                Event::SetIndex(0),
                Event::SetIndex(1),
                Event::Check("p1".to_string()),
                Event::Publish("p1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn advance_window_adds_step_and_resets_index() {
        let fixture = Fixture::new(Cursor::new(JAN_2021, 7), vec![]);
        let mut cursor = fixture.store.load().await.unwrap();

        fixture.harvester().advance_window(&mut cursor).await.unwrap();

        assert_eq!(cursor, Cursor::new(JAN_2021 + STEP, 0));
        assert_eq!(fixture.store.load().await.unwrap(), cursor);
        assert_eq!(
            fixture.events(),
            vec![Event::SetIndex(0), Event::SetAfter(JAN_2021 + STEP)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn every_advance_follows_a_fetch() {
        let fixture = Fixture::new(
            Cursor::at_window(JAN_2021),
            vec![
                (JAN_2021, vec![record("a"), untrusted("b")]),
                (JAN_2021 + 2 * STEP, vec![record("c")]),
            ],
        );
        let harvester = fixture.harvester();
        let mut cursor = fixture.store.load().await.unwrap();

        for _ in 0..4 {
            harvester.run_window(&mut cursor).await.unwrap();
        }

        let events = fixture.events();
        let mut fetched_since_advance = false;
        let mut fetch_starts = Vec::new();
        for event in &events {
            match event {
                Event::Fetch(after, before) => {
                    assert_eq!(before - after, STEP);
                    fetch_starts.push(*after);
                    fetched_since_advance = true;
                }
                Event::SetAfter(_) => {
                    assert!(fetched_since_advance, "advanced twice without a fetch");
                    fetched_since_advance = false;
                }
                _ => {}
            }
        }

        assert_eq!(
            fetch_starts,
            vec![JAN_2021, JAN_2021 + STEP, JAN_2021 + 2 * STEP, JAN_2021 + 3 * STEP]
        );
        assert_eq!(fixture.published_ids(), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(cursor, Cursor::at_window(JAN_2021 + 4 * STEP));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_and_failed_publishes_still_cool_down() {
        let mut fixture = Fixture::new(Cursor::at_window(JAN_2021), vec![]);
        fixture.publisher.result = PublishResult {
            submission: SubmitOutcome::Submitted {
                fullname: "t3_new".to_string(),
            },
            comment: CommentOutcome::Failed {
                reason: "RATELIMIT".to_string(),
            },
        };
        let mut cursor = fixture.store.load().await.unwrap();

        let report = fixture
            .harvester()
            .process_batch(&mut cursor, &[record("a")])
            .await
            .unwrap();
        assert_eq!(report.partial, 1);
        assert_eq!(report.cooldowns, 1);

        fixture.publisher.result = PublishResult::submit_failed("HTTP 500");
        let mut cursor = Cursor::at_window(JAN_2021);
        let report = fixture
            .harvester()
            .process_batch(&mut cursor, &[record("b")])
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.cooldowns, 1);
    }

    #[tokio::test]
    async fn run_refuses_uninitialized_store() {
        let fixture = Fixture::new(Cursor::at_window(JAN_2021), vec![]);
        let empty = MemoryCursorStore::new();
        let harvester = Harvester::new(
            settings(),
            &empty,
            &fixture.source,
            &fixture.filter,
            &fixture.checker,
            &fixture.publisher,
        );

        let err = harvester.run().await.unwrap_err();
        assert!(matches!(err, AppError::StoreNotInitialized { .. }));
        assert!(fixture.events().is_empty());
    }
}
