//! Shared fixtures for the integration suites: an in-memory harness wiring
//! every service to a `MemoryStore` and a `ManualClock`, plus recording
//! fakes for the notification and result-lookup boundaries.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tourney_server::automation::AutomationScheduler;
use tourney_server::clock::ManualClock;
use tourney_server::db::models::{Tournament, TournamentFormat};
use tourney_server::error::Result;
use tourney_server::lifecycle::TournamentService;
use tourney_server::lookup::{DetectedResult, ResultSource};
use tourney_server::notify::{NotificationEvent, Notifier};
use tourney_server::results::{DeadlineProcessor, ResultService};
use tourney_server::store::{MemoryStore, TournamentStore};

/// Captures every published event for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Count of events whose serialized `event` tag matches.
    pub fn count(&self, tag: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| {
                serde_json::to_value(e)
                    .ok()
                    .and_then(|v| v.get("event").and_then(|t| t.as_str().map(String::from)))
                    .as_deref()
                    == Some(tag)
            })
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: NotificationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A result source answering from a scripted (white, black) -> result map.
#[derive(Default)]
pub struct ScriptedResultSource {
    results: Mutex<HashMap<(String, String), DetectedResult>>,
}

impl ScriptedResultSource {
    pub fn script(&self, white: &str, black: &str, detected: DetectedResult) {
        self.results
            .lock()
            .unwrap()
            .insert((white.to_string(), black.to_string()), detected);
    }
}

#[async_trait]
impl ResultSource for ScriptedResultSource {
    async fn find_recent_result(
        &self,
        white_id: &str,
        black_id: &str,
        _since: DateTime<Utc>,
    ) -> Result<Option<DetectedResult>> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(&(white_id.to_string(), black_id.to_string()))
            .cloned())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub source: Arc<ScriptedResultSource>,
    pub tournaments: TournamentService,
    pub results: Arc<ResultService>,
    pub deadlines: Arc<DeadlineProcessor>,
    pub scheduler: Arc<AutomationScheduler>,
}

pub fn setup() -> Harness {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start));
    let notifier = Arc::new(RecordingNotifier::default());
    let source = Arc::new(ScriptedResultSource::default());

    let store_dyn: Arc<dyn TournamentStore> = store.clone();
    let results = Arc::new(ResultService::new(
        store_dyn.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    let deadlines = Arc::new(DeadlineProcessor::new(
        store_dyn.clone(),
        notifier.clone(),
        clock.clone(),
        results.clone(),
    ));
    let scheduler = Arc::new(AutomationScheduler::new(
        store_dyn.clone(),
        notifier.clone(),
        clock.clone(),
        results.clone(),
        deadlines.clone(),
        source.clone(),
        300,
    ));
    let tournaments = TournamentService::new(store_dyn, clock.clone());

    Harness {
        store,
        clock,
        notifier,
        source,
        tournaments,
        results,
        deadlines,
        scheduler,
    }
}

impl Harness {
    /// Create a tournament, register `players` as (id, rating), and start it.
    pub async fn started_tournament(
        &self,
        format: TournamentFormat,
        total_rounds: i64,
        players: &[(&str, i64)],
    ) -> Tournament {
        let tournament = self
            .tournaments
            .create_tournament("Test Open", format, total_rounds, None, None)
            .await
            .unwrap();
        for (id, rating) in players {
            self.tournaments
                .register_player(&tournament.id, id, *rating)
                .await
                .unwrap();
        }
        self.tournaments
            .start_tournament(&tournament.id)
            .await
            .unwrap()
    }
}
