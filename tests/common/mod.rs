#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use veridai_lib::engine::EngineOutcome;
use veridai_lib::models::{AnalysisResult, Issue, IssueKind, Metrics};
use veridai_lib::{AnalysisEngine, EngineFailure, MediaType, SessionConfig, SessionEvent};

/// Engine that returns a fixed outcome and counts calls. Call `n` settles
/// after `delay + stagger * n`.
pub struct ScriptedEngine {
    outcome: EngineOutcome,
    delay: Duration,
    stagger: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn succeeding(score: f64) -> Self {
        Self::with_outcome(Ok(result_with_score(score)))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Err(EngineFailure::new(message)))
    }

    pub fn with_outcome(outcome: EngineOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::from_millis(1000),
            stagger: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl AnalysisEngine for ScriptedEngine {
    fn analyse(&self, _media_type: MediaType) -> impl Future<Output = EngineOutcome> + Send {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as u32;
        let outcome = self.outcome.clone();
        let delay = self.delay + self.stagger * call;
        async move {
            tokio::time::sleep(delay).await;
            outcome
        }
    }
}

pub fn result_with_score(score: f64) -> AnalysisResult {
    let mut metrics = Metrics::new();
    metrics.insert("texture".to_string(), 0.3);
    AnalysisResult {
        score,
        metrics,
        issues: vec![Issue::from_kind(IssueKind::TextureInconsistency, 0.75)],
    }
}

pub fn config_with_quota(daily_free: u32) -> SessionConfig {
    SessionConfig {
        daily_free,
        ..SessionConfig::default()
    }
}

/// Drain events until one with `name` arrives.
pub async fn wait_for_event(
    rx: &mut broadcast::Receiver<SessionEvent>,
    name: &str,
) -> SessionEvent {
    loop {
        match rx.recv().await {
            Ok(event) if event.name() == name => return event,
            Ok(_) => continue,
            Err(err) => panic!("event stream ended before {name}: {err}"),
        }
    }
}
