use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::MediaType;

use super::scoring::{evaluate, MetricDraws, ScoringWeights};
use super::{AnalysisEngine, EngineOutcome};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Half-open latency window `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self {
            min_ms: 800,
            max_ms: 2400,
        }
    }
}

impl LatencyWindow {
    pub fn instant() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..self.max_ms))
    }
}

/// Simulated analysis backend. Scores are random; nothing is inspected.
///
/// The random source is injectable so tests can replay exact draws.
pub struct MockEngine<R = StdRng> {
    rng: Mutex<R>,
    latency: LatencyWindow,
    weights: ScoringWeights,
}

impl MockEngine<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for MockEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + Send> MockEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
            latency: LatencyWindow::default(),
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_latency(mut self, latency: LatencyWindow) -> Self {
        self.latency = latency;
        self
    }

    /// Latency is drawn before the metrics so both come from one stream.
    fn draw(&self) -> (Duration, MetricDraws) {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let delay = self.latency.sample(&mut *rng);
        let draws = MetricDraws::sample(&mut *rng);
        (delay, draws)
    }
}

impl<R: Rng + Send + 'static> AnalysisEngine for MockEngine<R> {
    async fn analyse(&self, media_type: MediaType) -> EngineOutcome {
        let (delay, draws) = self.draw();
        log_debug!(
            "mock engine analysing {} with {}ms latency",
            media_type.as_str(),
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        Ok(evaluate(&draws, &self.weights))
    }
}
