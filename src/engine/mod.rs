pub mod mock;
pub mod scoring;

use std::future::Future;

use crate::error::EngineFailure;
use crate::models::{AnalysisResult, MediaType};

pub use mock::{LatencyWindow, MockEngine};
pub use scoring::{evaluate, MetricDraws, ScoringWeights};

/// What an engine hands back once it settles. Failures are a value, not a
/// panic or a dropped future.
pub type EngineOutcome = Result<AnalysisResult, EngineFailure>;

/// Pluggable analysis backend. Implementations must settle exactly once.
pub trait AnalysisEngine: Send + Sync + 'static {
    fn analyse(&self, media_type: MediaType) -> impl Future<Output = EngineOutcome> + Send;
}
