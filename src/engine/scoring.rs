use rand::Rng;

use crate::models::{AnalysisResult, Issue, IssueKind, Metrics};

pub const METRIC_AUTHENTICITY: &str = "authenticity";
pub const METRIC_LIGHTING: &str = "lighting";
pub const METRIC_TEXTURE: &str = "texture";
pub const METRIC_BIOLOGICAL: &str = "biological";
pub const METRIC_COMPRESSION: &str = "compression";

const TEXTURE_THRESHOLD: f64 = 0.45;
const TEXTURE_BASE_SEVERITY: f64 = 0.6;
const BIOLOGICAL_THRESHOLD: f64 = 0.5;
const BIOLOGICAL_BASE_SEVERITY: f64 = 0.5;
const COMPRESSION_THRESHOLD: f64 = 0.4;
const COMPRESSION_BASE_SEVERITY: f64 = 0.4;

/// Trust score weights; they sum to 1.0 so the score stays in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub authenticity: f64,
    pub lighting: f64,
    pub texture: f64,
    pub biological: f64,
    pub compression: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            authenticity: 0.30,
            lighting: 0.10,
            texture: 0.20,
            biological: 0.25,
            compression: 0.15,
        }
    }
}

/// The five raw uniform draws behind one analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDraws {
    pub authenticity: f64,
    pub lighting: f64,
    pub texture: f64,
    pub biological: f64,
    pub compression: f64,
}

impl MetricDraws {
    /// Draw order is fixed so a seeded source replays identically.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            authenticity: rng.gen::<f64>(),
            lighting: rng.gen::<f64>(),
            texture: rng.gen::<f64>(),
            biological: rng.gen::<f64>(),
            compression: rng.gen::<f64>(),
        }
    }
}

/// Weighted trust score over the five draws.
pub fn compute_score(draws: &MetricDraws, weights: &ScoringWeights) -> f64 {
    weights.authenticity * draws.authenticity
        + weights.lighting * draws.lighting
        + weights.texture * draws.texture
        + weights.biological * draws.biological
        + weights.compression * draws.compression
}

/// Issues gated independently on their own draw, in catalogue order.
pub fn detect_issues(draws: &MetricDraws) -> Vec<Issue> {
    let mut issues = Vec::new();

    if draws.texture < TEXTURE_THRESHOLD {
        issues.push(Issue::from_kind(
            IssueKind::TextureInconsistency,
            TEXTURE_BASE_SEVERITY + (TEXTURE_THRESHOLD - draws.texture),
        ));
    }
    if draws.biological < BIOLOGICAL_THRESHOLD {
        issues.push(Issue::from_kind(
            IssueKind::BiologicalAnomaly,
            BIOLOGICAL_BASE_SEVERITY + (BIOLOGICAL_THRESHOLD - draws.biological),
        ));
    }
    if draws.compression < COMPRESSION_THRESHOLD {
        issues.push(Issue::from_kind(
            IssueKind::CompressionArtifacts,
            COMPRESSION_BASE_SEVERITY + (COMPRESSION_THRESHOLD - draws.compression),
        ));
    }

    issues
}

pub fn evaluate(draws: &MetricDraws, weights: &ScoringWeights) -> AnalysisResult {
    let mut metrics = Metrics::new();
    metrics.insert(METRIC_AUTHENTICITY.to_string(), draws.authenticity);
    metrics.insert(METRIC_LIGHTING.to_string(), draws.lighting);
    metrics.insert(METRIC_TEXTURE.to_string(), draws.texture);
    metrics.insert(METRIC_BIOLOGICAL.to_string(), draws.biological);
    metrics.insert(METRIC_COMPRESSION.to_string(), draws.compression);

    AnalysisResult {
        score: compute_score(draws, weights),
        metrics,
        issues: detect_issues(draws),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn draws(texture: f64, biological: f64, compression: f64) -> MetricDraws {
        MetricDraws {
            authenticity: 0.5,
            lighting: 0.5,
            texture,
            biological,
            compression,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let w = ScoringWeights::default();
        let sum = w.authenticity + w.lighting + w.texture + w.biological + w.compression;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn score_is_weighted_sum() {
        let d = MetricDraws {
            authenticity: 0.9,
            lighting: 0.1,
            texture: 0.6,
            biological: 0.7,
            compression: 0.2,
        };
        let expected = 0.30 * 0.9 + 0.10 * 0.1 + 0.20 * 0.6 + 0.25 * 0.7 + 0.15 * 0.2;
        let result = evaluate(&d, &ScoringWeights::default());
        assert!((result.score - expected).abs() < 1e-12);
        assert_eq!(result.metrics.len(), 5);
        assert_eq!(result.metrics[METRIC_COMPRESSION], 0.2);
    }

    #[test]
    fn no_issues_when_all_draws_clear_thresholds() {
        assert!(detect_issues(&draws(0.45, 0.5, 0.4)).is_empty());
    }

    #[test]
    fn all_issues_in_catalogue_order() {
        let issues = detect_issues(&draws(0.0, 0.0, 0.0));
        let kinds: Vec<_> = issues.iter().map(|i| i.id).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::TextureInconsistency,
                IssueKind::BiologicalAnomaly,
                IssueKind::CompressionArtifacts,
            ]
        );
        // Severity is allowed past 1.0.
        assert!((issues[0].severity - 1.05).abs() < 1e-12);
        assert!((issues[1].severity - 1.0).abs() < 1e-12);
        assert!((issues[2].severity - 0.8).abs() < 1e-12);
    }

    #[test]
    fn issue_gates_are_independent() {
        let issues = detect_issues(&draws(0.9, 0.3, 0.9));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, IssueKind::BiologicalAnomaly);
        assert!((issues[0].severity - 0.7).abs() < 1e-12);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let a = MetricDraws::sample(&mut StdRng::seed_from_u64(7));
        let b = MetricDraws::sample(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        for v in [a.authenticity, a.lighting, a.texture, a.biological, a.compression] {
            assert!((0.0..1.0).contains(&v));
        }
    }
}
