use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{AnalysisItem, MediaType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricAverage {
    pub key: String,
    pub mean: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct StatsOptions {
    pub recent_count: usize,
    pub top_issues_count: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            recent_count: 5,
            top_issues_count: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub avg_score_pct: u32,
    pub image_share_pct: u32,
    pub video_share_pct: u32,
    pub top_issues: Vec<IssueCount>,
    pub metric_averages: Vec<MetricAverage>,
    pub recent: Vec<AnalysisItem>,
}

/// Recomputed from scratch on every call.
pub fn compute_stats(history: &[AnalysisItem], options: &StatsOptions) -> DashboardStats {
    DashboardStats {
        total: history.len(),
        avg_score_pct: average_score_pct(history),
        image_share_pct: type_share_pct(history, MediaType::Image),
        video_share_pct: type_share_pct(history, MediaType::Video),
        top_issues: top_issues(history, options.top_issues_count),
        metric_averages: metric_averages(history),
        recent: history.iter().take(options.recent_count).cloned().collect(),
    }
}

/// Entries without a score (errored analyses) count as zero.
pub fn average_score_pct(history: &[AnalysisItem]) -> u32 {
    if history.is_empty() {
        return 0;
    }
    let sum: f64 = history.iter().map(|item| item.score().unwrap_or(0.0)).sum();
    (100.0 * sum / history.len() as f64).round() as u32
}

pub fn type_share_pct(history: &[AnalysisItem], media_type: MediaType) -> u32 {
    if history.is_empty() {
        return 0;
    }
    let matching = history
        .iter()
        .filter(|item| item.media_type() == media_type)
        .count();
    (100.0 * matching as f64 / history.len() as f64).round() as u32
}

/// Occurrences per issue label, in first-seen order.
pub fn issue_frequency(history: &[AnalysisItem]) -> Vec<IssueCount> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();

    for issue in history.iter().filter_map(|item| item.issues()).flatten() {
        *counts.entry(issue.label.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(label, count)| IssueCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

/// Most frequent first; ties keep first-seen order.
pub fn top_issues(history: &[AnalysisItem], limit: usize) -> Vec<IssueCount> {
    let mut counts = issue_frequency(history);
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Mean per metric key over the entries that reported that key. Entries
/// without the key are left out rather than counted as zero.
pub fn metric_averages(history: &[AnalysisItem]) -> Vec<MetricAverage> {
    let mut sums: IndexMap<&str, (f64, usize)> = IndexMap::new();

    for metrics in history.iter().filter_map(|item| item.metrics()) {
        for (key, value) in metrics {
            let entry = sums.entry(key.as_str()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(key, (sum, samples))| MetricAverage {
            key: key.to_string(),
            mean: sum / samples as f64,
            samples,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineFailure;
    use crate::models::{AnalysisResult, Issue, IssueKind, Metrics};

    fn done(media_type: MediaType, score: f64, metrics: &[(&str, f64)], issues: &[IssueKind]) -> AnalysisItem {
        let metrics: Metrics = metrics
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        AnalysisItem::pending("item", media_type)
            .settle(Ok(AnalysisResult {
                score,
                metrics,
                issues: issues.iter().map(|k| Issue::from_kind(*k, 0.7)).collect(),
            }))
            .unwrap()
    }

    fn failed(media_type: MediaType) -> AnalysisItem {
        AnalysisItem::pending("item", media_type)
            .settle(Err(EngineFailure::new("offline")))
            .unwrap()
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let stats = compute_stats(&[], &StatsOptions::default());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_score_pct, 0);
        assert_eq!(stats.image_share_pct, 0);
        assert_eq!(stats.video_share_pct, 0);
        assert!(stats.top_issues.is_empty());
        assert!(stats.metric_averages.is_empty());
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn missing_scores_count_as_zero() {
        let history = vec![done(MediaType::Image, 0.8, &[], &[]), failed(MediaType::Image)];
        assert_eq!(average_score_pct(&history), 40);
    }

    #[test]
    fn metric_averages_keep_reported_order() {
        let history = vec![done(
            MediaType::Image,
            0.5,
            &[("authenticity", 0.1), ("lighting", 0.2), ("texture", 0.3)],
            &[],
        )];
        let keys: Vec<_> = metric_averages(&history).into_iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["authenticity", "lighting", "texture"]);
    }

    #[test]
    fn missing_metrics_are_excluded_from_means() {
        let history = vec![
            done(MediaType::Image, 0.5, &[("texture", 0.2), ("lighting", 0.9)], &[]),
            failed(MediaType::Video),
            done(MediaType::Image, 0.5, &[("texture", 0.6)], &[]),
        ];
        let averages = metric_averages(&history);
        let texture = averages.iter().find(|m| m.key == "texture").unwrap();
        let lighting = averages.iter().find(|m| m.key == "lighting").unwrap();
        assert!((texture.mean - 0.4).abs() < 1e-12);
        assert_eq!(texture.samples, 2);
        assert!((lighting.mean - 0.9).abs() < 1e-12);
        assert_eq!(lighting.samples, 1);
    }

    #[test]
    fn type_share_rounds() {
        let history = vec![
            failed(MediaType::Image),
            failed(MediaType::Image),
            failed(MediaType::Video),
        ];
        assert_eq!(type_share_pct(&history, MediaType::Image), 67);
        assert_eq!(type_share_pct(&history, MediaType::Video), 33);
    }

    #[test]
    fn top_issues_sorted_with_stable_ties() {
        let history = vec![
            done(MediaType::Image, 0.1, &[], &[IssueKind::CompressionArtifacts]),
            done(MediaType::Image, 0.1, &[], &[IssueKind::TextureInconsistency]),
            done(
                MediaType::Image,
                0.1,
                &[],
                &[IssueKind::BiologicalAnomaly, IssueKind::TextureInconsistency],
            ),
        ];
        let top = top_issues(&history, 5);
        let labels: Vec<_> = top.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Texture Inconsistency",
                "Compression Artifacts",
                "Biological Motion Anomaly",
            ]
        );
        assert_eq!(top[0].count, 2);
        assert_eq!(top_issues(&history, 1).len(), 1);
    }

    #[test]
    fn recent_takes_head_of_history() {
        let history: Vec<_> = (0..8).map(|_| failed(MediaType::Image)).collect();
        let stats = compute_stats(&history, &StatsOptions::default());
        assert_eq!(stats.total, 8);
        assert_eq!(stats.recent.len(), 5);
        assert_eq!(stats.recent[0].id(), history[0].id());
    }
}
