//! Analysis records and their lifecycle.
//!
//! An `AnalysisItem` is never patched in place: every transition produces a
//! fresh snapshot, and the status variant decides which result fields exist.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineFailure, LifecycleError};

use super::media::MediaType;

/// Named sub-scores reported by an engine, each in `[0, 1]`, kept in the
/// order the engine reported them.
pub type Metrics = IndexMap<String, f64>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    TextureInconsistency,
    BiologicalAnomaly,
    CompressionArtifacts,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::TextureInconsistency => "texture_inconsistency",
            IssueKind::BiologicalAnomaly => "biological_anomaly",
            IssueKind::CompressionArtifacts => "compression_artifacts",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::TextureInconsistency => "Texture Inconsistency",
            IssueKind::BiologicalAnomaly => "Biological Motion Anomaly",
            IssueKind::CompressionArtifacts => "Compression Artifacts",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IssueKind::TextureInconsistency => {
                "Surface texture variance deviates from natural frequency spectrum."
            }
            IssueKind::BiologicalAnomaly => "Micro-expression timing / blink rate irregular.",
            IssueKind::CompressionArtifacts => {
                "Blocky / oversmoothed regions reduce authenticity confidence."
            }
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            IssueKind::TextureInconsistency => {
                "Increase resolution source or capture under uniform lighting."
            }
            IssueKind::BiologicalAnomaly => {
                "Capture longer segment for motion stabilization analysis."
            }
            IssueKind::CompressionArtifacts => {
                "Use less aggressive compression or source original file."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueKind,
    pub label: String,
    /// Not clamped: generation may push this past 1.0.
    pub severity: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn from_kind(kind: IssueKind, severity: f64) -> Self {
        Self {
            id: kind,
            label: kind.label().to_string(),
            severity: severity.max(0.0),
            description: kind.description().to_string(),
            suggestion: Some(kind.suggestion().to_string()),
        }
    }

    /// Severity as a bar width, clamped to 100.
    pub fn display_severity_pct(&self) -> u32 {
        score_pct(self.severity).min(100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: f64,
    pub metrics: Metrics,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AnalysisStatus {
    Pending,
    /// Anonymous placeholder waiting for login; never reaches an engine.
    Processing,
    Done(AnalysisResult),
    Error { message: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStatusKind {
    Pending,
    Processing,
    Done,
    Error,
}

impl AnalysisStatus {
    pub fn kind(&self) -> AnalysisStatusKind {
        match self {
            AnalysisStatus::Pending => AnalysisStatusKind::Pending,
            AnalysisStatus::Processing => AnalysisStatusKind::Processing,
            AnalysisStatus::Done(_) => AnalysisStatusKind::Done,
            AnalysisStatus::Error { .. } => AnalysisStatusKind::Error,
        }
    }
}

impl AnalysisStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatusKind::Pending => "pending",
            AnalysisStatusKind::Processing => "processing",
            AnalysisStatusKind::Done => "done",
            AnalysisStatusKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisItem {
    id: String,
    name: String,
    #[serde(rename = "type")]
    media_type: MediaType,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    status: AnalysisStatus,
}

impl AnalysisItem {
    fn create(name: impl Into<String>, media_type: MediaType, status: AnalysisStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            media_type,
            created_at: Utc::now(),
            status,
        }
    }

    pub fn pending(name: impl Into<String>, media_type: MediaType) -> Self {
        Self::create(name, media_type, AnalysisStatus::Pending)
    }

    pub fn placeholder(name: impl Into<String>, media_type: MediaType) -> Self {
        Self::create(name, media_type, AnalysisStatus::Processing)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status_kind(&self) -> AnalysisStatusKind {
        self.status.kind()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.status {
            AnalysisStatus::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.result().map(|r| r.score)
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.result().map(|r| &r.metrics)
    }

    pub fn issues(&self) -> Option<&[Issue]> {
        self.result().map(|r| r.issues.as_slice())
    }

    /// Turn an anonymous placeholder into a real pending submission, keeping
    /// its identity.
    pub fn promote(&self) -> Result<AnalysisItem, LifecycleError> {
        self.transition(AnalysisStatus::Pending)
    }

    /// Snapshot carrying the engine outcome.
    pub fn settle(
        &self,
        outcome: Result<AnalysisResult, EngineFailure>,
    ) -> Result<AnalysisItem, LifecycleError> {
        let next = match outcome {
            Ok(result) => AnalysisStatus::Done(result),
            Err(failure) => AnalysisStatus::Error {
                message: failure.message,
            },
        };
        self.transition(next)
    }

    fn transition(&self, to: AnalysisStatus) -> Result<AnalysisItem, LifecycleError> {
        let from = self.status_kind();
        if !valid_transition(from, to.kind()) {
            return Err(LifecycleError::InvalidTransition { from, to: to.kind() });
        }
        Ok(AnalysisItem {
            status: to,
            ..self.clone()
        })
    }
}

pub fn valid_transition(from: AnalysisStatusKind, to: AnalysisStatusKind) -> bool {
    use AnalysisStatusKind::*;
    matches!(
        (from, to),
        (Processing, Pending) | (Pending, Done) | (Pending, Error)
    )
}

/// Score in `[0, 1]` as a rounded percentage.
pub fn score_pct(score: f64) -> u32 {
    (score.max(0.0) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        let mut metrics = Metrics::new();
        metrics.insert("texture".to_string(), 0.2);
        AnalysisResult {
            score: 0.42,
            metrics,
            issues: vec![Issue::from_kind(IssueKind::TextureInconsistency, 0.85)],
        }
    }

    #[test]
    fn lifecycle_blocks_invalid_edges() {
        use AnalysisStatusKind::*;
        assert!(valid_transition(Pending, Done));
        assert!(valid_transition(Pending, Error));
        assert!(valid_transition(Processing, Pending));
        assert!(!valid_transition(Processing, Done));
        assert!(!valid_transition(Done, Error));
        assert!(!valid_transition(Error, Pending));
        assert!(!valid_transition(Done, Done));
    }

    #[test]
    fn settle_produces_new_snapshot() {
        let item = AnalysisItem::pending("a.jpg", MediaType::Image);
        let done = item.settle(Ok(sample_result())).unwrap();

        assert_eq!(item.status_kind(), AnalysisStatusKind::Pending);
        assert!(item.score().is_none());
        assert_eq!(done.id(), item.id());
        assert_eq!(done.created_at(), item.created_at());
        assert_eq!(done.score(), Some(0.42));
        assert_eq!(done.issues().map(|i| i.len()), Some(1));
    }

    #[test]
    fn settled_items_are_frozen() {
        let item = AnalysisItem::pending("a.jpg", MediaType::Image);
        let failed = item.settle(Err(EngineFailure::new("boom"))).unwrap();
        assert_eq!(failed.status_kind(), AnalysisStatusKind::Error);
        assert!(failed.metrics().is_none());
        assert!(failed.settle(Ok(sample_result())).is_err());
    }

    #[test]
    fn placeholder_must_be_promoted_before_settling() {
        let placeholder = AnalysisItem::placeholder("a.jpg", MediaType::Image);
        assert!(placeholder.settle(Ok(sample_result())).is_err());

        let promoted = placeholder.promote().unwrap();
        assert_eq!(promoted.id(), placeholder.id());
        assert_eq!(promoted.status_kind(), AnalysisStatusKind::Pending);
    }

    #[test]
    fn serializes_status_tag_and_type() {
        let item = AnalysisItem::pending("clip.mp4", MediaType::Video)
            .settle(Ok(sample_result()))
            .unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["type"], "video");
        assert_eq!(json["issues"][0]["id"], "texture_inconsistency");
        assert!(json.get("createdAt").is_some());

        let back: AnalysisItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn display_severity_is_clamped() {
        let issue = Issue::from_kind(IssueKind::TextureInconsistency, 1.05);
        assert_eq!(issue.severity, 1.05);
        assert_eq!(issue.display_severity_pct(), 100);
        assert_eq!(score_pct(0.456), 46);
    }
}
