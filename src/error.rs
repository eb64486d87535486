use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::AnalysisStatusKind;

/// Input could not be turned into an analysable media reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("enter a URL")]
    EmptyUrl,

    #[error("needs a direct image/video URL: {0}")]
    UnrecognizedMedia(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("daily limit reached ({referral_credits} referral credits earned so far)")]
pub struct QuotaExceededError {
    pub referral_credits: u32,
}

/// Every way a submission can be refused before any state is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    QuotaExceeded(#[from] QuotaExceededError),
}

/// Modeled failure payload of an analysis engine. Engines report this as a
/// value; it is never raised across the task boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("analysis engine failed: {message}")]
pub struct EngineFailure {
    pub message: String,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid analysis status transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: AnalysisStatusKind,
        to: AnalysisStatusKind,
    },
}
