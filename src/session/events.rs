use serde::Serialize;

use crate::models::AnalysisItem;

use super::quota::QuotaSnapshot;

/// Notifications pushed to presentation collaborators.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    #[serde(rename_all = "camelCase")]
    AuthPromptRequested { item_id: Option<String> },
    CurrentItemChanged { item: Option<AnalysisItem> },
    ItemSettled { item: AnalysisItem },
    QuotaChanged { quota: QuotaSnapshot },
    #[serde(rename_all = "camelCase")]
    DeferredResumed { item_id: String },
    #[serde(rename_all = "camelCase")]
    DeferredRejected { item_id: String, reason: String },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::AuthPromptRequested { .. } => "auth-prompt-requested",
            SessionEvent::CurrentItemChanged { .. } => "current-item-changed",
            SessionEvent::ItemSettled { .. } => "item-settled",
            SessionEvent::QuotaChanged { .. } => "quota-changed",
            SessionEvent::DeferredResumed { .. } => "deferred-resumed",
            SessionEvent::DeferredRejected { .. } => "deferred-rejected",
        }
    }
}
