use std::collections::VecDeque;

use crate::error::QuotaExceededError;
use crate::models::{AnalysisItem, AnalysisStatusKind, User};

use super::quota::{QuotaPolicy, QuotaSnapshot};

/// Plain session data with synchronous point mutations. Locking and task
/// orchestration live in the controller.
#[derive(Debug, Clone)]
pub struct SessionState {
    user: Option<User>,
    current_item: Option<AnalysisItem>,
    /// Most recent first.
    history: VecDeque<AnalysisItem>,
    history_limit: usize,
    quota: QuotaSnapshot,
    policy: QuotaPolicy,
    auth_prompt_open: bool,
}

impl SessionState {
    pub fn new(policy: QuotaPolicy, history_limit: usize) -> Self {
        Self {
            user: None,
            current_item: None,
            history: VecDeque::with_capacity(history_limit.min(256)),
            history_limit: history_limit.max(1),
            quota: policy.initial(),
            policy,
            auth_prompt_open: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    pub fn current_item(&self) -> Option<&AnalysisItem> {
        self.current_item.as_ref()
    }

    pub fn clear_current_item(&mut self) -> Option<AnalysisItem> {
        self.current_item.take()
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &AnalysisItem> + '_ {
        self.history.iter()
    }

    pub fn history_snapshot(&self) -> Vec<AnalysisItem> {
        self.history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn quota(&self) -> QuotaSnapshot {
        self.quota
    }

    pub fn auth_prompt_open(&self) -> bool {
        self.auth_prompt_open
    }

    pub fn set_auth_prompt_open(&mut self, open: bool) {
        self.auth_prompt_open = open;
    }

    /// Anonymous placeholder currently on screen, if any.
    pub fn deferred_placeholder(&self) -> Option<&AnalysisItem> {
        self.current_item
            .as_ref()
            .filter(|item| item.status_kind() == AnalysisStatusKind::Processing)
    }

    /// Show an anonymous placeholder. History and quota are untouched.
    pub fn begin_deferred(&mut self, placeholder: AnalysisItem) {
        self.current_item = Some(placeholder);
    }

    /// Admit and charge one analysis in a single step, then focus it.
    /// On rejection nothing changes.
    pub fn begin_analysis(&mut self, item: AnalysisItem) -> Result<(), QuotaExceededError> {
        self.policy.admit(&self.quota)?;
        self.quota = self.policy.consume(self.quota);
        self.current_item = Some(item);
        Ok(())
    }

    /// The settled snapshot becomes the current item and the newest history
    /// entry. Returns how many old entries were evicted.
    pub fn record_settled(&mut self, item: AnalysisItem) -> usize {
        self.current_item = Some(item.clone());

        self.history.push_front(item);
        let mut evicted = 0;
        while self.history.len() > self.history_limit {
            self.history.pop_back();
            evicted += 1;
        }

        evicted
    }

    pub fn credit_referral(&mut self) -> QuotaSnapshot {
        self.quota = self.policy.credit_referral(self.quota);
        self.quota
    }

    /// Focus an existing history entry; `false` when the id is unknown.
    pub fn focus_history_item(&mut self, item_id: &str) -> bool {
        match self.history.iter().find(|item| item.id() == item_id) {
            Some(item) => {
                self.current_item = Some(item.clone());
                true
            }
            None => false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(QuotaPolicy::default(), 200)
    }
}
