use serde::{Deserialize, Serialize};

use crate::error::QuotaExceededError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    pub remaining: u32,
    pub referral_credits: u32,
}

/// Session-scoped usage rules. There is no day rollover: the allowance is
/// granted once when the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub daily_free: u32,
}

impl QuotaPolicy {
    pub fn new(daily_free: u32) -> Self {
        Self { daily_free }
    }

    pub fn initial(&self) -> QuotaSnapshot {
        QuotaSnapshot {
            remaining: self.daily_free,
            referral_credits: 0,
        }
    }

    pub fn admit(&self, quota: &QuotaSnapshot) -> Result<(), QuotaExceededError> {
        if quota.remaining == 0 {
            return Err(QuotaExceededError {
                referral_credits: quota.referral_credits,
            });
        }
        Ok(())
    }

    /// Spend one analysis; floors at zero.
    pub fn consume(&self, quota: QuotaSnapshot) -> QuotaSnapshot {
        QuotaSnapshot {
            remaining: quota.remaining.saturating_sub(1),
            ..quota
        }
    }

    /// A referral is a permanent top-up: both counters move together.
    pub fn credit_referral(&self, quota: QuotaSnapshot) -> QuotaSnapshot {
        QuotaSnapshot {
            remaining: quota.remaining.saturating_add(1),
            referral_credits: quota.referral_credits.saturating_add(1),
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(15)
    }
}
