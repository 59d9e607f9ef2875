//! Ledger metrics
//!
//! Cumulative counters over the award pipeline, cheap enough to bump on
//! every request. `snapshot()` produces a serializable view for the
//! stats endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use fuel_core::types::{PeriodKind, Timestamp};

/// Counter collector for the award pipeline
#[derive(Debug, Default)]
pub struct LedgerMetrics {
    awards_granted: AtomicU64,
    fuel_awarded: AtomicU64,
    already_completed: AtomicU64,
    cap_rejections_daily: AtomicU64,
    cap_rejections_monthly: AtomicU64,
    referrals_attributed: AtomicU64,
    referrals_rejected: AtomicU64,
    invalid_actions: AtomicU64,
    integrity_mismatches: AtomicU64,
    integrity_corrections: AtomicU64,
}

impl LedgerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn award_granted(&self, amount: u64) {
        self.awards_granted.fetch_add(1, Ordering::Relaxed);
        self.fuel_awarded.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn already_completed(&self) {
        self.already_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cap_rejected(&self, period: PeriodKind) {
        match period {
            PeriodKind::Daily => self.cap_rejections_daily.fetch_add(1, Ordering::Relaxed),
            PeriodKind::Monthly => self.cap_rejections_monthly.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn referral_attributed(&self) {
        self.referrals_attributed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn referral_rejected(&self) {
        self.referrals_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invalid_action(&self) {
        self.invalid_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn integrity_mismatch(&self) {
        self.integrity_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn integrity_corrected(&self) {
        self.integrity_corrections.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            awards_granted: self.awards_granted.load(Ordering::Relaxed),
            fuel_awarded: self.fuel_awarded.load(Ordering::Relaxed),
            already_completed: self.already_completed.load(Ordering::Relaxed),
            cap_rejections_daily: self.cap_rejections_daily.load(Ordering::Relaxed),
            cap_rejections_monthly: self.cap_rejections_monthly.load(Ordering::Relaxed),
            referrals_attributed: self.referrals_attributed.load(Ordering::Relaxed),
            referrals_rejected: self.referrals_rejected.load(Ordering::Relaxed),
            invalid_actions: self.invalid_actions.load(Ordering::Relaxed),
            integrity_mismatches: self.integrity_mismatches.load(Ordering::Relaxed),
            integrity_corrections: self.integrity_corrections.load(Ordering::Relaxed),
            taken_at: Timestamp::now(),
        }
    }
}

/// Serializable metrics view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub awards_granted: u64,
    pub fuel_awarded: u64,
    pub already_completed: u64,
    pub cap_rejections_daily: u64,
    pub cap_rejections_monthly: u64,
    pub referrals_attributed: u64,
    pub referrals_rejected: u64,
    pub invalid_actions: u64,
    pub integrity_mismatches: u64,
    pub integrity_corrections: u64,
    pub taken_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = LedgerMetrics::new();

        metrics.award_granted(100);
        metrics.award_granted(5);
        metrics.already_completed();
        metrics.cap_rejected(PeriodKind::Daily);
        metrics.cap_rejected(PeriodKind::Monthly);
        metrics.referral_attributed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.awards_granted, 2);
        assert_eq!(snapshot.fuel_awarded, 105);
        assert_eq!(snapshot.already_completed, 1);
        assert_eq!(snapshot.cap_rejections_daily, 1);
        assert_eq!(snapshot.cap_rejections_monthly, 1);
        assert_eq!(snapshot.referrals_attributed, 1);
    }
}
