//! Window counts
//!
//! Per-user admission counters for recurring capped actions. A new period
//! starts a fresh row; counts are never decremented.

use serde::{Deserialize, Serialize};

use crate::types::{PeriodKey, Timestamp, UserId};

/// Admission counter for `(user, action, period)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCount {
    pub user_id: UserId,
    pub action_id: String,
    pub period_key: PeriodKey,
    pub count: u32,
    pub updated_at: Timestamp,
}

impl WindowCount {
    /// First admission in a period
    pub fn first(
        user_id: UserId,
        action_id: impl Into<String>,
        period_key: PeriodKey,
        now: Timestamp,
    ) -> Self {
        Self {
            user_id,
            action_id: action_id.into(),
            period_key,
            count: 1,
            updated_at: now,
        }
    }

    /// Storage key for the uniqueness constraint
    pub fn key(user_id: &UserId, action_id: &str, period_key: &PeriodKey) -> String {
        format!("{}:{}:{}", user_id, action_id, period_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = WindowCount::key(
            &UserId::from("u1"),
            "job_share",
            &PeriodKey("2026-08-07".to_string()),
        );
        assert_eq!(key, "u1:job_share:2026-08-07");
    }

    #[test]
    fn test_first_starts_at_one() {
        let wc = WindowCount::first(
            UserId::from("u1"),
            "job_share",
            PeriodKey("2026-08-07".to_string()),
            Timestamp::from_millis(1_000),
        );
        assert_eq!(wc.count, 1);
    }
}
