//! Referral records
//!
//! A referrer/referred relationship, recorded exactly once per referred
//! user. Payment flags flip once per side; the record itself is never
//! deleted.

use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, UserId};

/// Which side of a referral a payment settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralSide {
    Referrer,
    Referred,
}

/// Attribution record, unique on the referred user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub referrer_id: UserId,

    /// A user can be referred at most once, by any code
    pub referred_id: UserId,

    /// Code the referred user redeemed
    pub code: String,

    pub referrer_paid: bool,
    pub referred_paid: bool,

    pub created_at: Timestamp,
}

impl ReferralRecord {
    pub fn new(
        referrer_id: UserId,
        referred_id: UserId,
        code: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            referrer_id,
            referred_id,
            code: code.into(),
            referrer_paid: false,
            referred_paid: false,
            created_at: now,
        }
    }

    /// Flip the paid flag for one side
    pub fn mark_paid(&mut self, side: ReferralSide) {
        match side {
            ReferralSide::Referrer => self.referrer_paid = true,
            ReferralSide::Referred => self.referred_paid = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_paid() {
        let mut rec = ReferralRecord::new(
            UserId::from("referrer"),
            UserId::from("referred"),
            "CODE1",
            Timestamp::from_millis(1_000),
        );
        assert!(!rec.referrer_paid);
        assert!(!rec.referred_paid);

        rec.mark_paid(ReferralSide::Referrer);
        assert!(rec.referrer_paid);
        assert!(!rec.referred_paid);

        rec.mark_paid(ReferralSide::Referred);
        assert!(rec.referred_paid);
    }
}
