//! Action catalog
//!
//! Static table mapping an action id to its reward rule. Purely
//! declarative: resolving a rule has no side effects, and an unknown id
//! touches no state.
//!
//! Rules form a closed set of variants, so every call site handles the
//! full shape of the catalog exhaustively instead of dispatching on
//! action-id strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Pool;

/// Reward rule for a single action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RewardRule {
    /// Paid at most once per user, ever
    OneTime { amount: u64, pool: Pool },

    /// Paid on every admitted occurrence, subject to optional caps per
    /// calendar day and/or calendar month
    Recurring {
        amount: u64,
        pool: Pool,
        daily_cap: Option<u32>,
        monthly_cap: Option<u32>,
    },

    /// Paid to the referrer when a new user redeems their code, with an
    /// optional signup bonus for the referred user. Both sides are paid
    /// from the permanent pool.
    Referral {
        referrer_amount: u64,
        referred_bonus: Option<u64>,
    },
}

impl RewardRule {
    /// Shorthand for a permanent-pool one-time rule
    pub fn one_time(amount: u64) -> Self {
        Self::OneTime {
            amount,
            pool: Pool::Permanent,
        }
    }

    /// Shorthand for a daily-capped recurring rule
    pub fn daily(amount: u64, pool: Pool, cap: u32) -> Self {
        Self::Recurring {
            amount,
            pool,
            daily_cap: Some(cap),
            monthly_cap: None,
        }
    }

    /// Shorthand for a monthly-capped recurring rule
    pub fn monthly(amount: u64, pool: Pool, cap: u32) -> Self {
        Self::Recurring {
            amount,
            pool,
            daily_cap: None,
            monthly_cap: Some(cap),
        }
    }
}

/// Declarative action-id to reward-rule table
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    rules: HashMap<String, RewardRule>,
}

impl ActionCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The platform's builtin action table
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        // Social one-time actions
        catalog.insert("github_star", RewardRule::one_time(100));
        catalog.insert("linkedin_follow", RewardRule::one_time(50));
        catalog.insert("profile_complete", RewardRule::one_time(75));

        // Recurring share/visit actions, capped per day
        catalog.insert("job_share", RewardRule::daily(5, Pool::Permanent, 5));
        catalog.insert("career_page_visit", RewardRule::daily(1, Pool::Ephemeral, 10));

        // Vouching, capped per month
        catalog.insert("vouch_sent", RewardRule::monthly(10, Pool::Permanent, 5));
        catalog.insert("vouch_received", RewardRule::monthly(15, Pool::Permanent, 5));

        // Referral attribution
        catalog.insert(
            "referral_signup",
            RewardRule::Referral {
                referrer_amount: 10,
                referred_bonus: Some(25),
            },
        );

        catalog
    }

    /// Add or replace a rule
    pub fn insert(&mut self, action_id: impl Into<String>, rule: RewardRule) {
        self.rules.insert(action_id.into(), rule);
    }

    /// Look up the rule for an action id
    pub fn resolve(&self, action_id: &str) -> Option<&RewardRule> {
        self.rules.get(action_id)
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over all registered actions
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RewardRule)> {
        self.rules.iter()
    }
}
