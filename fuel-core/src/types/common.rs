//! Shared base types
//!
//! Identifiers, timestamps, pool and period enums used across all modules.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// 32-byte digest used for transaction ids
pub type TxId = [u8; 32];

/// User identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Timestamp type (Unix milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Balance pool a reward is credited to
///
/// The ephemeral pool replenishes periodically; the permanent pool only
/// grows via rewards and never auto-expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Periodically replenished allowance
    Ephemeral,
    /// Earned credit, spent without expiry
    #[default]
    Permanent,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => write!(f, "ephemeral"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Kind of rate window a recurring action is capped over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// Calendar day (UTC)
    Daily,
    /// Calendar month (UTC)
    Monthly,
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Calendar period key: `YYYY-MM-DD` for daily windows, `YYYY-MM` for
/// monthly windows. Derived from UTC so every service instance computes
/// the same key for the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey(pub String);

impl PeriodKey {
    /// Day key for the given instant
    pub fn day(ts: Timestamp) -> Self {
        let dt = Self::to_datetime(ts);
        Self(format!("{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day()))
    }

    /// Month key for the given instant
    pub fn month(ts: Timestamp) -> Self {
        let dt = Self::to_datetime(ts);
        Self(format!("{:04}-{:02}", dt.year(), dt.month()))
    }

    fn to_datetime(ts: Timestamp) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ts.as_millis() as i64)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Key for the given period kind
    pub fn for_kind(kind: PeriodKind, ts: Timestamp) -> Self {
        match kind {
            PeriodKind::Daily => Self::day(ts),
            PeriodKind::Monthly => Self::month(ts),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a transaction id
///
/// Hashes timestamp, process id and thread id so ids are unique across
/// concurrent requests without a coordination round-trip.
pub fn generate_tx_id() -> TxId {
    let mut hasher = Sha256::new();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    hasher.update(timestamp.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());

    let thread_id = format!("{:?}", std::thread::current().id());
    hasher.update(thread_id.as_bytes());

    let result = hasher.finalize();
    let mut id = [0u8; 32];
    id.copy_from_slice(&result);
    id
}

/// Digest to hex string
pub fn digest_to_hex(digest: &TxId) -> String {
    hex::encode(digest)
}

/// Parse a digest from a hex string
pub fn digest_from_hex(hex_str: &str) -> Result<TxId, hex::FromHexError> {
    let bytes = hex::decode(hex_str)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&bytes);
    Ok(digest)
}
