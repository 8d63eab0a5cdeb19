// Shared types for the trusted-oracle prediction market

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stake units (wei-like fixed point, 1 ether = 10^18)
pub type Amount = u128;

/// One ether in stake units
pub const ETHER: Amount = 1_000_000_000_000_000_000;

/// Opaque caller identity (an address or account name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential question identifier, first question is 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a binary question a stake (or an outcome) is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn from_bool(positive: bool) -> Self {
        if positive {
            Side::Yes
        } else {
            Side::No
        }
    }

    pub fn as_bool(self) -> bool {
        matches!(self, Side::Yes)
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }
}

impl From<bool> for Side {
    fn from(value: bool) -> Self {
        Side::from_bool(value)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => f.write_str("yes"),
            Side::No => f.write_str("no"),
        }
    }
}

/// Read-only view of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub resolved: bool,
    /// `None` until the question is resolved
    pub outcome: Option<bool>,
    pub positive_bet_count: u64,
    pub negative_bet_count: u64,
    pub positive_stake_total: Amount,
    pub negative_stake_total: Amount,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

impl QuestionView {
    pub fn total_stake(&self) -> Amount {
        self.positive_stake_total.saturating_add(self.negative_stake_total)
    }
}

/// Read-only view of a single bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetView {
    pub question_id: QuestionId,
    pub bettor: Identity,
    pub side: bool,
    pub amount: Amount,
    pub claimed: bool,
    pub placed_at: i64,
}

/// Current unix timestamp in seconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
