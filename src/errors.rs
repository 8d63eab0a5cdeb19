// ============================================================================
// Market Errors
// ============================================================================
//
// Every failure aborts the whole operation before any state is committed.
// Nothing here is retried internally; retry is the caller's policy.
//
// ============================================================================

use serde::Serialize;

use crate::types::{Identity, QuestionId};

/// Result type for market operations
pub type MarketResult<T> = Result<T, MarketError>;

/// Why the funds sink refused a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum TransferError {
    #[error("escrow pool holds {available}, cannot pay {requested}")]
    InsufficientPool { available: u128, requested: u128 },

    #[error("escrow is frozen")]
    Frozen,

    #[error("escrow pool would overflow")]
    PoolOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum MarketError {
    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: Identity, action: &'static str },

    #[error("Question {0} not found")]
    QuestionNotFound(QuestionId),

    #[error("No bet by {bettor} on question {question_id}")]
    BetNotFound { bettor: Identity, question_id: QuestionId },

    #[error("Stake amount must be greater than zero")]
    InvalidAmount,

    #[error("{bettor} already has a bet on question {question_id}")]
    DuplicateBet { bettor: Identity, question_id: QuestionId },

    #[error("Question {0} is already resolved")]
    AlreadyResolved(QuestionId),

    #[error("Question {0} is not resolved yet")]
    NotResolved(QuestionId),

    #[error("{bettor} has no bet on question {question_id}")]
    NoBet { bettor: Identity, question_id: QuestionId },

    #[error("{bettor} already claimed on question {question_id}")]
    AlreadyClaimed { bettor: Identity, question_id: QuestionId },

    #[error("{bettor} bet on the losing side of question {question_id}")]
    LostBet { bettor: Identity, question_id: QuestionId },

    #[error("Question {0} has no stake on the winning side")]
    NoWinningPool(QuestionId),

    #[error("Transfer failed: {0}")]
    TransferFailed(TransferError),

    #[error("Market is stopped")]
    MarketStopped,

    #[error("Betting closed at {closes_at}")]
    BettingClosed { closes_at: i64 },

    #[error("Arithmetic overflow")]
    Overflow,
}

impl MarketError {
    /// Stable machine-readable code, used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Unauthorized { .. } => "unauthorized",
            MarketError::QuestionNotFound(_) | MarketError::BetNotFound { .. } => "not_found",
            MarketError::InvalidAmount => "invalid_amount",
            MarketError::DuplicateBet { .. } => "duplicate_bet",
            MarketError::AlreadyResolved(_) => "already_resolved",
            MarketError::NotResolved(_) => "not_resolved",
            MarketError::NoBet { .. } => "no_bet",
            MarketError::AlreadyClaimed { .. } => "already_claimed",
            MarketError::LostBet { .. } => "lost_bet",
            MarketError::NoWinningPool(_) => "no_winning_pool",
            MarketError::TransferFailed(_) => "transfer_failed",
            MarketError::MarketStopped => "market_stopped",
            MarketError::BettingClosed { .. } => "betting_closed",
            MarketError::Overflow => "overflow",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MarketError::QuestionNotFound(_) | MarketError::BetNotFound { .. }
        )
    }
}

impl From<TransferError> for MarketError {
    fn from(err: TransferError) -> Self {
        MarketError::TransferFailed(err)
    }
}
