// ============================================================================
// Question Ledger
// ============================================================================
//
// Owns every question and its per-side aggregates. Ids are sequential and
// start at 1, so question `n` lives at index `n - 1`.
//
// Lifecycle: Open --mark_resolved(outcome)--> Resolved. Resolved is
// terminal; stakes are refused from that point on.
//
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::errors::{MarketError, MarketResult};
use crate::types::{now, Amount, QuestionId, QuestionView, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QuestionStatus {
    Open,
    Resolved { outcome: Side, resolved_at: i64 },
}

/// Count and total stake on one side of a question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePool {
    pub bet_count: u64,
    pub stake_total: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub status: QuestionStatus,
    pub positive: SidePool,
    pub negative: SidePool,
    pub created_at: i64,
}

impl Question {
    fn new(id: QuestionId, text: String) -> Self {
        Self {
            id,
            text,
            status: QuestionStatus::Open,
            positive: SidePool::default(),
            negative: SidePool::default(),
            created_at: now(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.status, QuestionStatus::Resolved { .. })
    }

    /// Final outcome, `None` while the question is open
    pub fn outcome(&self) -> Option<Side> {
        match self.status {
            QuestionStatus::Open => None,
            QuestionStatus::Resolved { outcome, .. } => Some(outcome),
        }
    }

    pub fn pool(&self, side: Side) -> &SidePool {
        match side {
            Side::Yes => &self.positive,
            Side::No => &self.negative,
        }
    }

    fn pool_mut(&mut self, side: Side) -> &mut SidePool {
        match side {
            Side::Yes => &mut self.positive,
            Side::No => &mut self.negative,
        }
    }

    pub fn total_stake(&self) -> Amount {
        self.positive.stake_total.saturating_add(self.negative.stake_total)
    }

    pub fn view(&self) -> QuestionView {
        let resolved_at = match self.status {
            QuestionStatus::Open => None,
            QuestionStatus::Resolved { resolved_at, .. } => Some(resolved_at),
        };
        QuestionView {
            id: self.id,
            text: self.text.clone(),
            resolved: self.is_resolved(),
            outcome: self.outcome().map(Side::as_bool),
            positive_bet_count: self.positive.bet_count,
            negative_bet_count: self.negative.bet_count,
            positive_stake_total: self.positive.stake_total,
            negative_stake_total: self.negative.stake_total,
            created_at: self.created_at,
            resolved_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionLedger {
    questions: Vec<Question>,
}

impl QuestionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Store a new open question and return its id.
    /// Authorization is checked by the caller against the access registry.
    pub(crate) fn add_question(&mut self, text: String) -> QuestionId {
        let id = QuestionId(self.questions.len() as u64 + 1);
        self.questions.push(Question::new(id, text));
        id
    }

    pub fn get(&self, id: QuestionId) -> MarketResult<&Question> {
        id.0.checked_sub(1)
            .and_then(|idx| self.questions.get(idx as usize))
            .ok_or(MarketError::QuestionNotFound(id))
    }

    fn get_mut(&mut self, id: QuestionId) -> MarketResult<&mut Question> {
        id.0.checked_sub(1)
            .and_then(|idx| self.questions.get_mut(idx as usize))
            .ok_or(MarketError::QuestionNotFound(id))
    }

    pub fn get_question(&self, id: QuestionId) -> MarketResult<QuestionView> {
        self.get(id).map(Question::view)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Add a stake to one side's aggregates. Refused once the question is resolved.
    pub(crate) fn record_stake(&mut self, id: QuestionId, side: Side, amount: Amount) -> MarketResult<&Question> {
        let question = self.get_mut(id)?;
        if question.is_resolved() {
            return Err(MarketError::AlreadyResolved(id));
        }

        let pool = question.pool(side);
        let bet_count = pool.bet_count.checked_add(1).ok_or(MarketError::Overflow)?;
        let stake_total = pool.stake_total.checked_add(amount).ok_or(MarketError::Overflow)?;

        let pool = question.pool_mut(side);
        pool.bet_count = bet_count;
        pool.stake_total = stake_total;
        Ok(question)
    }

    /// One-shot Open -> Resolved transition
    pub(crate) fn mark_resolved(&mut self, id: QuestionId, outcome: Side) -> MarketResult<&Question> {
        let question = self.get_mut(id)?;
        if question.is_resolved() {
            return Err(MarketError::AlreadyResolved(id));
        }
        question.status = QuestionStatus::Resolved {
            outcome,
            resolved_at: now(),
        };
        Ok(question)
    }
}
