// ============================================================================
// Bet Book
// ============================================================================
//
// One stake per (bettor, question). No top-ups: a second stake on the same
// pair is rejected with `DuplicateBet`. Bets are never deleted; the only
// mutation after creation is the `claimed` flag.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{MarketError, MarketResult};
use crate::questions::{Question, QuestionLedger};
use crate::types::{now, Amount, BetView, Identity, QuestionId, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub question_id: QuestionId,
    pub bettor: Identity,
    pub side: Side,
    pub amount: Amount,
    pub claimed: bool,
    pub placed_at: i64,
}

impl Bet {
    pub fn view(&self) -> BetView {
        BetView {
            question_id: self.question_id,
            bettor: self.bettor.clone(),
            side: self.side.as_bool(),
            amount: self.amount,
            claimed: self.claimed,
            placed_at: self.placed_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetBook {
    /// question -> bettor -> bet
    bets: BTreeMap<QuestionId, BTreeMap<Identity, Bet>>,
}

impl BetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that a stake would be accepted without recording anything.
    ///
    /// Checks run in a fixed order: amount, question, resolution, duplicate,
    /// then the side's counters.
    pub fn validate(
        &self,
        questions: &QuestionLedger,
        bettor: &Identity,
        question_id: QuestionId,
        side: Side,
        amount: Amount,
    ) -> MarketResult<()> {
        if amount == 0 {
            return Err(MarketError::InvalidAmount);
        }
        let question = questions.get(question_id)?;
        if question.is_resolved() {
            return Err(MarketError::AlreadyResolved(question_id));
        }
        if self.contains(bettor, question_id) {
            return Err(MarketError::DuplicateBet {
                bettor: bettor.clone(),
                question_id,
            });
        }
        let pool = question.pool(side);
        if pool.stake_total.checked_add(amount).is_none() || pool.bet_count == u64::MAX {
            return Err(MarketError::Overflow);
        }
        Ok(())
    }

    /// Record a stake and forward it to the question's aggregates.
    /// Nothing is written unless `validate` passes.
    pub fn place_bet<'q>(
        &mut self,
        questions: &'q mut QuestionLedger,
        bettor: Identity,
        question_id: QuestionId,
        side: Side,
        amount: Amount,
    ) -> MarketResult<(&Bet, &'q Question)> {
        self.validate(questions, &bettor, question_id, side, amount)?;

        let question = questions.record_stake(question_id, side, amount)?;

        let bet = Bet {
            question_id,
            bettor: bettor.clone(),
            side,
            amount,
            claimed: false,
            placed_at: now(),
        };
        let bet = self
            .bets
            .entry(question_id)
            .or_default()
            .entry(bettor)
            .or_insert(bet);
        Ok((bet, question))
    }

    pub fn contains(&self, bettor: &Identity, question_id: QuestionId) -> bool {
        self.get(bettor, question_id).is_some()
    }

    pub fn get(&self, bettor: &Identity, question_id: QuestionId) -> Option<&Bet> {
        self.bets.get(&question_id).and_then(|by_bettor| by_bettor.get(bettor))
    }

    pub(crate) fn get_mut(&mut self, bettor: &Identity, question_id: QuestionId) -> Option<&mut Bet> {
        self.bets
            .get_mut(&question_id)
            .and_then(|by_bettor| by_bettor.get_mut(bettor))
    }

    pub fn get_bet(&self, bettor: &Identity, question_id: QuestionId) -> MarketResult<BetView> {
        self.get(bettor, question_id)
            .map(Bet::view)
            .ok_or_else(|| MarketError::BetNotFound {
                bettor: bettor.clone(),
                question_id,
            })
    }

    /// All bets on one question, ordered by bettor
    pub fn bets_on(&self, question_id: QuestionId) -> impl Iterator<Item = &Bet> {
        self.bets
            .get(&question_id)
            .into_iter()
            .flat_map(|by_bettor| by_bettor.values())
    }

    /// All bets placed by one identity, ordered by question
    pub fn bets_by<'a>(&'a self, bettor: &'a Identity) -> impl Iterator<Item = &'a Bet> + 'a {
        self.bets
            .values()
            .filter_map(move |by_bettor| by_bettor.get(bettor))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bet> {
        self.bets.values().flat_map(|by_bettor| by_bettor.values())
    }

    pub fn len(&self) -> usize {
        self.bets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
