// ============================================================================
// Payout - claiming winnings on a resolved question
// ============================================================================
//
// Winner payout:
//
//     payout = stake + stake * losing_pool / winning_pool
//
// Integer arithmetic, truncating toward zero. Summed over every winner the
// payouts never exceed the question's total stake; truncation dust stays in
// escrow.
//
// Order of effects on a claim:
//   1. bet.claimed = true
//   2. transfer from escrow
//   3. if the transfer fails, bet.claimed = false and TransferFailed
//
// ============================================================================

use serde::Serialize;
use tracing::{debug, warn};

use crate::bets::BetBook;
use crate::errors::{MarketError, MarketResult};
use crate::questions::QuestionLedger;
use crate::treasury::Treasury;
use crate::types::{Amount, Identity, QuestionId};

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimReceipt {
    pub bettor: Identity,
    pub question_id: QuestionId,
    /// Original stake returned
    pub stake: Amount,
    /// Share of the losing pool
    pub winnings: Amount,
    /// stake + winnings
    pub payout: Amount,
}

/// Stake plus a pro-rata share of the losing pool.
///
/// `winning_pool == 0` cannot be paid from and fails with `NoWinningPool`.
pub fn calculate_payout(
    question_id: QuestionId,
    stake: Amount,
    winning_pool: Amount,
    losing_pool: Amount,
) -> MarketResult<Amount> {
    if winning_pool == 0 {
        return Err(MarketError::NoWinningPool(question_id));
    }

    let share = stake
        .checked_mul(losing_pool)
        .ok_or(MarketError::Overflow)?
        / winning_pool;

    stake.checked_add(share).ok_or(MarketError::Overflow)
}

/// What a winning bet would pay right now, without claiming it.
/// `None` for losing, claimed or unsettled bets.
pub fn pending_payout(
    questions: &QuestionLedger,
    bets: &BetBook,
    bettor: &Identity,
    question_id: QuestionId,
) -> Option<Amount> {
    let question = questions.get(question_id).ok()?;
    let outcome = question.outcome()?;
    let bet = bets.get(bettor, question_id)?;
    if bet.claimed || bet.side != outcome {
        return None;
    }
    calculate_payout(
        question_id,
        bet.amount,
        question.pool(outcome).stake_total,
        question.pool(outcome.opposite()).stake_total,
    )
    .ok()
}

/// Validate a claim, mark the bet claimed, then pay out through `treasury`.
///
/// Checks run in order: question exists, resolved, caller has a bet, not
/// yet claimed, bet is on the winning side.
pub fn execute_claim<T: Treasury>(
    questions: &QuestionLedger,
    bets: &mut BetBook,
    treasury: &mut T,
    caller: &Identity,
    question_id: QuestionId,
) -> MarketResult<ClaimReceipt> {
    let question = questions.get(question_id)?;
    let outcome = question
        .outcome()
        .ok_or(MarketError::NotResolved(question_id))?;

    let bet = bets.get(caller, question_id).ok_or_else(|| MarketError::NoBet {
        bettor: caller.clone(),
        question_id,
    })?;
    if bet.claimed {
        return Err(MarketError::AlreadyClaimed {
            bettor: caller.clone(),
            question_id,
        });
    }
    if bet.side != outcome {
        return Err(MarketError::LostBet {
            bettor: caller.clone(),
            question_id,
        });
    }

    let stake = bet.amount;
    let winning_pool = question.pool(outcome).stake_total;
    let losing_pool = question.pool(outcome.opposite()).stake_total;
    let payout = calculate_payout(question_id, stake, winning_pool, losing_pool)?;

    debug!(
        %caller,
        %question_id,
        stake,
        winning_pool,
        losing_pool,
        payout,
        "payout calculated"
    );

    set_claimed(bets, caller, question_id, true);

    if let Err(err) = treasury.transfer(caller, payout) {
        set_claimed(bets, caller, question_id, false);
        warn!(%caller, %question_id, payout, error = %err, "payout transfer failed, claim rolled back");
        return Err(MarketError::TransferFailed(err));
    }

    Ok(ClaimReceipt {
        bettor: caller.clone(),
        question_id,
        stake,
        winnings: payout - stake,
        payout,
    })
}

fn set_claimed(bets: &mut BetBook, bettor: &Identity, question_id: QuestionId, claimed: bool) {
    if let Some(bet) = bets.get_mut(bettor, question_id) {
        bet.claimed = claimed;
    }
}
