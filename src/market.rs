// ============================================================================
// Prediction Market - one market instance
// ============================================================================
//
// Ties the access registry, question ledger, bet book, resolution, payout
// and escrow together behind the public operations. Every mutating method
// takes `&mut self`, so a `SharedMarket` (one mutex per market) gives the
// total ordering the invariants rely on: no stake lands after resolution,
// and a bet is marked claimed before its transfer runs.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::access::AccessRegistry;
use crate::bets::BetBook;
use crate::config::MarketConfig;
use crate::errors::{MarketError, MarketResult};
use crate::events::{EventLog, EventRecord, MarketEvent};
use crate::payout::{self, ClaimReceipt};
use crate::questions::{Question, QuestionLedger};
use crate::resolution;
use crate::treasury::{Escrow, Treasury};
use crate::types::{now, Amount, BetView, Identity, QuestionId, QuestionView, Side};

pub type SharedMarket<T = Escrow> = Arc<Mutex<PredictionMarket<T>>>;

/// Everything needed to rebuild a market after a restart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot<T = Escrow> {
    pub access: AccessRegistry,
    pub questions: QuestionLedger,
    pub bets: BetBook,
    pub treasury: T,
    pub running: bool,
    pub created_at: i64,
    pub closes_at: Option<i64>,
    pub next_event_seq: u64,
}

/// Escrow position of the whole market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Solvency {
    pub pool_balance: Amount,
    pub outstanding_liability: Amount,
}

impl Solvency {
    pub fn is_solvent(&self) -> bool {
        self.outstanding_liability <= self.pool_balance
    }
}

#[derive(Debug)]
pub struct PredictionMarket<T = Escrow> {
    access: AccessRegistry,
    questions: QuestionLedger,
    bets: BetBook,
    treasury: T,
    events: EventLog,
    running: bool,
    created_at: i64,
    closes_at: Option<i64>,
}

impl PredictionMarket<Escrow> {
    pub fn new(config: &MarketConfig) -> Self {
        Self::with_treasury(config, Escrow::new())
    }
}

impl<T: Treasury> PredictionMarket<T> {
    pub fn with_treasury(config: &MarketConfig, treasury: T) -> Self {
        let created_at = now();
        let closes_at = config
            .betting_window
            .map(|window| {
                let secs = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
                created_at.saturating_add(secs)
            });

        info!(admin = %config.admin, ?closes_at, "prediction market created");

        Self {
            access: AccessRegistry::new(config.admin.clone()),
            questions: QuestionLedger::new(),
            bets: BetBook::new(),
            treasury,
            events: EventLog::new(),
            running: true,
            created_at,
            closes_at,
        }
    }

    pub fn into_shared(self) -> SharedMarket<T> {
        Arc::new(Mutex::new(self))
    }

    // ===== READS =====

    pub fn admin(&self) -> &Identity {
        self.access.admin()
    }

    pub fn is_trusted_source(&self, identity: &Identity) -> bool {
        self.access.is_trusted_source(identity)
    }

    pub fn get_question(&self, question_id: QuestionId) -> MarketResult<QuestionView> {
        self.questions.get_question(question_id)
    }

    pub fn questions(&self) -> Vec<QuestionView> {
        self.questions.iter().map(Question::view).collect()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn get_bet(&self, bettor: &Identity, question_id: QuestionId) -> MarketResult<BetView> {
        self.bets.get_bet(bettor, question_id)
    }

    pub fn bets_by(&self, bettor: &Identity) -> Vec<BetView> {
        self.bets.bets_by(bettor).map(|bet| bet.view()).collect()
    }

    /// What `bettor` would receive by claiming now, if anything
    pub fn pending_payout(&self, bettor: &Identity, question_id: QuestionId) -> Option<Amount> {
        payout::pending_payout(&self.questions, &self.bets, bettor, question_id)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn closes_at(&self) -> Option<i64> {
        self.closes_at
    }

    pub fn treasury(&self) -> &T {
        &self.treasury
    }

    pub fn treasury_mut(&mut self) -> &mut T {
        &mut self.treasury
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    // ===== WRITES =====

    /// Admin-only start/stop switch. Always allowed, even while stopped.
    pub fn run_switch(&mut self, caller: &Identity, running: bool) -> MarketResult<bool> {
        self.access.require_admin(caller, "toggle the market")?;
        if self.running != running {
            self.running = running;
            info!(running, "market running state changed");
            self.events.emit(MarketEvent::RunningChanged { running });
        }
        Ok(self.running)
    }

    pub fn add_trusted_source(&mut self, caller: &Identity, source: Identity) -> MarketResult<()> {
        self.require_running()?;
        let added = self
            .access
            .add_trusted_source(caller, source.clone())
            .map_err(|e| {
                warn!(%caller, "rejected add_trusted_source");
                e
            })?;

        if added {
            info!(%source, "trusted source added");
            self.events.emit(MarketEvent::TrustedSourceAdded { source });
        }
        Ok(())
    }

    pub fn add_question(&mut self, caller: &Identity, text: impl Into<String>) -> MarketResult<QuestionId> {
        self.require_running()?;
        self.access.require_admin(caller, "add a question").map_err(|e| {
            warn!(%caller, "rejected add_question");
            e
        })?;

        let text = text.into();
        let question_id = self.questions.add_question(text.clone());
        info!(%question_id, %text, "question added");
        self.events.emit(MarketEvent::QuestionAdded { question_id, text });
        Ok(question_id)
    }

    /// Stake `amount` on `side`. The amount is deposited into escrow as part
    /// of the same operation; if the deposit is refused nothing is recorded.
    pub fn bet(
        &mut self,
        bettor: &Identity,
        question_id: QuestionId,
        side: Side,
        amount: Amount,
    ) -> MarketResult<BetView> {
        self.require_running()?;
        if let Some(closes_at) = self.closes_at {
            if now() >= closes_at {
                return Err(MarketError::BettingClosed { closes_at });
            }
        }

        // Nothing moves into escrow unless the book would accept the bet
        self.bets
            .validate(&self.questions, bettor, question_id, side, amount)?;

        self.treasury.deposit(bettor, amount)?;

        let (bet, question) = self
            .bets
            .place_bet(&mut self.questions, bettor.clone(), question_id, side, amount)?;
        let view = bet.view();
        let updated = question_data(question);

        info!(%bettor, %question_id, %side, amount, "bet placed");
        self.events.emit(MarketEvent::NewBet {
            bettor: bettor.clone(),
            question_id,
            side: side.as_bool(),
            amount,
        });
        self.events.emit(updated);
        Ok(view)
    }

    pub fn resolve_question(
        &mut self,
        caller: &Identity,
        question_id: QuestionId,
        outcome: Side,
    ) -> MarketResult<QuestionView> {
        self.require_running()?;
        let question = resolution::resolve_question(
            &self.access,
            &mut self.questions,
            caller,
            question_id,
            outcome,
        )
        .map_err(|e| {
            warn!(%caller, %question_id, error = %e, "rejected resolve_question");
            e
        })?;
        let view = question.view();
        let updated = question_data(question);

        info!(%question_id, %outcome, resolver = %caller, "question resolved");
        self.events.emit(MarketEvent::QuestionResolved {
            question_id,
            outcome: outcome.as_bool(),
            resolver: caller.clone(),
        });
        self.events.emit(updated);
        Ok(view)
    }

    pub fn claim_funds(&mut self, caller: &Identity, question_id: QuestionId) -> MarketResult<ClaimReceipt> {
        self.require_running()?;
        let receipt = payout::execute_claim(
            &self.questions,
            &mut self.bets,
            &mut self.treasury,
            caller,
            question_id,
        )?;

        info!(%caller, %question_id, payout = receipt.payout, "funds claimed");
        self.events.emit(MarketEvent::FundsClaimed {
            bettor: caller.clone(),
            question_id,
            payout: receipt.payout,
        });
        Ok(receipt)
    }

    // ===== ESCROW =====

    /// Funds the escrow still owes: unclaimed stakes on open questions and
    /// unclaimed winning payouts on resolved ones. Losing stakes on resolved
    /// questions are no longer owed to anyone.
    pub fn outstanding_liability(&self) -> MarketResult<Amount> {
        let mut owed: Amount = 0;
        for question in self.questions.iter() {
            let due = match question.outcome() {
                None => self
                    .bets
                    .bets_on(question.id)
                    .try_fold(0 as Amount, |acc, bet| acc.checked_add(bet.amount)),
                Some(outcome) => {
                    let winning_pool = question.pool(outcome).stake_total;
                    let losing_pool = question.pool(outcome.opposite()).stake_total;
                    let mut due: Amount = 0;
                    for bet in self.bets.bets_on(question.id) {
                        if bet.claimed || bet.side != outcome {
                            continue;
                        }
                        let payout = payout::calculate_payout(
                            question.id,
                            bet.amount,
                            winning_pool,
                            losing_pool,
                        )?;
                        due = due.checked_add(payout).ok_or(MarketError::Overflow)?;
                    }
                    Some(due)
                }
            };
            owed = owed
                .checked_add(due.ok_or(MarketError::Overflow)?)
                .ok_or(MarketError::Overflow)?;
        }
        Ok(owed)
    }

    pub fn solvency(&self) -> MarketResult<Solvency> {
        Ok(Solvency {
            pool_balance: self.treasury.pool_balance(),
            outstanding_liability: self.outstanding_liability()?,
        })
    }

    fn require_running(&self) -> MarketResult<()> {
        if self.running {
            Ok(())
        } else {
            Err(MarketError::MarketStopped)
        }
    }
}

impl<T: Treasury + Clone> PredictionMarket<T> {
    pub fn snapshot(&self) -> MarketSnapshot<T> {
        MarketSnapshot {
            access: self.access.clone(),
            questions: self.questions.clone(),
            bets: self.bets.clone(),
            treasury: self.treasury.clone(),
            running: self.running,
            created_at: self.created_at,
            closes_at: self.closes_at,
            next_event_seq: self.events.next_seq(),
        }
    }

    pub fn restore(snapshot: MarketSnapshot<T>) -> Self {
        info!(
            admin = %snapshot.access.admin(),
            questions = snapshot.questions.len(),
            bets = snapshot.bets.len(),
            "prediction market restored"
        );
        Self {
            access: snapshot.access,
            questions: snapshot.questions,
            bets: snapshot.bets,
            treasury: snapshot.treasury,
            events: EventLog::starting_at(snapshot.next_event_seq),
            running: snapshot.running,
            created_at: snapshot.created_at,
            closes_at: snapshot.closes_at,
        }
    }
}

fn question_data(question: &Question) -> MarketEvent {
    MarketEvent::UpdatedQuestionData {
        question_id: question.id,
        positive_bet_count: question.positive.bet_count,
        negative_bet_count: question.negative.bet_count,
        positive_stake_total: question.positive.stake_total,
        negative_stake_total: question.negative.stake_total,
    }
}
