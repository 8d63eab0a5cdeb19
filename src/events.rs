// ============================================================================
// Market Events
// ============================================================================
//
// Notifications emitted on every committed state change. They are kept in a
// bounded in-memory activity log and fanned out to live subscribers over a
// broadcast channel. A send with no subscribers is not an error.
//
// ============================================================================

use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::broadcast;

use crate::types::{now, Amount, Identity, QuestionId};

/// Activity log capacity, oldest entries are dropped first
pub const MAX_LOG_ENTRIES: usize = 1000;

/// Buffer of the live broadcast channel
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketEvent {
    TrustedSourceAdded {
        source: Identity,
    },
    QuestionAdded {
        question_id: QuestionId,
        text: String,
    },
    NewBet {
        bettor: Identity,
        question_id: QuestionId,
        side: bool,
        amount: Amount,
    },
    UpdatedQuestionData {
        question_id: QuestionId,
        positive_bet_count: u64,
        negative_bet_count: u64,
        positive_stake_total: Amount,
        negative_stake_total: Amount,
    },
    QuestionResolved {
        question_id: QuestionId,
        outcome: bool,
        resolver: Identity,
    },
    FundsClaimed {
        bettor: Identity,
        question_id: QuestionId,
        payout: Amount,
    },
    RunningChanged {
        running: bool,
    },
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::TrustedSourceAdded { .. } => "TRUSTED_SOURCE_ADDED",
            MarketEvent::QuestionAdded { .. } => "QUESTION_ADDED",
            MarketEvent::NewBet { .. } => "NEW_BET",
            MarketEvent::UpdatedQuestionData { .. } => "UPDATED_QUESTION_DATA",
            MarketEvent::QuestionResolved { .. } => "QUESTION_RESOLVED",
            MarketEvent::FundsClaimed { .. } => "FUNDS_CLAIMED",
            MarketEvent::RunningChanged { .. } => "RUNNING_CHANGED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: i64,
    pub event: MarketEvent,
}

#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<EventRecord>,
    next_seq: u64,
    sender: broadcast::Sender<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Resume numbering after a restore
    pub fn starting_at(next_seq: u64) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            entries: VecDeque::new(),
            next_seq,
            sender,
        }
    }

    pub fn emit(&mut self, event: MarketEvent) -> &EventRecord {
        let record = EventRecord {
            seq: self.next_seq,
            timestamp: now(),
            event,
        };
        self.next_seq += 1;

        tracing::debug!(seq = record.seq, event = record.event.name(), "market event");
        let _ = self.sender.send(record.clone());

        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
        // just pushed, never empty
        &self.entries[self.entries.len() - 1]
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.entries.iter()
    }

    /// Most recent entries first
    pub fn recent(&self, limit: usize) -> Vec<EventRecord> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
