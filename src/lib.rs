/// Trusted-Oracle Prediction Market
/// Binary questions, one stake per bettor, single-resolver settlement,
/// pro-rata payouts from an escrowed pool.
/// Exports all modules for use as a library crate

pub mod access;
pub mod app_state;
pub mod bets;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod market;
pub mod payout;
pub mod questions;
pub mod resolution;
pub mod routes;
pub mod treasury;
pub mod types;

pub use access::AccessRegistry;
pub use app_state::{AppState, SharedState};
pub use bets::{Bet, BetBook};
pub use config::MarketConfig;
pub use errors::{MarketError, MarketResult, TransferError};
pub use events::{EventLog, EventRecord, MarketEvent, MAX_LOG_ENTRIES};
pub use market::{MarketSnapshot, PredictionMarket, SharedMarket, Solvency};
pub use payout::{calculate_payout, ClaimReceipt};
pub use questions::{Question, QuestionLedger, QuestionStatus, SidePool};
pub use routes::router;
pub use treasury::{Escrow, Treasury};
pub use types::{Amount, BetView, Identity, QuestionId, QuestionView, Side, ETHER};
