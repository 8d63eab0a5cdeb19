// HTTP request handlers for the prediction market API
//
// The caller identity is taken from the `from` field of each write request.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;

use crate::app_state::{AppState, SharedState};
use crate::errors::MarketError;
use crate::events::EventRecord;
use crate::market::Solvency;
use crate::payout::ClaimReceipt;
use crate::types::{Amount, BetView, Identity, QuestionId, QuestionView, Side};

// ===== REQUEST/RESPONSE TYPES =====

#[derive(Debug, Deserialize)]
pub struct AddTrustedSourceRequest {
    pub from: Identity,
    pub source: Identity,
}

#[derive(Debug, Deserialize)]
pub struct AddQuestionRequest {
    pub from: Identity,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct BetRequest {
    pub from: Identity,
    /// true = yes, false = no
    pub bet: bool,
    /// Stake deposited with the bet
    pub amount: Amount,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub from: Identity,
    pub outcome: bool,
}

#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    pub from: Identity,
}

#[derive(Debug, Deserialize)]
pub struct RunSwitchRequest {
    pub from: Identity,
    pub running: bool,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub admin: Identity,
}

#[derive(Debug, Serialize)]
pub struct TrustedSourceResponse {
    pub identity: Identity,
    pub trusted: bool,
}

#[derive(Debug, Serialize)]
pub struct AddQuestionResponse {
    pub success: bool,
    pub question_id: QuestionId,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub struct BetResponse {
    #[serde(flatten)]
    pub bet: BetView,
    /// What claiming now would pay, if the bet has won and is unclaimed
    pub pending_payout: Option<Amount>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: ClaimReceipt,
}

#[derive(Debug, Serialize)]
pub struct RunningResponse {
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Serialize)]
pub struct EscrowResponse {
    pub pool_balance: Amount,
    pub outstanding_liability: Amount,
    pub solvent: bool,
    pub total_deposited: Amount,
    pub total_paid_out: Amount,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

const DEFAULT_EVENT_LIMIT: usize = 100;

// ===== ERROR MAPPING =====

pub fn status_for(err: &MarketError) -> StatusCode {
    match err {
        MarketError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        MarketError::QuestionNotFound(_)
        | MarketError::BetNotFound { .. }
        | MarketError::NoBet { .. } => StatusCode::NOT_FOUND,
        MarketError::InvalidAmount | MarketError::Overflow => StatusCode::BAD_REQUEST,
        MarketError::DuplicateBet { .. }
        | MarketError::AlreadyResolved(_)
        | MarketError::NotResolved(_)
        | MarketError::AlreadyClaimed { .. }
        | MarketError::LostBet { .. }
        | MarketError::NoWinningPool(_)
        | MarketError::BettingClosed { .. } => StatusCode::CONFLICT,
        MarketError::TransferFailed(_) => StatusCode::BAD_GATEWAY,
        MarketError::MarketStopped => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn market_error(err: MarketError) -> ApiError {
    (
        status_for(&err),
        Json(ErrorBody {
            success: false,
            code: err.code(),
            error: err.to_string(),
        }),
    )
}

fn bad_request(code: &'static str, error: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            success: false,
            code,
            error,
        }),
    )
}

/// Unwrap a path extraction, rendering failures as an `ErrorBody`
fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| bad_request("invalid_path", rejection.body_text()))
}

/// Unwrap a JSON body extraction, rendering failures as an `ErrorBody`
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| bad_request("invalid_body", rejection.body_text()))
}

fn lock(state: &SharedState) -> Result<MutexGuard<'_, AppState>, ApiError> {
    state.lock().map_err(|_| {
        tracing::error!("market state lock poisoned");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                success: false,
                code: "internal",
                error: "Market state unavailable".to_string(),
            }),
        )
    })
}

// ===== READ ENDPOINTS =====

pub async fn health_check() -> &'static str {
    "Trusted-oracle prediction market - online"
}

pub async fn get_admin(State(state): State<SharedState>) -> ApiResult<AdminResponse> {
    let app_state = lock(&state)?;
    Ok(Json(AdminResponse {
        admin: app_state.market.admin().clone(),
    }))
}

pub async fn get_trusted_source(
    State(state): State<SharedState>,
    Path(identity): Path<String>,
) -> ApiResult<TrustedSourceResponse> {
    let app_state = lock(&state)?;
    let identity = Identity::from(identity);
    Ok(Json(TrustedSourceResponse {
        trusted: app_state.market.is_trusted_source(&identity),
        identity,
    }))
}

pub async fn get_questions(State(state): State<SharedState>) -> ApiResult<QuestionsResponse> {
    let app_state = lock(&state)?;
    Ok(Json(QuestionsResponse {
        questions: app_state.market.questions(),
    }))
}

pub async fn get_question(
    State(state): State<SharedState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<QuestionView> {
    let id = path_param(id)?;
    let app_state = lock(&state)?;
    app_state
        .market
        .get_question(QuestionId(id))
        .map(Json)
        .map_err(market_error)
}

pub async fn get_bet(
    State(state): State<SharedState>,
    path: Result<Path<(u64, String)>, PathRejection>,
) -> ApiResult<BetResponse> {
    let (id, bettor) = path_param(path)?;
    let app_state = lock(&state)?;
    let bettor = Identity::from(bettor);
    let question_id = QuestionId(id);
    let bet = app_state
        .market
        .get_bet(&bettor, question_id)
        .map_err(market_error)?;

    Ok(Json(BetResponse {
        pending_payout: app_state.market.pending_payout(&bettor, question_id),
        bet,
    }))
}

pub async fn get_events(
    State(state): State<SharedState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<EventsResponse> {
    let app_state = lock(&state)?;
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Ok(Json(EventsResponse {
        events: app_state.market.events().recent(limit),
    }))
}

pub async fn get_escrow(State(state): State<SharedState>) -> ApiResult<EscrowResponse> {
    let app_state = lock(&state)?;
    let Solvency {
        pool_balance,
        outstanding_liability,
    } = app_state.market.solvency().map_err(market_error)?;
    let escrow = app_state.market.treasury();

    Ok(Json(EscrowResponse {
        pool_balance,
        outstanding_liability,
        solvent: outstanding_liability <= pool_balance,
        total_deposited: escrow.total_deposited(),
        total_paid_out: escrow.total_paid_out(),
    }))
}

// ===== WRITE ENDPOINTS =====

pub async fn add_trusted_source(
    State(state): State<SharedState>,
    request: Result<Json<AddTrustedSourceRequest>, JsonRejection>,
) -> ApiResult<TrustedSourceResponse> {
    let request = json_body(request)?;
    let mut app_state = lock(&state)?;
    app_state
        .market
        .add_trusted_source(&request.from, request.source.clone())
        .map_err(market_error)?;

    Ok(Json(TrustedSourceResponse {
        identity: request.source,
        trusted: true,
    }))
}

pub async fn add_question(
    State(state): State<SharedState>,
    request: Result<Json<AddQuestionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddQuestionResponse>), ApiError> {
    let request = json_body(request)?;
    let mut app_state = lock(&state)?;
    let question_id = app_state
        .market
        .add_question(&request.from, request.question)
        .map_err(market_error)?;

    Ok((
        StatusCode::CREATED,
        Json(AddQuestionResponse {
            success: true,
            question_id,
        }),
    ))
}

pub async fn place_bet(
    State(state): State<SharedState>,
    id: Result<Path<u64>, PathRejection>,
    request: Result<Json<BetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BetView>), ApiError> {
    let id = path_param(id)?;
    let request = json_body(request)?;
    let mut app_state = lock(&state)?;
    let bet = app_state
        .market
        .bet(
            &request.from,
            QuestionId(id),
            Side::from_bool(request.bet),
            request.amount,
        )
        .map_err(market_error)?;

    Ok((StatusCode::CREATED, Json(bet)))
}

pub async fn resolve_question(
    State(state): State<SharedState>,
    id: Result<Path<u64>, PathRejection>,
    request: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<QuestionView> {
    let id = path_param(id)?;
    let request = json_body(request)?;
    let mut app_state = lock(&state)?;
    app_state
        .market
        .resolve_question(&request.from, QuestionId(id), Side::from_bool(request.outcome))
        .map(Json)
        .map_err(market_error)
}

pub async fn claim_funds(
    State(state): State<SharedState>,
    id: Result<Path<u64>, PathRejection>,
    request: Result<Json<CallerRequest>, JsonRejection>,
) -> ApiResult<ClaimResponse> {
    let id = path_param(id)?;
    let request = json_body(request)?;
    let mut app_state = lock(&state)?;
    let receipt = app_state
        .market
        .claim_funds(&request.from, QuestionId(id))
        .map_err(market_error)?;

    Ok(Json(ClaimResponse {
        success: true,
        receipt,
    }))
}

pub async fn run_switch(
    State(state): State<SharedState>,
    request: Result<Json<RunSwitchRequest>, JsonRejection>,
) -> ApiResult<RunningResponse> {
    let request = json_body(request)?;
    let mut app_state = lock(&state)?;
    let running = app_state
        .market
        .run_switch(&request.from, request.running)
        .map_err(market_error)?;

    Ok(Json(RunningResponse { running }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransferError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&MarketError::Unauthorized {
                caller: Identity::from("x"),
                action: "add a question"
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&MarketError::QuestionNotFound(QuestionId(1))), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&MarketError::InvalidAmount), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&MarketError::NotResolved(QuestionId(1))), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&MarketError::TransferFailed(TransferError::Frozen)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for(&MarketError::MarketStopped), StatusCode::SERVICE_UNAVAILABLE);
    }
}
