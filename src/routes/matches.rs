use axum::{Json, Router, extract::State, routing::{get, post}};
use axum_valid::Valid;

use crate::{
    dto::{
        common::ScoreboardSnapshot,
        matches::{CommandResponse, PointRequest, StartMatchRequest},
    },
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Scoreboard endpoints used by the display page and keyboard fallback.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/match", get(current_match))
        .route("/match/start", post(start_match))
        .route("/match/point", post(score_point))
        .route("/match/undo", post(undo))
        .route("/match/swap", post(swap_courts))
        .route("/match/reset-set", post(reset_set))
        .route("/match/end", post(end_match))
}

#[utoipa::path(
    get,
    path = "/match",
    tag = "match",
    responses((status = 200, description = "Current scoreboard", body = ScoreboardSnapshot))
)]
/// Current scoreboard.
pub async fn current_match(State(state): State<SharedState>) -> Json<ScoreboardSnapshot> {
    Json(match_service::snapshot(&state).await)
}

/// Start a match from idle.
#[utoipa::path(
    post,
    path = "/match/start",
    tag = "match",
    request_body = StartMatchRequest,
    responses(
        (status = 200, description = "Match started", body = ScoreboardSnapshot),
        (status = 400, description = "Invalid match settings"),
        (status = 409, description = "A match is already running")
    )
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartMatchRequest>>,
) -> Result<Json<ScoreboardSnapshot>, AppError> {
    Ok(Json(match_service::start_match(&state, payload).await?))
}

/// Credit one point.
#[utoipa::path(
    post,
    path = "/match/point",
    tag = "match",
    request_body = PointRequest,
    responses((status = 200, description = "Point processed", body = CommandResponse))
)]
pub async fn score_point(
    State(state): State<SharedState>,
    Json(payload): Json<PointRequest>,
) -> Json<CommandResponse> {
    Json(match_service::score_point(&state, payload.side).await)
}

/// Take back the last point of the current set.
#[utoipa::path(
    post,
    path = "/match/undo",
    tag = "match",
    responses((status = 200, description = "Undo processed", body = CommandResponse))
)]
pub async fn undo(State(state): State<SharedState>) -> Json<CommandResponse> {
    Json(match_service::undo(&state).await)
}

/// Players change ends.
#[utoipa::path(
    post,
    path = "/match/swap",
    tag = "match",
    responses((status = 200, description = "Court swap processed", body = CommandResponse))
)]
pub async fn swap_courts(State(state): State<SharedState>) -> Json<CommandResponse> {
    Json(match_service::swap_courts(&state).await)
}

/// Zero the current set.
#[utoipa::path(
    post,
    path = "/match/reset-set",
    tag = "match",
    responses((status = 200, description = "Set reset processed", body = CommandResponse))
)]
pub async fn reset_set(State(state): State<SharedState>) -> Json<CommandResponse> {
    Json(match_service::reset_set(&state).await)
}

/// Abandon the running match or leave the final screen.
#[utoipa::path(
    post,
    path = "/match/end",
    tag = "match",
    responses(
        (status = 200, description = "Scoreboard back to idle", body = ScoreboardSnapshot),
        (status = 409, description = "No match to end")
    )
)]
pub async fn end_match(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardSnapshot>, AppError> {
    Ok(Json(match_service::end_match(&state).await?))
}
