use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::history::{HistoryEntry, UpdateMemoRequest},
    error::AppError,
    services::history_service,
    state::SharedState,
};

/// History endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/history", get(list_history).delete(clear_history))
        .route("/history/{id}/memo", put(update_memo))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    responses(
        (status = 200, description = "Completed sets, oldest first", body = [HistoryEntry]),
        (status = 503, description = "History unavailable")
    )
)]
/// List completed sets.
pub async fn list_history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(history_service::list_history(&state).await?))
}

#[utoipa::path(
    delete,
    path = "/history",
    tag = "history",
    responses(
        (status = 204, description = "History cleared"),
        (status = 503, description = "History unavailable")
    )
)]
/// Delete the whole history.
pub async fn clear_history(State(state): State<SharedState>) -> Result<StatusCode, AppError> {
    history_service::clear_history(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/history/{id}/memo",
    tag = "history",
    params(("id" = Uuid, Path, description = "History entry identifier")),
    request_body = UpdateMemoRequest,
    responses(
        (status = 200, description = "Memo updated", body = HistoryEntry),
        (status = 404, description = "Unknown entry")
    )
)]
/// Edit the memo of one entry.
pub async fn update_memo(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateMemoRequest>>,
) -> Result<Json<HistoryEntry>, AppError> {
    Ok(Json(history_service::update_memo(&state, id, payload).await?))
}
