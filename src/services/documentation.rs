use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Rally Score Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::display_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::matches::current_match,
        crate::routes::matches::start_match,
        crate::routes::matches::score_point,
        crate::routes::matches::undo,
        crate::routes::matches::swap_courts,
        crate::routes::matches::reset_set,
        crate::routes::matches::end_match,
        crate::routes::history::list_history,
        crate::routes::history::clear_history,
        crate::routes::history::update_memo,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::ScoreboardSnapshot,
            crate::dto::common::MatchSnapshot,
            crate::dto::common::PlayerSlot,
            crate::dto::common::ServeSnapshot,
            crate::dto::matches::StartMatchRequest,
            crate::dto::matches::PointRequest,
            crate::dto::matches::CommandResponse,
            crate::dto::history::HistoryEntry,
            crate::dto::history::UpdateMemoRequest,
            crate::dto::ws::ClickerInboundMessage,
            crate::dto::ws::ClickerAck,
            crate::dto::ws::ClickerFeedback,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::NarrationEvent,
            crate::dto::sse::RecordingAction,
            crate::dto::sse::RecordingEvent,
            crate::dto::sse::MatchSummaryEvent,
            crate::state::game::Side,
            crate::state::game::Sport,
            crate::state::game::MatchType,
            crate::state::serve::ServeSide,
            crate::state::set_tracker::SetState,
            crate::state::state_machine::MatchPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "match", description = "Scoreboard commands"),
        (name = "history", description = "Completed set history"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "clickers", description = "WebSocket operations for remote clickers"),
    )
)]
/// Entry point for the generated OpenAPI document.
pub struct ApiDoc;
