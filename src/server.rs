//! HTTP API server: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the render thread
//! runs on a plain `std::thread`. Handlers merge feeder updates into the
//! shared [`GameStore`] and then tell the render thread what changed via
//! `std::sync::mpsc`; they never draw.
//!
//! ## Rust concepts
//! - axum extractors: `State`, `Path`, `Query`, `Json`
//! - `Arc` for sharing state across async tasks
//! - `#[serde(untagged)]` for a response that is either an object or a string
//! - `tower-http` middleware for CORS and request tracing

use crate::game::{GamePatch, GameRecord, GamecastRecord};
use crate::mode::{Mode, ModeController};
use crate::render::{DisplayStatus, RenderCommand};
use crate::store::GameStore;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send redraw requests to the render thread
    pub command_tx: Sender<RenderCommand>,
    /// Game slots and the gamecast record
    pub store: Arc<GameStore>,
    /// Current and pending display mode
    pub modes: Arc<Mutex<ModeController>>,
    /// Shared display status (render thread writes, handlers read)
    pub status: Arc<Mutex<DisplayStatus>>,
}

impl AppState {
    fn send(&self, command: RenderCommand) -> Result<(), (StatusCode, String)> {
        self.command_tx.send(command).map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Render thread gone".to_string(),
            )
        })
    }
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_games,
        get_reset,
        get_settings,
        post_game,
        post_gamecast,
        get_status,
    ),
    components(schemas(
        GameRecord,
        GamecastRecord,
        DisplayStatus,
        Mode,
        MessageResponse,
        SettingsResponse,
        SettingsMessage,
        CurrentSettings,
        GameUpdateResponse,
        GamecastUpdateResponse,
    )),
    tags(
        (name = "games", description = "Game data pushed by the feeder"),
        (name = "display", description = "Display settings"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "On Deck API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for feeding games to an LED matrix scoreboard"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingsQuery {
    /// Mode to switch to after the current page cycle
    #[param(example = "detailed")]
    mode: Option<String>,
    /// Game slot mirrored by the gamecast panel
    #[param(example = "3")]
    id: Option<String>,
    /// Brightness level (0-100)
    #[param(example = "75")]
    brightness: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Games reset")]
    message: String,
}

#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CurrentSettings {
    mode: Mode,
    new_mode: Mode,
    brightness: u8,
}

/// Either the settings now in effect or why the request was rejected.
#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum SettingsMessage {
    Settings(CurrentSettings),
    Rejected(String),
}

#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SettingsResponse {
    message: SettingsMessage,
}

impl SettingsResponse {
    fn rejected(message: String) -> Json<Self> {
        tracing::warn!("Settings rejected: {}", message);
        Json(Self {
            message: SettingsMessage::Rejected(message),
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GameUpdateResponse {
    /// The body as received
    #[schema(value_type = Object)]
    new_data: Value,
    /// The slot after merging
    game: GameRecord,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GamecastUpdateResponse {
    /// The body as received
    #[schema(value_type = Object)]
    new_data: Value,
    /// The gamecast record after merging
    game: GamecastRecord,
}

/// Parse a feeder body into a typed patch. Keys with the wrong JSON type
/// reject the whole body.
fn parse_patch(body: &Value) -> Result<GamePatch, (StatusCode, String)> {
    serde_json::from_value(body.clone()).map_err(|e| {
        tracing::warn!("Rejected update: {}", e);
        (StatusCode::BAD_REQUEST, format!("Invalid game data: {e}"))
    })
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/", get(get_games))
        .route("/reset", get(get_reset))
        .route("/settings", get(get_settings))
        .route("/status", get(get_status))
        .route("/gamecast", post(post_gamecast))
        .route("/{index}", post(post_game))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /: every game slot, visible or not
#[utoipa::path(
    get,
    path = "/",
    tag = "games",
    responses(
        (status = 200, description = "All game slots in index order", body = Vec<GameRecord>)
    )
)]
async fn get_games(State(state): State<AppState>) -> Json<Vec<GameRecord>> {
    Json(state.store.snapshot())
}

/// GET /reset: hide every game and blank the display
#[utoipa::path(
    get,
    path = "/reset",
    tag = "games",
    responses(
        (status = 200, description = "Games reset", body = MessageResponse)
    )
)]
async fn get_reset(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state.store.reset_all();
    state.send(RenderCommand::Reset)?;

    Ok(Json(MessageResponse {
        message: "Games reset".to_string(),
    }))
}

/// GET /settings: query or change mode, gamecast game and brightness
///
/// Rejected values are reported in `message` with a 200 status, and
/// nothing after the rejected parameter is applied.
#[utoipa::path(
    get,
    path = "/settings",
    tag = "display",
    params(SettingsQuery),
    responses(
        (status = 200, description = "Settings in effect, or why they were rejected", body = SettingsResponse)
    )
)]
async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> Result<Json<SettingsResponse>, (StatusCode, String)> {
    if let Err(e) = state.modes.lock().request_mode(query.mode.as_deref()) {
        return Ok(SettingsResponse::rejected(e.to_string()));
    }

    if let Some(id) = &query.id {
        let pinned = id
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| state.store.pin_gamecast(index).ok());
        if pinned.is_none() {
            return Ok(SettingsResponse::rejected(
                "Game ID not recognized".to_string(),
            ));
        }
    }

    let mut brightness = state.status.lock().brightness;
    if let Some(value) = &query.brightness {
        match value.trim().parse::<u8>() {
            Ok(value) if value <= 100 => {
                state.send(RenderCommand::SetBrightness(value))?;
                brightness = value;
            }
            _ => {
                return Ok(SettingsResponse::rejected(format!(
                    "Brightness {value} not recognized"
                )));
            }
        }
    }

    let modes = *state.modes.lock();
    Ok(Json(SettingsResponse {
        message: SettingsMessage::Settings(CurrentSettings {
            mode: modes.current(),
            new_mode: modes.pending(),
            brightness,
        }),
    }))
}

/// POST /{index}: merge a partial update into one game slot
#[utoipa::path(
    post,
    path = "/{index}",
    tag = "games",
    params(("index" = usize, Path, description = "Game slot")),
    request_body(content = GameRecord, description = "Any subset of the game record"),
    responses(
        (status = 200, description = "Update merged", body = GameUpdateResponse),
        (status = 400, description = "A field has the wrong type"),
        (status = 404, description = "No such slot")
    )
)]
async fn post_game(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(body): Json<Value>,
) -> Result<Json<GameUpdateResponse>, (StatusCode, String)> {
    let patch = parse_patch(&body)?;

    let game = state
        .store
        .merge_update(index, patch)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;

    state.send(RenderCommand::GameUpdated(index))?;

    Ok(Json(GameUpdateResponse {
        new_data: body,
        game,
    }))
}

/// POST /gamecast: merge a partial update into the gamecast record
#[utoipa::path(
    post,
    path = "/gamecast",
    tag = "games",
    request_body(content = GameRecord, description = "Any subset of the game record"),
    responses(
        (status = 200, description = "Update merged", body = GamecastUpdateResponse),
        (status = 400, description = "A field has the wrong type")
    )
)]
async fn post_gamecast(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GamecastUpdateResponse>, (StatusCode, String)> {
    let patch = parse_patch(&body)?;
    let game = state.store.merge_gamecast_update(patch);

    state.send(RenderCommand::GamecastUpdated)?;

    Ok(Json(GamecastUpdateResponse {
        new_data: body,
        game,
    }))
}

/// GET /status: current display state
#[utoipa::path(
    get,
    path = "/status",
    tag = "system",
    responses(
        (status = 200, description = "Current display status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let mut status = state.status.lock().clone();
    // Mode requests land between render ticks
    status.pending_mode = state.modes.lock().pending();
    Json(status)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::mpsc::{self, Receiver};

    fn state() -> (AppState, Receiver<RenderCommand>) {
        let (command_tx, rx) = mpsc::channel();
        let state = AppState {
            command_tx,
            store: Arc::new(GameStore::new(20)),
            modes: Arc::new(Mutex::new(ModeController::new(Mode::Basic))),
            status: Arc::new(Mutex::new(DisplayStatus::new(Mode::Basic, 80))),
        };
        (state, rx)
    }

    fn query(mode: Option<&str>, id: Option<&str>, brightness: Option<&str>) -> Query<SettingsQuery> {
        Query(SettingsQuery {
            mode: mode.map(str::to_string),
            id: id.map(str::to_string),
            brightness: brightness.map(str::to_string),
        })
    }

    async fn settings(state: &AppState, q: Query<SettingsQuery>) -> Value {
        let Json(response) = get_settings(State(state.clone()), q).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn post_merges_and_requests_redraw() {
        let (state, rx) = state();
        let body = json!({"away": {"abv": "TEX", "runs": 2}, "inning": 5});

        let Json(response) = post_game(State(state.clone()), Path(3), Json(body.clone()))
            .await
            .unwrap();

        assert_eq!(response.new_data, body);
        assert_eq!(response.game.away.abv.as_deref(), Some("TEX"));
        assert!(response.game.visible);
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::GameUpdated(3));

        // A second update keeps the first one's fields
        let Json(response) = post_game(
            State(state.clone()),
            Path(3),
            Json(json!({"away": {"runs": 3}})),
        )
        .await
        .unwrap();
        assert_eq!(response.game.away.abv.as_deref(), Some("TEX"));
        assert_eq!(response.game.away.runs, Some(3));
        assert_eq!(response.game.inning, Some(5));
    }

    #[tokio::test]
    async fn post_out_of_range_is_not_found() {
        let (state, rx) = state();
        let err = post_game(State(state.clone()), Path(20), Json(json!({"inning": 1})))
            .await
            .unwrap_err();

        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(state.store.count_visible(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn post_with_wrong_type_is_rejected_without_writing() {
        let (state, _rx) = state();
        let err = post_game(State(state.clone()), Path(0), Json(json!({"inning": "ninth"})))
            .await
            .unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(state.store.count_visible(), 0);
    }

    #[tokio::test]
    async fn post_gamecast_merges_and_requests_redraw() {
        let (state, rx) = state();
        let Json(response) = post_gamecast(
            State(state.clone()),
            Json(json!({"umpire": {"num_missed": 2}})),
        )
        .await
        .unwrap();

        assert!(response.game.game.visible);
        assert_eq!(response.game.game.umpire.num_missed, Some(2));
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::GamecastUpdated);
    }

    #[tokio::test]
    async fn reset_hides_games_and_notifies_render_thread() {
        let (state, rx) = state();
        state.store.merge_update(1, GamePatch::default()).unwrap();

        let Json(response) = get_reset(State(state.clone())).await.unwrap();

        assert_eq!(response.message, "Games reset");
        assert_eq!(state.store.count_visible(), 0);
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::Reset);
    }

    #[tokio::test]
    async fn settings_without_parameters_reports_modes() {
        let (state, _rx) = state();
        assert_eq!(
            settings(&state, query(None, None, None)).await,
            json!({"message": {"mode": "basic", "new_mode": "basic", "brightness": 80}})
        );
    }

    #[tokio::test]
    async fn settings_queues_mode_change() {
        let (state, _rx) = state();
        assert_eq!(
            settings(&state, query(Some("detailed"), None, None)).await,
            json!({"message": {"mode": "basic", "new_mode": "detailed", "brightness": 80}})
        );
        assert_eq!(state.modes.lock().current(), Mode::Basic);
    }

    #[tokio::test]
    async fn settings_rejects_unknown_mode() {
        let (state, _rx) = state();
        state.modes.lock().request_mode(Some("dual")).unwrap();

        assert_eq!(
            settings(&state, query(Some("bogus"), None, None)).await,
            json!({"message": "Mode bogus not recognized"})
        );
        assert_eq!(state.modes.lock().pending(), Mode::Dual);
    }

    #[tokio::test]
    async fn settings_pins_gamecast() {
        let (state, _rx) = state();
        settings(&state, query(None, Some("4"), None)).await;
        assert_eq!(state.store.gamecast().pinned_index, Some(4));

        assert_eq!(
            settings(&state, query(None, Some("four"), None)).await,
            json!({"message": "Game ID not recognized"})
        );
        assert_eq!(
            settings(&state, query(None, Some("99"), None)).await,
            json!({"message": "Game ID not recognized"})
        );
        assert_eq!(state.store.gamecast().pinned_index, Some(4));
    }

    #[tokio::test]
    async fn settings_sets_brightness() {
        let (state, rx) = state();
        let response = settings(&state, query(None, None, Some("40"))).await;

        assert_eq!(response["message"]["brightness"], json!(40));
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::SetBrightness(40));

        assert_eq!(
            settings(&state, query(None, None, Some("101"))).await,
            json!({"message": "Brightness 101 not recognized"})
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn status_reports_pending_mode() {
        let (state, _rx) = state();
        state.modes.lock().request_mode(Some("gamecast")).unwrap();

        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.mode, Mode::Basic);
        assert_eq!(status.pending_mode, Mode::Gamecast);
        assert_eq!(status.brightness, 80);
    }

    #[tokio::test]
    async fn games_snapshot_lists_every_slot() {
        let (state, _rx) = state();
        state.store.merge_update(2, GamePatch::default()).unwrap();

        let Json(games) = get_games(State(state)).await;
        assert_eq!(games.len(), 20);
        assert!(games[2].visible);
    }

    #[tokio::test]
    async fn dropped_render_thread_is_a_server_error() {
        let (state, rx) = state();
        drop(rx);

        let err = post_game(State(state), Path(0), Json(json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for path in ["/", "/reset", "/settings", "/{index}", "/gamecast", "/status"] {
            assert!(paths.iter().any(|p| p == path), "missing {path}");
        }
    }
}
