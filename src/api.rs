//! REST API for the layout service.
//!
//! Provides HTTP endpoints for the presentation layer: layout snapshots, panel
//! controls, pointer events, selection edits and a per-frame SSE stream.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::controls::{ControlChange, ControlPanel, ControlRange};
use crate::fleet::UnitEdit;
use crate::geometry::Ray;
use crate::interaction::{EditSurface, EditSurfaceRequest};
use crate::model::{UnitId, ValidationError};
use crate::session::{InteractionResponse, PointerTarget, SessionError, SessionHandle};
use crate::snapshot::{LayoutSnapshot, RenderedUnit};
use crate::types::Color;

#[derive(Clone)]
struct ApiState {
    session: SessionHandle,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pallet_layout API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Pointer event from the presentation layer.
///
/// Either `hit` (already resolved by the renderer) or `ray` (resolved here against
/// the placed units). A given `hit` takes precedence; neither means a miss.
#[derive(Deserialize, Clone, Debug, Default, ToSchema)]
#[schema(
    example = json!({
        "ray": { "origin": [-5.0, 5.0, 6.8], "direction": [0.7, -0.7, 0.0] },
        "inside_edit_surface": false
    })
)]
pub struct PointerRequest {
    #[serde(default)]
    #[schema(nullable = true)]
    pub hit: Option<UnitId>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub ray: Option<Ray>,
    /// Only meaningful for pointer-down events.
    #[serde(default)]
    pub inside_edit_surface: bool,
}

impl PointerRequest {
    fn target(&self) -> PointerTarget {
        match (self.hit, self.ray) {
            (Some(id), _) => PointerTarget::Hit(Some(id)),
            (None, Some(ray)) => PointerTarget::Ray(ray),
            (None, None) => PointerTarget::Hit(None),
        }
    }
}

/// Edit of the selected unit; absent fields stay unchanged.
#[derive(Deserialize, Clone, Debug, Default, ToSchema)]
#[schema(example = json!({ "width": 1.0, "color": "#5fd1fa" }))]
pub struct EditRequest {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    /// `#rrggbb`
    #[serde(default)]
    pub color: Option<String>,
}

impl EditRequest {
    fn into_edit(self) -> Result<UnitEdit, ValidationError> {
        let color = self
            .color
            .map(|raw| Color::from_hex(&raw).ok_or(ValidationError::InvalidColor(raw)))
            .transpose()?;
        Ok(UnitEdit {
            width: self.width,
            length: self.length,
            color,
        })
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn session_error(err: SessionError) -> Response {
    match err {
        SessionError::Validation(err) => validation_error(err.to_string()),
        SessionError::Stopped => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Layout session unavailable",
            SessionError::Stopped.to_string(),
        ),
    }
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(value)| value)
        .map_err(json_deserialize_error)
}

fn respond<T: Serialize>(result: Result<T, SessionError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => session_error(err),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_layout,
        handle_controls,
        handle_pointer_move,
        handle_pointer_down,
        handle_selection_edit,
        handle_layout_stream
    ),
    components(
        schemas(
            LayoutSnapshot,
            RenderedUnit,
            ControlChange,
            ControlPanel,
            ControlRange,
            PointerRequest,
            Ray,
            EditRequest,
            InteractionResponse,
            EditSurface,
            EditSurfaceRequest,
            UnitId,
            ErrorResponse
        )
    ),
    tags(
        (name = "layout", description = "Trailer layout and panel controls"),
        (name = "interaction", description = "Pointer events and selection edits")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints for the given session.
fn router(session: SessionHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/layout", get(handle_layout))
        .route("/controls", post(handle_controls))
        .route("/pointer/move", post(handle_pointer_move))
        .route("/pointer/down", post(handle_pointer_down))
        .route("/selection/edit", post(handle_selection_edit))
        .route("/layout_stream", get(handle_layout_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { session })
}

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the presentation layer.
/// Runs until the server is terminated.
pub async fn start_api_server(config: ApiConfig, session: SessionHandle) -> std::io::Result<()> {
    let app = router(session);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        tracing::error!("❌ Could not bind API server to {}: {}", addr, err);
        err
    })?;

    let display_host = config.display_host().to_string();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API Endpoints:");
    tracing::info!("   - GET /layout");
    tracing::info!("   - GET /layout_stream");
    tracing::info!("   - POST /controls");
    tracing::info!("   - POST /pointer/move");
    tracing::info!("   - POST /pointer/down");
    tracing::info!("   - POST /selection/edit");
    tracing::info!("📑 Documentation:");
    tracing::info!("   - GET /docs");
    tracing::info!("   - GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for GET /layout endpoint.
///
/// Returns the current layout with the placed units as drawn.
#[utoipa::path(
    get,
    path = "/layout",
    responses(
        (status = 200, description = "Current layout", body = LayoutSnapshot),
        (status = SERVICE_UNAVAILABLE, description = "Session stopped", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn handle_layout(State(state): State<ApiState>) -> Response {
    respond(state.session.snapshot().await)
}

/// Handler for POST /controls endpoint.
///
/// Applies one panel change (unit count, uniform dimension or bulk toggle). Values
/// are clamped to the ranges the panel advertises.
#[utoipa::path(
    post,
    path = "/controls",
    request_body = ControlChange,
    responses(
        (status = 200, description = "Layout after the change", body = LayoutSnapshot),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid control value", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Session stopped", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn handle_controls(
    State(state): State<ApiState>,
    payload: Result<Json<ControlChange>, JsonRejection>,
) -> Response {
    let change = match parse_json(payload) {
        Ok(change) => change,
        Err(response) => return response,
    };
    tracing::info!("🎛️ Control change: {:?}", change);
    respond(state.session.apply_control(change).await)
}

/// Handler for POST /pointer/move endpoint.
#[utoipa::path(
    post,
    path = "/pointer/move",
    request_body = PointerRequest,
    responses(
        (status = 200, description = "Hover state after the move", body = InteractionResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed pointer event", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Session stopped", body = ErrorResponse)
    ),
    tag = "interaction"
)]
async fn handle_pointer_move(
    State(state): State<ApiState>,
    payload: Result<Json<PointerRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(state.session.pointer_move(request.target()).await)
}

/// Handler for POST /pointer/down endpoint.
///
/// Selects the unit under the pointer and reports whether the edit surface should
/// open, stay or close.
#[utoipa::path(
    post,
    path = "/pointer/down",
    request_body = PointerRequest,
    responses(
        (status = 200, description = "Selection state and edit surface request", body = InteractionResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed pointer event", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Session stopped", body = ErrorResponse)
    ),
    tag = "interaction"
)]
async fn handle_pointer_down(
    State(state): State<ApiState>,
    payload: Result<Json<PointerRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(
        state
            .session
            .pointer_down(request.target(), request.inside_edit_surface)
            .await,
    )
}

/// Handler for POST /selection/edit endpoint.
#[utoipa::path(
    post,
    path = "/selection/edit",
    request_body = EditRequest,
    responses(
        (status = 200, description = "Selected unit edited and fleet repacked", body = InteractionResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid edit or nothing selected",
            body = ErrorResponse
        ),
        (status = SERVICE_UNAVAILABLE, description = "Session stopped", body = ErrorResponse)
    ),
    tag = "interaction"
)]
async fn handle_selection_edit(
    State(state): State<ApiState>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> Response {
    let edit = match parse_json(payload).and_then(|request| {
        request
            .into_edit()
            .map_err(|err| validation_error(err.to_string()))
    }) {
        Ok(edit) => edit,
        Err(response) => return response,
    };
    respond(state.session.edit_selected(edit).await)
}

/// Handler for GET /layout_stream endpoint (SSE).
///
/// Streams one layout snapshot per frame as Server-Sent Events (text/event-stream),
/// so the renderer can follow the smoothed colors and lifts.
#[utoipa::path(
    get,
    path = "/layout_stream",
    responses(
        (
            status = 200,
            description = "Streams layout snapshots per frame",
            content_type = "text/event-stream",
            body = String
        )
    ),
    tag = "layout"
)]
async fn handle_layout_stream(State(state): State<ApiState>) -> Response {
    // lagged frames surface as errors in the stream and are skipped
    let stream = BroadcastStream::new(state.session.subscribe()).filter_map(|frame| {
        let json = serde_json::to_string(&frame.ok()?).ok()?;
        Some(Ok::<_, std::convert::Infallible>(Event::default().data(json)))
    });
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
