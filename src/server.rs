use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{RawQuery, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use serde_json::json;
use tokio::{
    net::TcpListener,
    signal::unix::{SignalKind, signal},
};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    dispatch::dispatcher::LaunchDispatcher,
    launch::{
        error::{LaunchError, LaunchErrorKind, not_found},
        types::{HttpMethod, LaunchRequest, RouteName, ViewPayload},
    },
};

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<LaunchDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<LaunchDispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// HTTP status for each launch failure kind.
pub fn status_for(kind: LaunchErrorKind) -> StatusCode {
    match kind {
        LaunchErrorKind::ProtocolViolation => StatusCode::BAD_REQUEST,
        LaunchErrorKind::NotFound => StatusCode::NOT_FOUND,
        LaunchErrorKind::UpstreamLookup => StatusCode::BAD_GATEWAY,
        LaunchErrorKind::Configuration
        | LaunchErrorKind::GuardEvaluation
        | LaunchErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for LaunchError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind);
        if self.is_client_error() {
            tracing::debug!(
                target: "server",
                status = status.as_u16(),
                kind = self.kind.as_str(),
                error = %self,
                "launch_request_rejected"
            );
        } else {
            tracing::error!(
                target: "server",
                status = status.as_u16(),
                kind = self.kind.as_str(),
                error = %self,
                "launch_request_failed"
            );
        }

        let body = json!({
            "error": {
                "kind": self.kind,
                "message": self.message,
            }
        });
        (status, Json(body)).into_response()
    }
}

pub fn router(dispatcher: Arc<LaunchDispatcher>) -> Router {
    Router::new()
        .route(RouteName::LtiLaunches.path(), any(lti_launches))
        .route(
            RouteName::ContentItemSelection.path(),
            any(content_item_selection),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(dispatcher))
}

pub async fn run(server_config: &ServerConfig, dispatcher: Arc<LaunchDispatcher>) -> Result<()> {
    let listener = TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("unable to bind {}", server_config.bind_addr))?;
    let local_addr = listener
        .local_addr()
        .context("unable to read bound address")?;

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;

    tracing::info!(
        target: "server",
        bind_addr = %local_addr,
        public_base_url = %server_config.public_base_url,
        "server_listening"
    );

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(async move {
            let signal_name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            tracing::info!(target: "server", signal = signal_name, "server_stopping");
        })
        .await
        .context("launch server terminated unexpectedly")?;

    tracing::info!(target: "server", "server_stopped");
    Ok(())
}

async fn lti_launches(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<ViewPayload>, LaunchError> {
    serve_launch(&state, RouteName::LtiLaunches, method, query, body).await
}

async fn content_item_selection(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<ViewPayload>, LaunchError> {
    serve_launch(&state, RouteName::ContentItemSelection, method, query, body).await
}

async fn serve_launch(
    state: &AppState,
    route: RouteName,
    method: Method,
    query: Option<String>,
    body: Bytes,
) -> Result<Json<ViewPayload>, LaunchError> {
    let method = match method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        other => {
            return Err(not_found(format!(
                "no launch view matches {other} {}",
                route.as_str()
            )));
        }
    };

    let request = LaunchRequest::new(method, route, launch_params(query.as_deref(), &body))?;
    let payload = state.dispatcher.dispatch(&request).await?;
    Ok(Json(payload))
}

/// Query string parameters overlaid by form-encoded body parameters.
fn launch_params(query: Option<&str>, body: &[u8]) -> BTreeMap<String, String> {
    let mut params: BTreeMap<String, String> = query
        .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    params.extend(url::form_urlencoded::parse(body).into_owned());
    params
}
