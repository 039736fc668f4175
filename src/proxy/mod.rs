//! HTTP surface of the proxy: one POST endpoint taking an `{action, payload}`
//! envelope, plus a health check.

use crate::app::App;
use crate::models::{actions, ErrorBody, GreetingRequest, ImageRequest, ProxyRequest};
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const PROXY_PATH: &str = "/api/gemini-proxy";

const CONTENT_POLICY_MESSAGE: &str =
    "The request was rejected by the AI provider's content safety policy. \
     Please rephrase the message and try again.";

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route(PROXY_PATH, post(handle_proxy).fallback(method_not_allowed))
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}

async fn handle_proxy(State(app): State<Arc<App>>, body: Bytes) -> Result<Response> {
    let request: ProxyRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::Validation(format!("Request body must be a JSON object: {}", e)))?;

    let (Some(action), Some(payload)) = (request.action, request.payload) else {
        return Err(Error::Validation("Missing action or payload".to_string()));
    };

    tracing::debug!("Proxy action: {}", action);

    match action.as_str() {
        actions::GET_SUGGESTIONS => {
            let request: GreetingRequest = parse_payload(payload)?;
            let suggestions = app.get_suggestions(&request).await?;
            Ok(Json(suggestions).into_response())
        }
        actions::GENERATE_IMAGE => {
            let request: ImageRequest = parse_payload(payload)?;
            let image = app.generate_image(&request).await?;
            Ok(Json(image).into_response())
        }
        other => Err(Error::UnknownAction(other.to_string())),
    }
}

fn parse_payload<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| Error::Validation(format!("Invalid payload: {}", e)))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorBody {
            error: "Method not allowed".to_string(),
        }),
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let err = self.classify();

        let (status, message) = match &err {
            Error::Validation(_) | Error::UnknownAction(_) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Error::ContentPolicy(_) => {
                (StatusCode::BAD_REQUEST, CONTENT_POLICY_MESSAGE.to_string())
            }
            Error::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process request: {}", err),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Proxy request failed ({}): {}", status, err);
        } else {
            tracing::warn!("Proxy request rejected ({}): {}", status, err);
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
