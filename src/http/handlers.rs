//! Request handlers for the echo service.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::correlation::{Correlation, CorrelationHeaders};
use crate::http::server::AppState;

/// Describe a correlation set as JSON.
pub fn describe(headers: &CorrelationHeaders) -> Value {
    let entries: Map<String, Value> = headers
        .iter()
        .map(|(name, values)| (name.to_string(), json!(values)))
        .collect();
    let required: Vec<&str> = headers
        .required_names()
        .iter()
        .map(|name| name.as_str())
        .collect();

    json!({
        "primary_id": headers.primary_id(),
        "headers": entries,
        "required": required,
    })
}

/// `GET /`: report the correlation state seen by this request.
pub async fn echo(Correlation(headers): Correlation) -> Json<Value> {
    Json(describe(&headers))
}

/// `GET /downstream`: call the configured downstream with the required headers.
pub async fn downstream(State(state): State<AppState>, correlation: Correlation) -> Response {
    let Some(client) = state.downstream.as_ref() else {
        return (StatusCode::NOT_FOUND, "No downstream configured").into_response();
    };

    match client.forward(&correlation.required_headers()).await {
        Ok((status, body)) => (status, body).into_response(),
        Err(e) => {
            tracing::error!(
                correlation_id = correlation.primary_id().unwrap_or("none"),
                url = %client.url(),
                error = %e,
                "Downstream error"
            );
            (StatusCode::BAD_GATEWAY, "Downstream request failed").into_response()
        }
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
