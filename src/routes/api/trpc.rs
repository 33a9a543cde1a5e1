use crate::rpc::{create_context, RpcError};
use crate::state::SharedState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::Instrument;

#[derive(Debug, Deserialize)]
pub(super) struct TrpcQuery {
    input: Option<String>,
}

pub(super) async fn get(
    State(state): SharedState,
    headers: HeaderMap,
    Path(path): Path<String>,
    Query(query): Query<TrpcQuery>,
) -> Response {
    let input = match query.input.as_deref().map(|raw| serde_json::from_str::<Value>(raw)) {
        None => Value::Null,
        Some(Ok(it)) => it,
        Some(Err(err)) => {
            return error_response(&path, &RpcError::bad_request(format!("Invalid input: {err}")))
        }
    };

    let ctx = create_context(&state, &headers);
    let span = tracing::info_span!("procedure", request_id = %ctx.request_id, %path);

    match state.router.call(&path, ctx, input).instrument(span.clone()).await {
        Ok(data) => Json(serde_json::json!({ "result": { "data": data } })).into_response(),
        Err(err) => {
            span.in_scope(|| tracing::debug!(code = ?err.code, "Procedure failed: {err}"));
            error_response(&path, &err)
        }
    }
}

fn error_response(path: &str, err: &RpcError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "error": {
            "message": err.message,
            "code": err.code.rpc_code(),
            "data": {
                "code": err.code,
                "httpStatus": err.http_status(),
                "path": path,
            },
        }
    });

    (status, Json(body)).into_response()
}
