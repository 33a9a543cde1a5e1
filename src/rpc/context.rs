use crate::blog::RequestID;
use crate::store::PostStore;
use axum::http::HeaderMap;
use std::sync::Arc;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything a procedure may touch while handling one call.
#[derive(Debug, Clone)]
pub struct Context {
    pub store: Arc<dyn PostStore>,
    pub request_id: RequestID,
}

impl Context {
    pub fn new(store: Arc<dyn PostStore>) -> Context {
        Context {
            store,
            request_id: crate::blog::get_random_hex_string::<{ crate::blog::REQUEST_ID_BYTES }>(),
        }
    }
}

/// Builds a fresh context for an inbound request, reusing the caller's
/// request id when one was sent.
pub fn create_context(state: &crate::state::State, headers: &HeaderMap) -> Context {
    let mut ctx = Context::new(state.store.clone());

    if let Some(request_id) = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        ctx.request_id = request_id.to_owned();
    }

    ctx
}
