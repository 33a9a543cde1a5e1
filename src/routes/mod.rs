use crate::state::State;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod page;

pub fn app(state: Arc<State>) -> axum::Router {
    axum::Router::new()
        .nest("/api", api::route())
        .merge(page::route())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::Transformer;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = get(app(crate::state::test_state(Transformer::Tagged)), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn page_and_procedure_agree() {
        let state = crate::state::test_state(Transformer::Json);

        let (status, page) = get(app(state.clone()), "/post/abc123").await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("<h1>Hello</h1>"));

        let input = urlencoding::encode(r#"{"id":"abc123"}"#);
        let (status, body) = get(app(state), &format!("/api/trpc/post.byId?input={input}")).await;
        assert_eq!(status, StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["result"]["data"]["title"], "Hello");
    }
}
