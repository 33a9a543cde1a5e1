use crate::blog::PostID;
use crate::query::{DehydratedState, QueryClient};
use crate::rpc::create_context;
use crate::rpc::post::{ById, PostById};
use crate::ssg::SsgHelpers;
use crate::state::{SharedState, State};
use crate::view;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// Everything the page hands to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProps {
    pub trpc_state: DehydratedState,
    pub id: PostID,
}

/// Prefetches `post.byId` for `id`. A failed prefetch leaves the post out of
/// the snapshot and the client asks again.
pub async fn server_side_props(state: &State, headers: &HeaderMap, id: PostID) -> PageProps {
    let ctx = create_context(state, headers);
    let span = tracing::info_span!("post_page", request_id = %ctx.request_id, post_id = %id);

    async move {
        let ssg = SsgHelpers::new(state.router.clone(), ctx);
        ssg.prefetch::<PostById>(&ById { id: id.clone() }).await;

        let trpc_state = ssg.dehydrate().await;
        tracing::debug!(prefetched = trpc_state.queries.len(), "Built page props");

        PageProps { trpc_state, id }
    }
    .instrument(span)
    .await
}

/// Renders the component from the snapshot alone and embeds the props.
pub async fn render_page(state: &State, props: &PageProps) -> serde_json::Result<String> {
    let client = QueryClient::detached(state.router.transformer());
    client.hydrate(&props.trpc_state).await;

    let result = client
        .peek::<PostById>(&ById {
            id: props.id.clone(),
        })
        .await;

    Ok(view::document::render(
        &view::post::title(&result),
        &view::post::render(&result),
        &serde_json::to_string(props)?,
    ))
}

pub(super) async fn get(
    axum::extract::State(state): SharedState,
    headers: HeaderMap,
    Path(post_id): Path<PostID>,
) -> Result<Html<String>, StatusCode> {
    let props = server_side_props(&state, &headers, post_id).await;

    match render_page(&state, &props).await {
        Ok(html) => Ok(Html(html)),
        Err(err) => {
            tracing::error!(post_id = %props.id, "Error rendering post page: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::{test_post, Post};
    use crate::query::QueryStatus;
    use crate::transformer::Transformer;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    async fn get_page(uri: &str) -> (StatusCode, String) {
        let app = crate::routes::app(crate::state::test_state(Transformer::Tagged));
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
    async fn props_hold_the_prefetched_post() {
        let state = crate::state::test_state(Transformer::Tagged);

        let props = server_side_props(&state, &HeaderMap::new(), "abc123".into()).await;

        assert_eq!(props.id, "abc123");
        assert_eq!(props.trpc_state.queries.len(), 1);
        let query = &props.trpc_state.queries[0];
        assert_eq!(query.state.status, QueryStatus::Success);
        let post: Post = Transformer::Tagged
            .deserialize(query.state.data.clone().unwrap())
            .unwrap();
        assert_eq!(post, test_post());
    }

    #[tokio::test]
    async fn props_are_the_same_every_time() {
        let state = crate::state::test_state(Transformer::Tagged);
        let normalized = |mut props: PageProps| {
            for query in &mut props.trpc_state.queries {
                query.state.data_updated_at = 0;
            }
            props
        };

        let first = server_side_props(&state, &HeaderMap::new(), "abc123".into()).await;
        let second = server_side_props(&state, &HeaderMap::new(), "abc123".into()).await;

        assert_eq!(normalized(first), normalized(second));
    }

    #[tokio::test]
    async fn missing_post_still_produces_props() {
        let state = crate::state::test_state(Transformer::Tagged);

        let props = server_side_props(&state, &HeaderMap::new(), "missing".into()).await;

        assert_eq!(props.id, "missing");
        assert!(props.trpc_state.queries.is_empty());
    }

    #[tokio::test]
    async fn page_renders_prefetched_post() {
        let (status, html) = get_page("/post/abc123").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Hello</title>"));
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
        assert!(html.contains("Created 1/1/2023"));

        let props: PageProps =
            serde_json::from_str(view::document::extract_props(&html).unwrap()).unwrap();
        assert_eq!(props.id, "abc123");
        assert_eq!(props.trpc_state.queries.len(), 1);
    }

    #[tokio::test]
    async fn missing_post_renders_placeholder_not_undefined() {
        let (status, html) = get_page("/post/missing").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Loading..."));
        assert!(!html.contains("undefined"));

        let props: PageProps =
            serde_json::from_str(view::document::extract_props(&html).unwrap()).unwrap();
        assert_eq!(props.id, "missing");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn page_logs_carry_the_request_id() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let state = crate::state::test_state(Transformer::Tagged);
        let mut headers = HeaderMap::new();
        headers.insert(crate::rpc::context::REQUEST_ID_HEADER, "req-7".parse().unwrap());
        server_side_props(&state, &headers, "abc123".into()).await;

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("Built page props"))
            .unwrap();
        assert!(line.contains("request_id=req-7"));
        assert!(line.contains("post_id=abc123"));
    }

    #[tokio::test]
    async fn id_format_is_not_validated() {
        let (status, html) = get_page("/post/not%20a%20uuid").await;

        assert_eq!(status, StatusCode::OK);
        let props: PageProps =
            serde_json::from_str(view::document::extract_props(&html).unwrap()).unwrap();
        assert_eq!(props.id, "not a uuid");
    }
}
