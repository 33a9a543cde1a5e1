//! The client half: load a post page, hydrate a query client from its props
//! and render the post the way the page's component would.

use crate::query::transport::{HttpTransport, LocalTransport};
use crate::query::QueryClient;
use crate::routes::page::post::{server_side_props, PageProps};
use crate::rpc::post::{ById, PostById};
use crate::state::State;
use crate::transformer::Transformer;
use crate::view;
use axum::http::HeaderMap;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("could not load page: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page has no embedded props")]
    NoProps,
    #[error("could not read page props: {0}")]
    Props(#[from] serde_json::Error),
}

/// Loads `/post/{id}` from a running server. The post query is answered
/// from the page's snapshot when the server could prefetch it.
pub async fn view_remote(
    base_url: &str,
    id: &str,
    transformer: Transformer,
) -> Result<String, ViewError> {
    let base_url = base_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    let html = client
        .get(format!("{base_url}/post/{}", urlencoding::encode(id)))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let props_json = view::document::extract_props(&html).ok_or(ViewError::NoProps)?;
    let props: PageProps = serde_json::from_str(props_json)?;

    let query_client = QueryClient::new(HttpTransport::with_client(client, base_url), transformer);
    Ok(hydrate_and_render(&query_client, props).await)
}

/// Same flow without a server: props are produced in process and cross a
/// JSON boundary before hydrating.
pub async fn view_local(state: &State, id: &str) -> Result<String, ViewError> {
    let props = server_side_props(state, &HeaderMap::new(), id.to_owned()).await;
    let props: PageProps = serde_json::from_str(&serde_json::to_string(&props)?)?;

    let query_client = QueryClient::new(
        LocalTransport::new(state.router.clone(), state.store.clone()),
        state.router.transformer(),
    );
    Ok(hydrate_and_render(&query_client, props).await)
}

async fn hydrate_and_render(client: &QueryClient, props: PageProps) -> String {
    let seeded = client.hydrate(&props.trpc_state).await;
    tracing::info!(post_id = %props.id, seeded, "Hydrated query cache");

    let result = client.query::<PostById>(&ById { id: props.id }).await;
    view::post::render(&result)
}
