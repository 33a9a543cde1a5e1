use crate::state::NestedRouter;
use axum::routing::get;

mod trpc;

pub fn route() -> NestedRouter {
    let compression_layer = tower_http::compression::CompressionLayer::new()
        .br(true)
        .quality(tower_http::CompressionLevel::Best);

    axum::Router::new().route("/trpc/:path", get(trpc::get).layer(compression_layer))
}
