use crate::state::NestedRouter;
use axum::routing::get;

pub mod post;

pub fn route() -> NestedRouter {
    axum::Router::new().route("/post/:id", get(post::get))
}
