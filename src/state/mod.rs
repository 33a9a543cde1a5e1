use crate::config::Config;
use crate::rpc::AppRouter;
use crate::store::PostStore;
use std::sync::Arc;

pub type SharedState = axum::extract::State<Arc<State>>;
pub type NestedRouter = axum::Router<Arc<State>>;

#[derive(Debug)]
pub struct State {
    pub router: Arc<AppRouter>,
    pub store: Arc<dyn PostStore>,
}

impl State {
    pub fn new(config: &Config, store: Arc<dyn PostStore>) -> State {
        State {
            router: Arc::new(crate::rpc::app_router(config.transformer)),
            store,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_state(transformer: crate::transformer::Transformer) -> Arc<State> {
    let config = Config {
        transformer,
        ..Config::default()
    };
    let store = crate::store::MemoryStore::with_posts([crate::blog::test_post()]);

    Arc::new(State::new(&config, Arc::new(store)))
}
