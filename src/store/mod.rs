use crate::blog::{BoxFuture, Post};

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error reading post store: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored post {id} is malformed: {source}")]
    Corrupt {
        id: String,
        source: serde_json::Error,
    },
}

/// Read side of the post store. `Ok(None)` means the post does not exist.
pub trait PostStore: std::fmt::Debug + Send + Sync {
    fn by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Post>, StoreError>>;
}
