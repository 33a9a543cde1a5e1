use super::{PostStore, StoreError};
use crate::blog::{BoxFuture, Post};
use std::path::PathBuf;

/// Posts stored as `<root>/post/<id>/meta.json`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> FsStore {
        FsStore { root: root.into() }
    }

    fn meta_path(&self, id: &str) -> Option<PathBuf> {
        // ids come straight from the url, keep them inside the store
        if id.is_empty() || id == "." || id.contains("..") || id.contains(['/', '\\']) {
            return None;
        }

        Some(self.root.join("post").join(id).join("meta.json"))
    }
}

impl PostStore for FsStore {
    fn by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Post>, StoreError>> {
        Box::pin(async move {
            let Some(path) = self.meta_path(id) else {
                return Ok(None);
            };

            let meta = match tokio::fs::read(&path).await {
                Ok(it) => it,
                Err(err) => {
                    if err.kind() == std::io::ErrorKind::NotFound {
                        return Ok(None);
                    } else {
                        return Err(err.into());
                    }
                }
            };

            serde_json::from_slice::<Post>(&meta)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    id: id.to_owned(),
                    source,
                })
        })
    }
}
