//! JSON fixtures for seeding the in-memory store.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use brdflow_core::result::AppResult;
use brdflow_entity::comment::Comment;
use brdflow_entity::request::BrdRequest;

use crate::memory::MemoryDocumentStore;

/// A snapshot of requests and comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    /// Request documents.
    #[serde(default)]
    pub requests: Vec<BrdRequest>,
    /// Comment documents. Each names its parent request.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl StoreFixture {
    /// Read a fixture from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Write every document into `store`. Requests go first so comments
    /// find their parent.
    pub async fn apply(self, store: &MemoryDocumentStore) -> AppResult<()> {
        let (requests, comments) = (self.requests.len(), self.comments.len());
        for request in self.requests {
            store.insert_request(request).await?;
        }
        for comment in self.comments {
            store.add_comment(comment).await?;
        }
        info!(requests, comments, "Document store seeded from fixture");
        Ok(())
    }
}
