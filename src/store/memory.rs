//! In-process document store

use serde_json::Value;
use tokio::sync::RwLock;

use super::tree::Tree;
use super::{DocPath, Document, DocumentStore, Query};
use crate::error::Result;

/// Document store held entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: RwLock<Tree>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        Ok(self.tree.read().await.get(path))
    }

    async fn set(&self, path: &DocPath, data: Value) -> Result<()> {
        self.tree.write().await.set(path, data)
    }

    async fn create(&self, path: &DocPath, data: Value) -> Result<bool> {
        self.tree.write().await.create(path, data)
    }

    async fn merge(&self, path: &DocPath, fields: Value) -> Result<()> {
        self.tree.write().await.merge(path, fields)
    }

    async fn delete(&self, path: &DocPath) -> Result<bool> {
        Ok(self.tree.write().await.delete(path))
    }

    async fn list(&self, collection: &DocPath) -> Result<Vec<Document>> {
        Ok(self.tree.read().await.list(collection))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        Ok(self.tree.read().await.query(query))
    }
}
