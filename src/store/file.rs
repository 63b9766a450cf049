//! Document store persisted to a single JSON file
//!
//! The whole document tree is loaded for every operation and rewritten after
//! every mutation. Fine for a single user's local data; not meant for
//! concurrent writers across processes.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;

use super::tree::Tree;
use super::{DocPath, Document, DocumentStore, Query};
use crate::error::Result;

/// Document store backed by one pretty-printed JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Tree> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Tree::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Tree::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, tree: &Tree) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(tree)?;
        tokio::fs::write(&self.path, contents).await?;
        tracing::debug!("Saved {} documents to {:?}", tree.len(), self.path);
        Ok(())
    }

    /// Load, apply `f`, and save
    async fn update<T>(&self, f: impl FnOnce(&mut Tree) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut tree = self.load().await?;
        let out = f(&mut tree)?;
        self.save(&tree).await?;
        Ok(out)
    }
}

impl DocumentStore for JsonFileStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        Ok(self.load().await?.get(path))
    }

    async fn set(&self, path: &DocPath, data: Value) -> Result<()> {
        self.update(|tree| tree.set(path, data)).await
    }

    async fn create(&self, path: &DocPath, data: Value) -> Result<bool> {
        self.update(|tree| tree.create(path, data)).await
    }

    async fn merge(&self, path: &DocPath, fields: Value) -> Result<()> {
        self.update(|tree| tree.merge(path, fields)).await
    }

    async fn delete(&self, path: &DocPath) -> Result<bool> {
        self.update(|tree| Ok(tree.delete(path))).await
    }

    async fn list(&self, collection: &DocPath) -> Result<Vec<Document>> {
        Ok(self.load().await?.list(collection))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        Ok(self.load().await?.query(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::docpath;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json"));
        assert_eq!(store.get(&docpath::user("u1")).await.unwrap(), None);
        assert!(store.list(&docpath::users()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&file);
        store.set(&docpath::class("c1"), json!({"name": "WD-101"})).await.unwrap();
        store.merge(&docpath::class("c1"), json!({"students": ["s1"]})).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&file);
        assert_eq!(
            reopened.get(&docpath::class("c1")).await.unwrap(),
            Some(json!({"name": "WD-101", "students": ["s1"]}))
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("store.json");
        std::fs::write(&file, "{not json").unwrap();

        let store = JsonFileStore::open(&file);
        assert!(store.get(&docpath::user("u1")).await.is_err());
    }

    #[tokio::test]
    async fn failed_write_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json"));
        store.set(&docpath::user("u1"), json!({"fullname": "Ana"})).await.unwrap();

        assert!(store.set(&docpath::users(), json!({})).await.is_err());
        assert_eq!(store.list(&docpath::users()).await.unwrap().len(), 1);
    }
}
