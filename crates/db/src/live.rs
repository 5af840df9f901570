//! Document store for live data pushed to clients. Documents are JSON
//! objects addressed by slash-separated paths.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Record;

#[derive(Debug, thiserror::Error)]
pub enum LiveStoreError {
    #[error("live store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LiveStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Record>, LiveStoreError>;

    /// Every document directly under `parent`, in path order.
    async fn list(&self, parent: &str) -> Result<Vec<Record>, LiveStoreError>;

    async fn count(&self, parent: &str) -> Result<i64, LiveStoreError>;

    /// Create or replace the document at `path`.
    async fn set(&self, path: &str, document: Record) -> Result<(), LiveStoreError>;

    /// Overlay `fields` on the document at `path`, creating it if absent.
    async fn update(&self, path: &str, fields: Record) -> Result<(), LiveStoreError>;

    async fn delete(&self, path: &str) -> Result<(), LiveStoreError>;

    /// Address a client subscribes to for changes under `parent`.
    fn reference(&self, parent: &str) -> String;
}

/// In-process live store.
#[derive(Default)]
pub struct MemoryLiveStore {
    documents: RwLock<BTreeMap<String, Record>>,
}

impl MemoryLiveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn child_of<'a>(path: &'a str, parent: &str) -> Option<&'a str> {
    path.strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
}

#[async_trait]
impl LiveStore for MemoryLiveStore {
    async fn get(&self, path: &str) -> Result<Option<Record>, LiveStoreError> {
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn list(&self, parent: &str) -> Result<Vec<Record>, LiveStoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(path, _)| child_of(path, parent).is_some())
            .map(|(_, document)| document.clone())
            .collect())
    }

    async fn count(&self, parent: &str) -> Result<i64, LiveStoreError> {
        let documents = self.documents.read().await;
        let count = documents.keys().filter(|path| child_of(path, parent).is_some()).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn set(&self, path: &str, document: Record) -> Result<(), LiveStoreError> {
        self.documents.write().await.insert(path.to_string(), document);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Record) -> Result<(), LiveStoreError> {
        let mut documents = self.documents.write().await;
        let document = documents.entry(path.to_string()).or_default();
        for (key, value) in fields {
            document.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), LiveStoreError> {
        self.documents.write().await.remove(path);
        Ok(())
    }

    fn reference(&self, parent: &str) -> String {
        format!("memory:///{parent}")
    }
}
