//! Scripted in-memory store for exercising mappers without a database.
//!
//! Every executed statement is recorded together with the transaction it
//! ran in; responses come from a handler closure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{SqlStore, StoreError, StoreTransaction};
use crate::query::ParamQuery;
use crate::Record;

pub type MockHandler = Arc<dyn Fn(&ParamQuery) -> Result<Vec<Record>, StoreError> + Send + Sync>;

/// A statement the mock has executed.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub transaction: usize,
    pub query: ParamQuery,
}

#[derive(Default)]
struct Counters {
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

pub struct MockStore {
    handler: MockHandler,
    delay: Option<Duration>,
    executed: Arc<Mutex<Vec<Executed>>>,
    counters: Arc<Counters>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// A store that answers every statement with zero rows.
    pub fn new() -> Self {
        Self {
            handler: Arc::new(|_| Ok(Vec::new())),
            delay: None,
            executed: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Answer statements with `handler`.
    pub fn respond<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ParamQuery) -> Result<Vec<Record>, StoreError> + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Sleep before answering each statement.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn queries(&self) -> Vec<ParamQuery> {
        self.executed().into_iter().map(|e| e.query).collect()
    }

    /// Statements whose text starts with `prefix`.
    pub fn queries_starting_with(&self, prefix: &str) -> Vec<ParamQuery> {
        self.queries()
            .into_iter()
            .filter(|q| q.text.starts_with(prefix))
            .collect()
    }

    pub fn begin_count(&self) -> usize {
        self.counters.begins.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlStore for MockStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let id = self.counters.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransaction {
            id,
            handler: Arc::clone(&self.handler),
            delay: self.delay,
            executed: Arc::clone(&self.executed),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockTransaction {
    id: usize,
    handler: MockHandler,
    delay: Option<Duration>,
    executed: Arc<Mutex<Vec<Executed>>>,
    counters: Arc<Counters>,
}

#[async_trait]
impl StoreTransaction for MockTransaction {
    async fn query(&mut self, query: &ParamQuery) -> Result<Vec<Record>, StoreError> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Executed {
                transaction: self.id,
                query: query.clone(),
            });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(query)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
