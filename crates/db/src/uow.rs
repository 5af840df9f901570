//! Unit of work: runs finished statements on a pooled connection, serves
//! and fills the result cache, and classifies store errors.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use hackpsu_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{cache_key, CacheService};
use crate::error::DbError;
use crate::query::ParamQuery;
use crate::response::Listing;
use crate::store::{SqlStore, StoreError, StoreTransaction};
use crate::Record;

/// Per-statement execution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOpts {
    /// Serve from and populate the result cache.
    pub cache: bool,
    /// Produce rows lazily instead of as a vector.
    pub stream: bool,
}

impl QueryOpts {
    pub const CACHED: QueryOpts = QueryOpts {
        cache: true,
        stream: false,
    };
    pub const UNCACHED: QueryOpts = QueryOpts {
        cache: false,
        stream: false,
    };

    pub fn cached(cache: bool) -> Self {
        Self {
            cache,
            stream: false,
        }
    }

    pub fn streamed(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Map a store error through the known error-code table. Unknown errors
/// pass through unchanged.
pub fn classify(err: StoreError) -> DbError {
    let known = match &err {
        StoreError::Database { code, .. } => match code {
            1064 | 1149 => Some((500, "the mysql query was ill-formed")),
            1062 => Some((409, "duplicate objects not allowed")),
            1452 => Some((400, "object depends on non-existent dependency")),
            1217 | 1451 => Some((400, "cannot delete as this object is referenced elsewhere")),
            1048 => Some((400, "a required property was found to be null")),
            _ => None,
        },
        StoreError::ConnectionRefused(_) => Some((500, "could not connect to the database")),
        StoreError::Driver(_) => None,
    };
    match known {
        Some((status, message)) => {
            tracing::error!(error = %err, status, "Classified store error");
            DbError::Core(CoreError::http(status, message))
        }
        None => {
            tracing::error!(error = %err, "Unclassified store error");
            DbError::Store(err)
        }
    }
}

/// Executes statements for every data mapper.
pub struct MysqlUow {
    store: Arc<dyn SqlStore>,
    cache: Arc<dyn CacheService>,
}

impl MysqlUow {
    pub fn new(store: Arc<dyn SqlStore>, cache: Arc<dyn CacheService>) -> Self {
        Self { store, cache }
    }

    /// Execute one statement in its own transaction.
    ///
    /// With `opts.cache`, a cached result is returned without touching the
    /// store, and a fresh result is written back best-effort.
    pub async fn query(&self, query: &ParamQuery, opts: QueryOpts) -> Result<Vec<Record>, DbError> {
        tracing::debug!(sql = %query.text, params = query.values.len(), cache = opts.cache, "Executing query");
        let key = opts.cache.then(|| cache_key(query));

        if let Some(key) = &key {
            match self.cache.get(key).await {
                Ok(Some(rows)) => {
                    tracing::debug!(sql = %query.text, "Cache hit");
                    return Ok(rows);
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(error = %err, "Cache read failed"),
            }
        }

        let mut results = self.transaction(std::slice::from_ref(query)).await?;
        let rows = results.pop().unwrap_or_default();

        if let Some(key) = &key {
            if let Err(err) = self.cache.set(key, rows.clone()).await {
                tracing::warn!(error = %err, "Cache write failed");
            }
        }
        Ok(rows)
    }

    /// Execute `query` and decode every row into `T`, materialized or lazy
    /// per `opts.stream`.
    pub async fn query_listing<T>(&self, query: &ParamQuery, opts: QueryOpts) -> Result<Listing<T>, DbError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let rows = self.query(query, opts).await?;
        if opts.stream {
            let lazy = stream::iter(rows).map(|row| decode::<T>(row)).boxed();
            Ok(Listing::Lazy(lazy))
        } else {
            rows.into_iter()
                .map(decode)
                .collect::<Result<Vec<T>, _>>()
                .map(Listing::Materialized)
        }
    }

    /// Execute `query` and decode the first row, if any.
    pub async fn query_one<T: DeserializeOwned>(&self, query: &ParamQuery, opts: QueryOpts) -> Result<Option<T>, DbError> {
        self.query(query, opts)
            .await?
            .into_iter()
            .next()
            .map(decode)
            .transpose()
    }

    /// Execute a `COUNT` statement and return the scalar in its first
    /// column. An empty result counts as zero.
    pub async fn count(&self, query: &ParamQuery, opts: QueryOpts) -> Result<i64, DbError> {
        let rows = self.query(query, opts).await?;
        Ok(rows.first().and_then(|row| row.values().next()).map_or(0, scalar))
    }

    /// Execute statements in order on one connection inside a single
    /// transaction, returning each statement's rows. Any failure rolls the
    /// whole transaction back.
    pub async fn transaction(&self, queries: &[ParamQuery]) -> Result<Vec<Vec<Record>>, DbError> {
        let mut tx = self.store.begin().await.map_err(classify)?;
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            match tx.query(query).await {
                Ok(rows) => results.push(rows),
                Err(err) => {
                    rollback(tx).await;
                    return Err(classify(err));
                }
            }
        }
        complete(tx).await?;
        Ok(results)
    }
}

/// Commit and release the connection back to the pool.
async fn complete(tx: Box<dyn StoreTransaction>) -> Result<(), DbError> {
    tx.commit().await.map_err(classify)
}

async fn rollback(tx: Box<dyn StoreTransaction>) {
    if let Err(err) = tx.rollback().await {
        tracing::error!(error = %err, "Rollback failed");
    }
}

pub(crate) fn decode<T: DeserializeOwned>(row: Record) -> Result<T, DbError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn scalar(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::cache::{MemCache, NoCache};
    use crate::query::SqlParam;
    use crate::store::MockStore;

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test rows are objects"),
        }
    }

    fn select() -> ParamQuery {
        ParamQuery::raw("SELECT * FROM `CATEGORY_LIST`;", vec![])
    }

    // -- classification --

    #[test]
    fn known_codes_map_to_http_errors() {
        let cases = [
            (1062, 409, "duplicate objects not allowed"),
            (1452, 400, "object depends on non-existent dependency"),
            (1217, 400, "cannot delete as this object is referenced elsewhere"),
            (1048, 400, "a required property was found to be null"),
            (1064, 500, "the mysql query was ill-formed"),
        ];
        for (code, status, message) in cases {
            let err = classify(StoreError::Database {
                code,
                message: "server text".into(),
            });
            assert_matches!(
                err,
                DbError::Core(CoreError::Http { status: s, message: m }) if s == status && m == message
            );
        }
    }

    #[test]
    fn unknown_codes_pass_through() {
        let err = classify(StoreError::Database {
            code: 1205,
            message: "lock wait timeout".into(),
        });
        assert_matches!(err, DbError::Store(StoreError::Database { code: 1205, .. }));
    }

    #[test]
    fn connection_refused_is_500() {
        let err = classify(StoreError::ConnectionRefused("nope".into()));
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "could not connect to the database");
    }

    // -- execution --

    #[tokio::test]
    async fn query_commits_its_transaction() {
        let store = Arc::new(MockStore::new().respond(|_| Ok(vec![row(json!({"uid": 1}))])));
        let uow = MysqlUow::new(store.clone(), Arc::new(NoCache));
        let rows = uow.query(&select(), QueryOpts::UNCACHED).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.begin_count(), 1);
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.rollback_count(), 0);
    }

    #[tokio::test]
    async fn failure_rolls_back_and_classifies() {
        let store = Arc::new(MockStore::new().respond(|_| {
            Err(StoreError::Database {
                code: 1062,
                message: "Duplicate entry".into(),
            })
        }));
        let uow = MysqlUow::new(store.clone(), Arc::new(NoCache));
        let err = uow.query(&select(), QueryOpts::UNCACHED).await.unwrap_err();
        assert_eq!(err.status(), 409);
        assert_eq!(store.rollback_count(), 1);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn cached_query_skips_the_store_on_hit() {
        let store = Arc::new(MockStore::new().respond(|_| Ok(vec![row(json!({"uid": 1}))])));
        let uow = MysqlUow::new(store.clone(), Arc::new(MemCache::default()));
        let first = uow.query(&select(), QueryOpts::CACHED).await.unwrap();
        let second = uow.query(&select(), QueryOpts::CACHED).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.queries().len(), 1);
    }

    #[tokio::test]
    async fn uncached_query_always_hits_the_store() {
        let store = Arc::new(MockStore::new());
        let uow = MysqlUow::new(store.clone(), Arc::new(MemCache::default()));
        uow.query(&select(), QueryOpts::UNCACHED).await.unwrap();
        uow.query(&select(), QueryOpts::UNCACHED).await.unwrap();
        assert_eq!(store.queries().len(), 2);
    }

    #[tokio::test]
    async fn count_reads_first_column_and_defaults_to_zero() {
        let store = Arc::new(MockStore::new().respond(|q| {
            if q.values.is_empty() {
                Ok(vec![row(json!({"count": "7"}))])
            } else {
                Ok(vec![])
            }
        }));
        let uow = MysqlUow::new(store, Arc::new(NoCache));
        assert_eq!(uow.count(&select(), QueryOpts::UNCACHED).await.unwrap(), 7);
        let empty = ParamQuery::raw("SELECT 1;", vec![SqlParam::Int(1)]);
        assert_eq!(uow.count(&empty, QueryOpts::UNCACHED).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transaction_runs_statements_in_order_on_one_connection() {
        let store = Arc::new(MockStore::new());
        let uow = MysqlUow::new(store.clone(), Arc::new(NoCache));
        let a = ParamQuery::raw("UPDATE a;", vec![]);
        let b = ParamQuery::raw("UPDATE b;", vec![]);
        uow.transaction(&[a.clone(), b.clone()]).await.unwrap();

        let executed = store.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0].query, a);
        assert_eq!(executed[1].query, b);
        assert_eq!(executed[0].transaction, executed[1].transaction);
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn streamed_listing_is_lazy() {
        let store = Arc::new(MockStore::new().respond(|_| {
            Ok(vec![row(json!({"n": 1})), row(json!({"n": 2}))])
        }));
        let uow = MysqlUow::new(store, Arc::new(NoCache));
        let listing: Listing<Value> = uow
            .query_listing(&select(), QueryOpts::UNCACHED.streamed(true))
            .await
            .unwrap();
        assert!(listing.is_lazy());
        assert_eq!(listing.collect().await.unwrap(), vec![json!({"n": 1}), json!({"n": 2})]);
    }
}
