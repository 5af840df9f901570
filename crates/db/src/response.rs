use std::fmt;

use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde::Serialize;

use crate::error::DbError;

/// Outcome tag carried by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultTag {
    Success,
    Error,
}

/// The `{ result, data }` envelope every mapper operation resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbResponse<T> {
    pub result: ResultTag,
    pub data: T,
}

impl<T> DbResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            result: ResultTag::Success,
            data,
        }
    }

    pub fn error(data: T) -> Self {
        Self {
            result: ResultTag::Error,
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == ResultTag::Success
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DbResponse<U> {
        DbResponse {
            result: self.result,
            data: f(self.data),
        }
    }
}

pub type DbResult<T> = Result<DbResponse<T>, DbError>;

/// Rows from a listing query: either fully materialized, or produced
/// lazily when the caller asked for a stream. A lazy listing can be
/// consumed once.
pub enum Listing<T> {
    Materialized(Vec<T>),
    Lazy(BoxStream<'static, Result<T, DbError>>),
}

impl<T> Listing<T> {
    /// Drain the listing into a vector.
    pub async fn collect(self) -> Result<Vec<T>, DbError> {
        match self {
            Listing::Materialized(items) => Ok(items),
            Listing::Lazy(stream) => stream.try_collect().await,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Listing::Lazy(_))
    }
}

impl<T: fmt::Debug> fmt::Debug for Listing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::Materialized(items) => f.debug_tuple("Materialized").field(items).finish(),
            Listing::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use futures::StreamExt;

    use super::*;

    #[test]
    fn envelope_serializes_result_tag() {
        let body = serde_json::to_value(DbResponse::success(3)).unwrap();
        assert_eq!(body, serde_json::json!({"result": "Success", "data": 3}));
    }

    #[tokio::test]
    async fn lazy_listing_collects_in_order() {
        let listing: Listing<i32> = Listing::Lazy(stream::iter(vec![Ok(1), Ok(2)]).boxed());
        assert!(listing.is_lazy());
        assert_eq!(listing.collect().await.unwrap(), vec![1, 2]);
    }
}
