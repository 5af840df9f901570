use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::mysql::{MySqlArguments, MySqlDatabaseError, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, Transaction, TypeInfo};

use super::{SqlStore, StoreError, StoreTransaction};
use crate::query::{ParamQuery, SqlParam};
use crate::{DbPool, Record};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                match db_err.try_downcast_ref::<MySqlDatabaseError>() {
                    Some(mysql) => StoreError::Database {
                        code: mysql.number(),
                        message: mysql.message().to_string(),
                    },
                    None => StoreError::Driver(sqlx::Error::Database(db_err)),
                }
            }
            sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
                StoreError::ConnectionRefused(io.to_string())
            }
            other => StoreError::Driver(other),
        }
    }
}

/// [`SqlStore`] over a sqlx MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: DbPool,
}

impl MySqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SqlStore for MySqlStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlTransaction { tx }))
    }
}

struct MySqlTransaction {
    tx: Transaction<'static, MySql>,
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &'q [SqlParam],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = match value {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(b) => query.bind(*b),
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Float(f) => query.bind(*f),
            SqlParam::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

#[async_trait]
impl StoreTransaction for MySqlTransaction {
    async fn query(&mut self, query: &ParamQuery) -> Result<Vec<Record>, StoreError> {
        let rows = bind_all(sqlx::query(&query.text), &query.values)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Convert a MySQL row into a JSON record keyed by column label.
fn row_to_record(row: &MySqlRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = match type_name {
            "NULL" => Value::Null,
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(index)?
                .map_or(Value::Null, Value::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
                .try_get::<Option<i64>, _>(index)?
                .map_or(Value::Null, |v| Value::Number(v.into())),
            name if name.ends_with("UNSIGNED") => row
                .try_get::<Option<u64>, _>(index)?
                .map_or(Value::Null, |v| Value::Number(v.into())),
            "FLOAT" | "DOUBLE" => row
                .try_get::<Option<f64>, _>(index)?
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<Option<sqlx::types::chrono::NaiveDateTime>, _>(index)?
                .map_or(Value::Null, |v| {
                    Value::Number(v.and_utc().timestamp_millis().into())
                }),
            "DECIMAL" => row
                .try_get_unchecked::<Option<String>, _>(index)?
                .map_or(Value::Null, |s| numeric_or_text(&s)),
            _ => row
                .try_get_unchecked::<Option<String>, _>(index)?
                .map_or(Value::Null, Value::String),
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn numeric_or_text(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(i.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(text.to_string()), Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_text_becomes_number() {
        assert_eq!(numeric_or_text("12"), Value::Number(12.into()));
        assert_eq!(numeric_or_text("1.5"), serde_json::json!(1.5));
        assert_eq!(numeric_or_text("n/a"), Value::String("n/a".into()));
    }

    #[test]
    fn io_connection_refused_is_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::from(sqlx::Error::Io(io));
        assert!(matches!(err, StoreError::ConnectionRefused(_)));
    }
}
