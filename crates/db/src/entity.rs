//! Shared behaviour of persisted entities.
//!
//! Each entity is a serde struct whose field names are the storage column
//! names. The storage projection drops null values and the entity's
//! `EXCLUDED` columns (joined or computed values that are never written);
//! the external projection keeps everything.

use hackpsu_core::validation::{self, ValidationOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::error::DbError;
use crate::uow::decode;
use crate::Record;

pub trait Entity: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {
    /// Columns present on the struct but never written to storage.
    const EXCLUDED: &'static [&'static str] = &[];

    /// Storage shape used to build `INSERT`/`UPDATE` column lists.
    fn db_representation(&self) -> Result<Record, DbError> {
        let mut record = to_record(self)?;
        record.retain(|key, value| !value.is_null() && !Self::EXCLUDED.contains(&key.as_str()));
        Ok(record)
    }

    /// Shape returned to external callers.
    fn clean_representation(&self) -> Result<Value, DbError> {
        Ok(serde_json::to_value(self)?)
    }

    fn validation(&self) -> ValidationOutcome {
        validation::validate_entity(self)
    }

    /// Hydrate from a store row.
    fn from_row(row: Record) -> Result<Self, DbError> {
        decode(row)
    }

    /// Overlay the non-null values of `new` on `old`. Nested objects merge
    /// recursively.
    fn merge(new: &Self, old: &Self) -> Result<Self, DbError> {
        let mut base = serde_json::to_value(old)?;
        let overlay = serde_json::to_value(new)?;
        deep_merge(&mut base, overlay);
        Ok(serde_json::from_value(base)?)
    }
}

fn to_record<T: Serialize>(value: &T) -> Result<Record, DbError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::Decode(serde::de::Error::custom(format!(
            "entity serialized to a non-object: {other}"
        )))),
    }
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => {
            if !overlay.is_null() {
                *base = overlay;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
    struct Widget {
        uid: Option<i64>,
        #[validate(length(min = 1))]
        name: String,
        note: Option<String>,
        joined_label: Option<String>,
        settings: Value,
    }

    impl Entity for Widget {
        const EXCLUDED: &'static [&'static str] = &["joined_label"];
    }

    fn widget() -> Widget {
        Widget {
            uid: Some(4),
            name: "bolt".into(),
            note: None,
            joined_label: Some("from a join".into()),
            settings: json!({"a": 1, "b": {"c": 2}}),
        }
    }

    // -- projections --

    #[test]
    fn db_representation_drops_nulls_and_excluded() {
        let record = widget().db_representation().unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["uid", "name", "settings"]);
    }

    #[test]
    fn clean_representation_keeps_everything() {
        let clean = widget().clean_representation().unwrap();
        assert_eq!(clean["note"], Value::Null);
        assert_eq!(clean["joined_label"], "from a join");
    }

    // -- merge --

    #[test]
    fn merge_prefers_new_non_null_values() {
        let old = widget();
        let new = Widget {
            uid: None,
            name: "nut".into(),
            note: Some("fresh".into()),
            joined_label: None,
            settings: json!({"b": {"d": 3}}),
        };
        let merged = Widget::merge(&new, &old).unwrap();
        assert_eq!(merged.uid, Some(4));
        assert_eq!(merged.name, "nut");
        assert_eq!(merged.note.as_deref(), Some("fresh"));
        assert_eq!(merged.joined_label.as_deref(), Some("from a join"));
        assert_eq!(merged.settings, json!({"a": 1, "b": {"c": 2, "d": 3}}));
    }

    // -- hydration --

    #[test]
    fn from_row_round_trips_storage_shape() {
        let original = widget();
        let row = original.db_representation().unwrap();
        let hydrated = Widget::from_row(row).unwrap();
        assert_eq!(hydrated.name, original.name);
        assert_eq!(hydrated.uid, original.uid);
        assert_eq!(hydrated.joined_label, None);
    }

    #[test]
    fn validation_uses_declared_constraints() {
        let outcome = Widget {
            name: String::new(),
            ..widget()
        }
        .validation();
        assert!(!outcome.result);
    }
}
