use serde::{Deserialize, Serialize};

/// Identifiers are opaque strings (dash-less UUIDs for hackathons and
/// registrations, numeric strings elsewhere).
pub type Uid = String;

/// Milliseconds since the Unix epoch. All persisted timestamps use this unit.
pub type EpochMillis = i64;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}

/// A fresh dash-less v4 UUID, the id format used for hackathons,
/// pre-registrations and events.
pub fn new_uid() -> Uid {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Primary key plus the hackathon the row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundId {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hackathon: Option<Uid>,
}

impl CompoundId {
    pub fn new(uid: impl Into<Uid>, hackathon: Option<Uid>) -> Self {
        Self {
            uid: uid.into(),
            hackathon,
        }
    }
}

impl From<&str> for CompoundId {
    fn from(uid: &str) -> Self {
        Self::new(uid, None)
    }
}

/// Lenient deserializers for values whose storage type drifts between
/// deployments: epoch timestamps kept as `VARCHAR` and booleans kept as
/// `TINYINT`.
pub mod flexible {
    use serde::de::{self, Deserializer, Unexpected};
    use serde::Deserialize;
    use serde_json::Value;

    use super::EpochMillis;

    fn value_to_epoch<E: de::Error>(value: &Value) -> Result<Option<EpochMillis>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| E::invalid_value(Unexpected::Other("number"), &"an epoch")),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Str(s), &"a numeric epoch string")),
            other => Err(E::invalid_type(unexpected(other), &"an epoch")),
        }
    }

    fn value_to_bool<E: de::Error>(value: &Value) -> Result<Option<bool>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            Value::Number(n) => Ok(Some(n.as_f64().unwrap_or(0.0) != 0.0)),
            Value::String(s) => match s.as_str() {
                "1" | "true" => Ok(Some(true)),
                "0" | "false" => Ok(Some(false)),
                _ => Err(E::invalid_value(Unexpected::Str(s), &"a boolean")),
            },
            other => Err(E::invalid_type(unexpected(other), &"a boolean")),
        }
    }

    fn unexpected(value: &Value) -> Unexpected<'_> {
        match value {
            Value::Array(_) => Unexpected::Seq,
            Value::Object(_) => Unexpected::Map,
            _ => Unexpected::Other("value"),
        }
    }

    pub fn epoch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EpochMillis, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_to_epoch(&value)?.ok_or_else(|| de::Error::custom("missing epoch timestamp"))
    }

    pub fn opt_epoch<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<EpochMillis>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_to_epoch(&value)
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value_to_bool(&value)?.unwrap_or(false))
    }

    pub fn opt_boolean<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_to_bool(&value)
    }

    /// Numeric columns that occasionally arrive as strings (aggregates,
    /// `DECIMAL`s).
    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_to_epoch(&value)
    }

    /// Money and other `DECIMAL` columns; null reads as zero.
    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(0.0),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| de::Error::invalid_value(Unexpected::Other("number"), &"a decimal")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &"a decimal string")),
            other => Err(de::Error::invalid_type(unexpected(&other), &"a decimal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Stamped {
        #[serde(deserialize_with = "flexible::epoch")]
        at: EpochMillis,
        #[serde(default, deserialize_with = "flexible::opt_epoch")]
        until: Option<EpochMillis>,
        #[serde(deserialize_with = "flexible::boolean")]
        active: bool,
    }

    // -- flexible --

    #[test]
    fn epoch_accepts_numeric_strings() {
        let stamped: Stamped =
            serde_json::from_str(r#"{"at":"1546300800000","until":null,"active":1}"#).unwrap();
        assert_eq!(stamped.at, 1_546_300_800_000);
        assert_eq!(stamped.until, None);
        assert!(stamped.active);
    }

    #[test]
    fn epoch_accepts_numbers_and_bools() {
        let stamped: Stamped =
            serde_json::from_str(r#"{"at":12,"until":"34","active":false}"#).unwrap();
        assert_eq!(stamped.at, 12);
        assert_eq!(stamped.until, Some(34));
        assert!(!stamped.active);
    }

    #[test]
    fn epoch_rejects_garbage() {
        let result: Result<Stamped, _> = serde_json::from_str(r#"{"at":"soon","active":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn float_accepts_decimal_strings() {
        #[derive(Deserialize)]
        struct Amount {
            #[serde(deserialize_with = "flexible::float")]
            value: f64,
        }
        let amount: Amount = serde_json::from_str(r#"{"value":"12.50"}"#).unwrap();
        assert_eq!(amount.value, 12.5);
        let amount: Amount = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert_eq!(amount.value, 0.0);
    }

    // -- ids --

    #[test]
    fn new_uid_has_no_dashes() {
        let uid = new_uid();
        assert_eq!(uid.len(), 32);
        assert!(!uid.contains('-'));
    }

    #[test]
    fn compound_id_from_str_has_no_hackathon() {
        let id = CompoundId::from("abc123");
        assert_eq!(id.uid, "abc123");
        assert!(id.hackathon.is_none());
    }
}
