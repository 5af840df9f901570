//! Scheduled event model.

use hackpsu_core::types::{flexible, new_uid, EpochMillis, Uid};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::entity::Entity;

pub const DEFAULT_EVENT_ICON: &str = "https://standard.psu.edu/images/uploads/psu-mark.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Workshop,
    Activity,
    Food,
}

/// A row from the `EVENTS` table. Listings join `LOCATIONS` for
/// `location_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Event {
    pub uid: Uid,
    #[serde(deserialize_with = "location_id")]
    pub event_location: i64,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub event_start_time: EpochMillis,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub event_end_time: EpochMillis,
    #[validate(length(min = 1))]
    pub event_title: String,
    #[serde(default)]
    pub event_description: Option<String>,
    pub event_type: EventType,
    #[serde(default)]
    pub hackathon: Option<Uid>,
    #[serde(default)]
    pub ws_presenter_names: Option<String>,
    #[serde(default)]
    pub ws_skill_level: Option<String>,
    #[serde(default)]
    pub ws_relevant_skills: Option<String>,
    #[serde(default)]
    pub ws_urls: Option<Vec<String>>,
    #[serde(default)]
    #[validate(url)]
    pub event_icon: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
}

impl Entity for Event {
    const EXCLUDED: &'static [&'static str] = &["location_name", "ws_urls"];
}

/// Location ids arrive as numbers or numeric strings.
fn location_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    flexible::opt_int(deserializer)?.ok_or_else(|| serde::de::Error::custom("event_location is required"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventApiModel {
    pub uid: Option<Uid>,
    #[serde(deserialize_with = "location_id")]
    pub event_location: i64,
    pub event_start_time: EpochMillis,
    pub event_end_time: EpochMillis,
    pub event_title: String,
    pub event_description: Option<String>,
    pub event_type: EventType,
    pub ws_presenter_names: Option<String>,
    pub ws_skill_level: Option<String>,
    pub ws_relevant_skills: Option<String>,
    pub ws_urls: Option<Vec<String>>,
    pub event_icon: Option<String>,
}

impl From<EventApiModel> for Event {
    fn from(api: EventApiModel) -> Self {
        Self {
            uid: api.uid.unwrap_or_else(new_uid),
            event_location: api.event_location,
            event_start_time: api.event_start_time,
            event_end_time: api.event_end_time,
            event_title: api.event_title,
            event_description: api.event_description.filter(|d| !d.is_empty()),
            event_type: api.event_type,
            hackathon: None,
            ws_presenter_names: api.ws_presenter_names,
            ws_skill_level: api.ws_skill_level,
            ws_relevant_skills: api.ws_relevant_skills,
            ws_urls: api.ws_urls,
            event_icon: Some(
                api.event_icon
                    .filter(|icon| !icon.is_empty())
                    .unwrap_or_else(|| DEFAULT_EVENT_ICON.to_string()),
            ),
            location_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn api() -> EventApiModel {
        serde_json::from_value(json!({
            "eventLocation": "4",
            "eventStartTime": 1000,
            "eventEndTime": 2000,
            "eventTitle": "Intro to Rust",
            "eventType": "workshop",
            "wsUrls": ["https://example.org/slides"]
        }))
        .unwrap()
    }

    #[test]
    fn api_model_applies_defaults() {
        let event = Event::from(api());
        assert_eq!(event.event_location, 4);
        assert_eq!(event.event_icon.as_deref(), Some(DEFAULT_EVENT_ICON));
        assert_eq!(event.event_type, EventType::Workshop);
        assert_eq!(event.uid.len(), 32);
    }

    #[test]
    fn joined_and_url_columns_are_not_stored() {
        let mut event = Event::from(api());
        event.location_name = Some("Atrium".into());
        let record = event.db_representation().unwrap();
        assert!(!record.contains_key("location_name"));
        assert!(!record.contains_key("ws_urls"));
        assert_eq!(record["event_type"], "workshop");
    }

    #[test]
    fn api_to_row_round_trip_keeps_values() {
        let event = Event::from(api());
        let mut row = event.db_representation().unwrap();
        // the driver hands epochs back as strings for some column types
        row.insert("event_start_time".into(), json!("1000"));
        let hydrated = Event::from_row(row).unwrap();
        assert_eq!(hydrated.event_start_time, 1000);
        assert_eq!(hydrated.event_title, event.event_title);
        assert_eq!(hydrated.event_location, event.event_location);
    }
}
