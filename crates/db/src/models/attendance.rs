//! Attendance rows and their per-user and per-event aggregations.
//!
//! An attendance row is the `ATTENDANCE` view joined with `REGISTRATION`,
//! so its column set is wide and kept as a raw record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::entity::Entity;
use crate::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Attendance {
    #[serde(flatten)]
    pub columns: Record,
}

impl Entity for Attendance {}

impl Attendance {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }
}

pub(crate) const REGISTRATION_DETAILS: [&str; 23] = [
    "user_uid",
    "firstname",
    "lastname",
    "gender",
    "shirt_size",
    "dietary_restriction",
    "allergies",
    "travel_reimbursement",
    "first_hackathon",
    "university",
    "email",
    "academic_year",
    "major",
    "resume",
    "phone",
    "race",
    "coding_experience",
    "referral",
    "project",
    "expectations",
    "veteran",
    "pin",
    "hackathon",
];

pub(crate) const EVENT_DETAILS: [&str; 10] = [
    "event_uid",
    "event_start_time",
    "event_end_time",
    "event_title",
    "event_description",
    "event_type",
    "event_name",
    "ws_presenter_names",
    "ws_skill_level",
    "event_icon",
];

/// Copy the listed columns that are present in `row`.
pub(crate) fn pick(row: &Record, keys: &[&str]) -> Record {
    keys.iter()
        .filter_map(|key| row.get(*key).map(|value| ((*key).to_string(), value.clone())))
        .collect()
}

/// One registrant and every event they attended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAttendance {
    #[serde(flatten)]
    pub registration: Record,
    pub events: Vec<Record>,
}

/// One event and everyone who attended it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAttendance {
    #[serde(flatten)]
    pub event: Record,
    pub attendees: Vec<Record>,
}
