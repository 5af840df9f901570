//! Wristband assignments and scans.
//!
//! Storage uses `rfid_uid`/`user_uid`; the API calls the wristband id
//! `wid` and the user `uid`.

use hackpsu_core::types::{flexible, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// Binding of a wristband to a registered user, in `RFID_ASSIGNMENTS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RfidAssignment {
    #[validate(length(min = 1))]
    pub rfid_uid: Uid,
    #[validate(length(min = 1))]
    pub user_uid: Uid,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub time: EpochMillis,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for RfidAssignment {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfidAssignmentApiModel {
    pub wid: Uid,
    pub uid: Uid,
    pub time: EpochMillis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hackathon: Option<Uid>,
}

impl From<RfidAssignmentApiModel> for RfidAssignment {
    fn from(api: RfidAssignmentApiModel) -> Self {
        Self {
            rfid_uid: api.wid,
            user_uid: api.uid,
            time: api.time,
            hackathon: api.hackathon,
        }
    }
}

impl From<RfidAssignment> for RfidAssignmentApiModel {
    fn from(assignment: RfidAssignment) -> Self {
        Self {
            wid: assignment.rfid_uid,
            uid: assignment.user_uid,
            time: assignment.time,
            hackathon: assignment.hackathon,
        }
    }
}

/// One wristband scan at an event, in `SCANS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Scan {
    #[validate(length(min = 1))]
    pub rfid_uid: Uid,
    pub scan_event: Uid,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub scan_time: EpochMillis,
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub scan_location: Option<i64>,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for Scan {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanApiModel {
    pub wid: Uid,
    pub scan_event: Uid,
    pub scan_time: EpochMillis,
    #[serde(default)]
    pub scan_location: Option<i64>,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl From<ScanApiModel> for Scan {
    fn from(api: ScanApiModel) -> Self {
        Self {
            rfid_uid: api.wid,
            scan_event: api.scan_event,
            scan_time: api.scan_time,
            scan_location: api.scan_location,
            hackathon: api.hackathon,
        }
    }
}

/// Per-item result tag of a batch insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemOutcome {
    Success,
    #[serde(rename = "Bad input")]
    BadInput,
    #[serde(rename = "Duplicate detected")]
    Duplicate,
    Error,
}

impl ItemOutcome {
    /// Tag for a failed insert with the given HTTP-class status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ItemOutcome::BadInput,
            409 => ItemOutcome::Duplicate,
            _ => ItemOutcome::Error,
        }
    }
}

/// Outcome of inserting one item of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem<T> {
    pub result: ItemOutcome,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assignment_translates_between_api_and_storage_names() {
        let api: RfidAssignmentApiModel =
            serde_json::from_value(json!({"wid": "band-1", "uid": "user-1", "time": 5})).unwrap();
        let assignment = RfidAssignment::from(api.clone());
        assert_eq!(assignment.rfid_uid, "band-1");
        assert_eq!(assignment.user_uid, "user-1");
        assert_eq!(RfidAssignmentApiModel::from(assignment), api);
    }
}
