use hackpsu_core::types::{flexible, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A participant checked in to a workshop by pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WorkshopScan {
    #[validate(length(min = 1))]
    pub event_id: Uid,
    #[serde(default)]
    pub hackathon_id: Option<Uid>,
    #[serde(default)]
    pub scan_uid: Option<i64>,
    #[serde(default, deserialize_with = "flexible::opt_epoch")]
    pub timestamp: Option<EpochMillis>,
    pub user_pin: i64,
}

impl Entity for WorkshopScan {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopScanApiModel {
    #[serde(rename = "eventID")]
    pub event_id: Uid,
    #[serde(rename = "hackathonID", default)]
    pub hackathon_id: Option<Uid>,
    #[serde(default)]
    pub scan_uid: Option<i64>,
    #[serde(default)]
    pub time_stamp: Option<EpochMillis>,
    pub user_pin: i64,
}

impl From<WorkshopScanApiModel> for WorkshopScan {
    fn from(api: WorkshopScanApiModel) -> Self {
        Self {
            event_id: api.event_id,
            hackathon_id: api.hackathon_id,
            scan_uid: api.scan_uid,
            timestamp: api.time_stamp,
            user_pin: api.user_pin,
        }
    }
}
