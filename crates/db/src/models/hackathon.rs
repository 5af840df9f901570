//! Hackathon entity model.

use hackpsu_core::types::{flexible, new_uid, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;
use crate::error::DbError;

/// A row from the `HACKATHON` table. At most one row has `active = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Hackathon {
    pub uid: Uid,
    #[validate(length(min = 1))]
    pub name: String,
    /// Filled with the insert time when absent.
    #[serde(default, deserialize_with = "flexible::opt_epoch")]
    pub start_time: Option<EpochMillis>,
    #[serde(default, deserialize_with = "flexible::opt_epoch")]
    pub end_time: Option<EpochMillis>,
    /// Highest registration pin when the hackathon was created or made
    /// active; per-hackathon pins are offsets from it.
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub base_pin: Option<i64>,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub active: bool,
}

impl Entity for Hackathon {
    /// Absent values keep what is stored. `active` only ever moves through
    /// activation, so a payload can never clear it.
    fn merge(new: &Self, old: &Self) -> Result<Self, DbError> {
        Ok(Self {
            uid: new.uid.clone(),
            name: new.name.clone(),
            start_time: new.start_time.or(old.start_time),
            end_time: new.end_time.or(old.end_time),
            base_pin: new.base_pin.or(old.base_pin),
            active: new.active || old.active,
        })
    }
}

/// Hackathon as submitted through the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackathonApiModel {
    pub uid: Option<Uid>,
    pub name: String,
    pub start_time: Option<EpochMillis>,
    pub end_time: Option<EpochMillis>,
    pub base_pin: Option<i64>,
}

impl From<HackathonApiModel> for Hackathon {
    fn from(api: HackathonApiModel) -> Self {
        Self {
            uid: api.uid.unwrap_or_else(new_uid),
            name: api.name,
            start_time: api.start_time,
            end_time: api.end_time,
            base_pin: api.base_pin,
            active: false,
        }
    }
}
