use hackpsu_core::types::{flexible, now_millis, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A participant's attendance confirmation, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Rsvp {
    #[validate(length(min = 1))]
    pub user_id: Uid,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub rsvp_time: EpochMillis,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub rsvp_status: bool,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for Rsvp {}

impl Rsvp {
    /// An RSVP stamped with the current time.
    pub fn new(user_id: impl Into<Uid>, rsvp_status: bool) -> Self {
        Self {
            user_id: user_id.into(),
            rsvp_time: now_millis(),
            rsvp_status,
            hackathon: None,
        }
    }
}
