use hackpsu_core::types::{flexible, now_millis, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A live announcement shown to participants. `push_notification` asks
/// the caller to also fan it out as a push message and is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Update {
    #[serde(default)]
    pub uid: Option<Uid>,
    #[validate(length(min = 1))]
    pub update_title: String,
    #[validate(length(min = 1))]
    pub update_text: String,
    #[serde(default)]
    #[validate(url)]
    pub update_image: Option<String>,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub update_time: EpochMillis,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub push_notification: bool,
}

impl Entity for Update {
    const EXCLUDED: &'static [&'static str] = &["push_notification"];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiModel {
    pub uid: Option<Uid>,
    pub update_title: String,
    pub update_text: String,
    pub update_image: Option<String>,
    pub update_time: Option<EpochMillis>,
    #[serde(default)]
    pub push_notification: bool,
}

impl From<UpdateApiModel> for Update {
    fn from(api: UpdateApiModel) -> Self {
        Self {
            uid: api.uid,
            update_title: api.update_title,
            update_text: api.update_text,
            update_image: api.update_image,
            update_time: api.update_time.unwrap_or_else(now_millis),
            push_notification: api.push_notification,
        }
    }
}
