use hackpsu_core::types::{flexible, now_millis, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// One checkout of an item by a user, stored in `CHECKOUT_DATA`.
/// `return_time` stays empty until the item comes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CheckoutObject {
    #[serde(default)]
    pub uid: Option<i64>,
    pub item_id: i64,
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub checkout_time: EpochMillis,
    #[serde(default, deserialize_with = "flexible::opt_epoch")]
    pub return_time: Option<EpochMillis>,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for CheckoutObject {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutObjectApiModel {
    pub uid: Option<i64>,
    pub item_id: i64,
    pub user_id: String,
    pub checkout_time: Option<EpochMillis>,
    pub return_time: Option<EpochMillis>,
    pub hackathon: Option<Uid>,
}

impl From<CheckoutObjectApiModel> for CheckoutObject {
    fn from(api: CheckoutObjectApiModel) -> Self {
        Self {
            uid: api.uid,
            item_id: api.item_id,
            user_id: api.user_id,
            checkout_time: api.checkout_time.unwrap_or_else(now_millis),
            return_time: api.return_time,
            hackathon: api.hackathon,
        }
    }
}
