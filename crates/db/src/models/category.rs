//! Prize category model.

use hackpsu_core::types::flexible;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A row from the `CATEGORY_LIST` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Category {
    #[serde(default)]
    pub uid: Option<i64>,
    #[validate(length(min = 1))]
    pub category_name: String,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub is_sponsor: bool,
}

impl Entity for Category {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryApiModel {
    pub uid: Option<i64>,
    pub category_name: String,
    #[serde(default)]
    pub is_sponsor: bool,
}

impl From<CategoryApiModel> for Category {
    fn from(api: CategoryApiModel) -> Self {
        Self {
            uid: api.uid,
            category_name: api.category_name,
            is_sponsor: api.is_sponsor,
        }
    }
}
