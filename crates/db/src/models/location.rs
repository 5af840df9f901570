use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A row from the `LOCATIONS` table; events reference it by `uid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Location {
    #[serde(default)]
    pub uid: Option<i64>,
    #[validate(length(min = 1))]
    pub location_name: String,
}

impl Entity for Location {}
