//! Staff roster model.

use hackpsu_core::types::Uid;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A row from the `ORGANIZERS` table, keyed by the organizer's auth uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Organizer {
    #[validate(length(min = 1))]
    pub uid: Uid,
    #[validate(length(min = 1))]
    pub firstname: String,
    #[validate(length(min = 1))]
    pub lastname: String,
    #[validate(email)]
    pub email: String,
    /// Numeric privilege level, as stored in the auth claims.
    #[serde(default)]
    pub privilege: Option<i64>,
}

impl Entity for Organizer {}
