use hackpsu_core::types::{new_uid, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// Interest sign-up collected before registration opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PreRegistration {
    pub uid: Uid,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for PreRegistration {}

impl PreRegistration {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            uid: new_uid(),
            email: email.into(),
            hackathon: None,
        }
    }
}
