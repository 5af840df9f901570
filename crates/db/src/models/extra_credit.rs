use hackpsu_core::types::Uid;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A participant's claim of extra credit for a class, in
/// `EXTRA_CREDIT_ASSIGNMENT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExtraCreditAssignment {
    #[serde(default)]
    pub uid: Option<i64>,
    #[validate(length(min = 1))]
    pub user_uid: Uid,
    pub class_uid: i64,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for ExtraCreditAssignment {}

/// A class offering extra credit, in `EXTRA_CREDIT_CLASSES`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExtraCreditClass {
    #[serde(default)]
    pub uid: Option<i64>,
    #[validate(length(min = 1))]
    pub class_name: String,
}

impl Entity for ExtraCreditClass {}
