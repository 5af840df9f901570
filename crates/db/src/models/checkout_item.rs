use hackpsu_core::types::flexible;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// A row from the `CHECKOUT_ITEMS` table. `available` is only present on
/// availability reads, where it is computed as `quantity` minus the
/// outstanding checkouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CheckoutItem {
    #[serde(default)]
    pub uid: Option<i64>,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub available: Option<i64>,
}

impl Entity for CheckoutItem {
    const EXCLUDED: &'static [&'static str] = &["available"];
}

impl CheckoutItem {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            uid: None,
            name: name.into(),
            quantity,
            available: None,
        }
    }
}
