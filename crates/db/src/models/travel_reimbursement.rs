//! Travel reimbursement requests, one per participant per hackathon.

use hackpsu_core::types::{flexible, new_uid, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// Size of the group travelling together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupMembers {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4+")]
    FourOrMore,
}

/// A row from the `TRAVEL_REIMBURSEMENT` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TravelReimbursement {
    #[validate(length(min = 1))]
    pub uid: Uid,
    #[validate(length(min = 1))]
    pub fullname: String,
    #[validate(range(min = 0.0))]
    #[serde(default, deserialize_with = "flexible::float")]
    pub reimbursement_amount: f64,
    #[validate(length(min = 1))]
    pub mailing_address: String,
    pub group_members: GroupMembers,
    #[validate(length(min = 1))]
    pub user_id: Uid,
    /// Comma-separated receipt locations.
    #[serde(default)]
    pub receipt_uris: Option<String>,
    #[serde(default)]
    pub hackathon: Option<Uid>,
}

impl Entity for TravelReimbursement {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelReimbursementApiModel {
    /// The requesting participant.
    pub uid: Option<Uid>,
    pub full_name: String,
    #[serde(default)]
    pub reimbursement_amount: Option<f64>,
    pub mailing_address: String,
    pub group_members: GroupMembers,
    #[serde(rename = "receiptURIs", default)]
    pub receipt_uris: Option<String>,
}

impl From<TravelReimbursementApiModel> for TravelReimbursement {
    /// The request is keyed by the participant's uid; a fresh id is
    /// generated only when none is supplied.
    fn from(api: TravelReimbursementApiModel) -> Self {
        let user_id = api.uid.unwrap_or_default();
        Self {
            uid: if user_id.is_empty() { new_uid() } else { user_id.clone() },
            fullname: api.full_name,
            reimbursement_amount: api.reimbursement_amount.unwrap_or(0.0),
            mailing_address: api.mailing_address,
            group_members: api.group_members,
            user_id,
            receipt_uris: api.receipt_uris,
            hackathon: None,
        }
    }
}
