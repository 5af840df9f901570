use hackpsu_core::types::flexible;
use serde::{Deserialize, Serialize};

use crate::Record;

/// Headcounts across the participant funnel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub preregistration_count: Option<i64>,
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub registration_count: Option<i64>,
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub rsvp_count: Option<i64>,
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub checkin_count: Option<i64>,
}

/// One registrant joined with their pre-registration, hackathon, RSVP
/// and wristband rows. Column set follows the query projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    #[serde(flatten)]
    pub columns: Record,
}
