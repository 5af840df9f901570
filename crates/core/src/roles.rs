//! Authorization levels, ordered from least to most privileged.
//!
//! The names are the ones stored in user claims and used as ACL role names,
//! so they must not change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthLevel {
    Participant,
    Volunteer,
    TeamMember,
    Director,
    Technology,
    Finance,
}

impl AuthLevel {
    pub const ALL: [AuthLevel; 6] = [
        AuthLevel::Participant,
        AuthLevel::Volunteer,
        AuthLevel::TeamMember,
        AuthLevel::Director,
        AuthLevel::Technology,
        AuthLevel::Finance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuthLevel::Participant => "PARTICIPANT",
            AuthLevel::Volunteer => "VOLUNTEER",
            AuthLevel::TeamMember => "TEAM_MEMBER",
            AuthLevel::Director => "DIRECTOR",
            AuthLevel::Technology => "TECHNOLOGY",
            AuthLevel::Finance => "FINANCE",
        }
    }

    /// Numeric privilege as stored in auth claims (`PARTICIPANT = 0`).
    pub fn privilege(self) -> u8 {
        self as u8
    }

    pub fn from_privilege(privilege: u8) -> Option<Self> {
        Self::ALL.get(usize::from(privilege)).copied()
    }
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown auth level: {s}"))
    }
}
