use hackpsu_core::roles::AuthLevel;
use hackpsu_core::types::{flexible, now_millis, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::Entity;

/// Delivery record of one outgoing email, in `EMAIL_HISTORY`.
/// `status` is `"200"` for delivered and `"207"` for failed messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmailHistory {
    pub sender: Uid,
    #[validate(email)]
    pub recipient: String,
    pub email_content: String,
    pub subject: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default, deserialize_with = "flexible::epoch")]
    pub time: EpochMillis,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl Entity for EmailHistory {
    const EXCLUDED: &'static [&'static str] = &["error"];
}

impl EmailHistory {
    pub fn delivered(
        sender: impl Into<Uid>,
        recipient: impl Into<String>,
        email_content: impl Into<String>,
        subject: impl Into<String>,
        recipient_name: Option<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            email_content: email_content.into(),
            subject: subject.into(),
            recipient_name,
            time: now_millis(),
            status: "200".into(),
            error: None,
        }
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = "207".into();
        self.error = Some(error.into());
        self
    }
}

/// A user account as seen by the authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub uid: Uid,
    pub email: Option<String>,
    /// Privilege currently granted by the provider's custom claims.
    pub privilege: Option<AuthLevel>,
}
