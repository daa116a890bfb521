use serde::{Deserialize, Serialize};

/// The signed-in user, normalized once from the identity provider's token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActorIdentity {
    pub id: String,
    pub email: Option<String>,
    pub preferred_username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ActorIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Substring of the email before `@`, if there is a non-empty one.
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
    }
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNicknameRequest {
    pub nickname: String,
}
