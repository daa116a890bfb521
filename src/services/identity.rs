use std::sync::Arc;
use tracing::warn;

use crate::{models::profile::ActorIdentity, services::profile::ProfileStore};

pub const ANONYMOUS: &str = "Anonymous";

/// Picks the first non-empty candidate: profile nickname, provider username,
/// provider full name, email local part, then `"Anonymous"`.
pub fn display_name(nickname: Option<&str>, actor: &ActorIdentity) -> String {
    [
        nickname,
        actor.preferred_username.as_deref(),
        actor.full_name.as_deref(),
        actor.email_local_part(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|candidate| !candidate.is_empty())
    .unwrap_or(ANONYMOUS)
    .to_string()
}

/// Resolves the author name stamped on new posts, comments and mods.
#[derive(Clone)]
pub struct IdentityResolver {
    profiles: Arc<dyn ProfileStore>,
}

impl IdentityResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Looks the profile up on every call. A failed lookup counts as "no
    /// nickname".
    pub async fn resolve(&self, actor: &ActorIdentity) -> String {
        let nickname = match self.profiles.get_profile(&actor.id).await {
            Ok(profile) => profile.and_then(|p| p.nickname),
            Err(e) => {
                warn!("Profile lookup failed for {}: {}", actor.id, e);
                None
            }
        };

        display_name(nickname.as_deref(), actor)
    }
}
