use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{AppError, Result},
    models::profile::{ActorIdentity, Profile},
    utils::validation::validate_nickname,
};

/// Postgres unique-violation code surfaced by PostgREST.
const UNIQUE_VIOLATION: &str = "23505";

/// The hosted `profiles` table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, actor_id: &str) -> Result<Option<Profile>>;

    /// Fails with `Conflict` when another profile already uses `nickname`.
    async fn set_nickname(&self, actor_id: &str, nickname: &str) -> Result<Profile>;
}

/// Profiles kept for the life of the process. Nicknames are unique.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, Profile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, actor_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.get(actor_id).map(|entry| entry.value().clone()))
    }

    async fn set_nickname(&self, actor_id: &str, nickname: &str) -> Result<Profile> {
        let taken = self.profiles.iter().any(|entry| {
            entry.key() != actor_id && entry.value().nickname.as_deref() == Some(nickname)
        });
        if taken {
            return Err(AppError::conflict("Nickname is already in use"));
        }

        let mut entry = self
            .profiles
            .entry(actor_id.to_string())
            .or_insert_with(|| Profile {
                id: actor_id.to_string(),
                nickname: None,
                avatar_url: None,
            });
        entry.nickname = Some(nickname.to_string());
        Ok(entry.value().clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRow {
    id: String,
    nickname: Option<String>,
    avatar_url: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            nickname: row.nickname,
            avatar_url: row.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// PostgREST client for `/rest/v1/profiles`.
#[derive(Clone)]
pub struct RemoteProfileStore {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteProfileStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config
            .profile_service_url
            .clone()
            .ok_or_else(|| AppError::internal("PROFILE_SERVICE_URL must be set for remote profiles"))?;
        let key = config
            .profile_service_key
            .clone()
            .ok_or_else(|| AppError::internal("PROFILE_SERVICE_KEY must be set for remote profiles"))?;
        Ok(Self::new(url, key))
    }

    fn profiles_url(&self, actor_id: &str) -> String {
        format!("{}/rest/v1/profiles?id=eq.{}", self.base_url, actor_id)
    }

    fn classify_failure(status: StatusCode, body: &str) -> AppError {
        let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
        let code = parsed.as_ref().and_then(|e| e.code.as_deref());
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| body.to_string());

        if status == StatusCode::CONFLICT
            || code == Some(UNIQUE_VIOLATION)
            || message.to_lowercase().contains("unique")
        {
            return AppError::conflict("Nickname is already in use");
        }

        AppError::ExternalService(format!("Profile store returned {}: {}", status, message))
    }
}

#[async_trait]
impl ProfileStore for RemoteProfileStore {
    async fn get_profile(&self, actor_id: &str) -> Result<Option<Profile>> {
        let url = format!("{}&select=id,nickname,avatar_url", self.profiles_url(actor_id));
        debug!("Fetching profile for {}", actor_id);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        let rows: Vec<ProfileRow> = response.json().await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn set_nickname(&self, actor_id: &str, nickname: &str) -> Result<Profile> {
        let response = self
            .http_client
            .patch(self.profiles_url(actor_id))
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "nickname": nickname }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        let rows: Vec<ProfileRow> = response.json().await?;
        rows.into_iter()
            .next()
            .map(Profile::from)
            .ok_or_else(|| AppError::not_found("Profile"))
    }
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    min_nickname_length: usize,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, min_nickname_length: usize) -> Self {
        Self {
            store,
            min_nickname_length,
        }
    }

    /// Stored profile, or one built from the provider metadata when the
    /// actor has no row yet.
    pub async fn get_profile(&self, actor: Option<&ActorIdentity>) -> Result<Profile> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required"))?;

        if let Some(profile) = self.store.get_profile(&actor.id).await? {
            return Ok(profile);
        }

        debug!("No stored profile for {}, using provider metadata", actor.id);
        Ok(Profile {
            id: actor.id.clone(),
            nickname: actor
                .preferred_username
                .clone()
                .or_else(|| actor.full_name.clone())
                .filter(|name| !name.trim().is_empty()),
            avatar_url: actor.avatar_url.clone(),
        })
    }

    pub async fn update_nickname(
        &self,
        actor: Option<&ActorIdentity>,
        nickname: &str,
    ) -> Result<Profile> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required"))?;
        let nickname = validate_nickname(nickname, self.min_nickname_length)?;

        match self.store.set_nickname(&actor.id, &nickname).await {
            Ok(profile) => {
                info!("Nickname updated for {}", actor.id);
                Ok(profile)
            }
            Err(e @ AppError::Conflict(_)) => Err(e),
            Err(e) => {
                warn!("Nickname update failed for {}: {}", actor.id, e);
                Err(AppError::ExternalService(e.to_string()))
            }
        }
    }
}
