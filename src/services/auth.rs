use crate::{
    config::Config,
    error::{AppError, Result},
    models::profile::ActorIdentity,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    jwt_audience: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Provider-side profile fields carried in the token.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    pub preferred_username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_audience: config.jwt_audience.clone(),
        }
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(audience) = &self.jwt_audience {
            validation.set_audience(&[audience.as_str()]);
        }

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    pub fn identity_from_token(&self, token: &str) -> Result<ActorIdentity> {
        Ok(ActorIdentity::from(self.verify_jwt(token)?))
    }
}

impl From<Claims> for ActorIdentity {
    fn from(claims: Claims) -> Self {
        ActorIdentity {
            id: claims.sub,
            email: claims.email,
            preferred_username: claims.user_metadata.preferred_username,
            full_name: claims.user_metadata.full_name,
            avatar_url: claims.user_metadata.avatar_url,
        }
    }
}
