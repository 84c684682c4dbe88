use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::repos::user_repo::{UserProfile, UserStore};
use crate::services::auth::claims::AccessClaims;
use crate::services::auth::jwt::JwtCodec;

/// Verifies access tokens and resolves them to a user profile.
///
/// Read-only: never writes to the user store.
#[derive(Clone)]
pub struct RequestAuthorizer {
    access: JwtCodec,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for RequestAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthorizer")
            .field("access", &self.access)
            .finish()
    }
}

impl RequestAuthorizer {
    pub fn new(config: &AuthConfig, users: Arc<dyn UserStore>) -> Self {
        Self {
            access: JwtCodec::hs256(
                &config.access_token_secret,
                config.access_token_ttl_seconds,
                config.leeway_seconds,
            ),
            users,
        }
    }

    /// - no token → `Unauthorized`
    /// - bad signature / expired / malformed / unknown subject → `InvalidCredential`
    pub async fn authorize(&self, token: Option<&str>) -> Result<UserProfile, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let claims: AccessClaims = self.access.verify(token).map_err(|reason| {
            warn!(error = %reason, "access token verification failed");
            AppError::invalid_credential(reason.to_string())
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            warn!(sub = %claims.sub, "access token subject is not a UUID");
            AppError::invalid_credential("Invalid access token")
        })?;

        let profile = self.users.find_profile_by_id(user_id).await?.ok_or_else(|| {
            debug!(user_id = %user_id, "access token subject not found");
            AppError::invalid_credential("Invalid access token")
        })?;

        Ok(profile)
    }
}
