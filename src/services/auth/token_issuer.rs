use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::repos::user_repo::{StoredSession, UserProfile, UserStore};
use crate::services::auth::claims::{AccessClaims, RefreshClaims};
use crate::services::auth::jwt::{JwtCodec, TokenRejection};

/// Access + refresh token pair handed back to the client.
#[derive(Clone, Debug)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: u64,
    pub refresh_expires_in: u64,
}

/// Mints access/refresh pairs and records the refresh token as the user's only
/// active session.
///
/// This is the only writer of `StoredSession::Active`.
#[derive(Clone)]
pub struct TokenIssuer {
    access: JwtCodec,
    refresh: JwtCodec,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access", &self.access)
            .field("refresh", &self.refresh)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig, users: Arc<dyn UserStore>) -> Self {
        Self {
            access: JwtCodec::hs256(
                &config.access_token_secret,
                config.access_token_ttl_seconds,
                config.leeway_seconds,
            ),
            refresh: JwtCodec::hs256(
                &config.refresh_token_secret,
                config.refresh_token_ttl_seconds,
                config.leeway_seconds,
            ),
            users,
        }
    }

    #[cfg(test)]
    pub fn access_codec(&self) -> &JwtCodec {
        &self.access
    }

    #[cfg(test)]
    pub fn refresh_codec(&self) -> &JwtCodec {
        &self.refresh
    }

    /// Check signature and expiry of a presented refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenRejection> {
        self.refresh.verify(token)
    }

    /// Issue a new pair for `user` and overwrite the stored session.
    ///
    /// If the session write fails nothing is returned, so neither token can be used as
    /// the current session.
    pub async fn issue(&self, user: &UserProfile) -> Result<IssuedTokenPair, AppError> {
        let now = Utc::now();
        let iat = now.timestamp();
        let access_exp = expiry(iat, self.access.ttl_seconds()).ok_or_else(|| {
            error!(user_id = %user.id, "access token expiry out of range");
            AppError::TokenGenerationFailure
        })?;
        let refresh_exp = expiry(iat, self.refresh.ttl_seconds()).ok_or_else(|| {
            error!(user_id = %user.id, "refresh token expiry out of range");
            AppError::TokenGenerationFailure
        })?;

        let access_claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat,
            exp: access_exp,
            jti: Uuid::new_v4().to_string(),
        };
        let refresh_claims = RefreshClaims {
            sub: user.id.to_string(),
            iat,
            exp: refresh_exp,
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = self.access.sign(&access_claims).map_err(|e| {
            error!(user_id = %user.id, error = %e, "failed to sign access token");
            AppError::TokenGenerationFailure
        })?;
        let refresh_token = self.refresh.sign(&refresh_claims).map_err(|e| {
            error!(user_id = %user.id, error = %e, "failed to sign refresh token");
            AppError::TokenGenerationFailure
        })?;

        let session = StoredSession::Active {
            refresh_token_digest: refresh_token_digest(&refresh_token),
            issued_at: now,
        };

        match self.users.set_session(user.id, session).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user.id, "user vanished before session could be stored");
                return Err(AppError::TokenGenerationFailure);
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "failed to store refresh session");
                return Err(AppError::TokenGenerationFailure);
            }
        }

        debug!(
            user_id = %user.id,
            access_ttl_seconds = self.access.ttl_seconds(),
            refresh_ttl_seconds = self.refresh.ttl_seconds(),
            "issued token pair"
        );

        Ok(IssuedTokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.access.ttl_seconds(),
            refresh_expires_in: self.refresh.ttl_seconds(),
        })
    }
}

fn expiry(iat: i64, ttl_seconds: u64) -> Option<i64> {
    i64::try_from(ttl_seconds).ok()?.checked_add(iat)
}

/// sha256(token) as unpadded base64url. Only the digest is persisted.
pub fn refresh_token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory::MemoryUserStore;
    use crate::test_support::auth_config;

    #[tokio::test]
    async fn issued_tokens_verify_against_their_own_secret() {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        let issuer = TokenIssuer::new(&auth_config(), Arc::new(users.clone()));

        let pair = issuer.issue(&alice).await.unwrap();

        let access: AccessClaims = issuer.access_codec().verify(&pair.access_token).unwrap();
        let refresh: RefreshClaims = issuer.refresh_codec().verify(&pair.refresh_token).unwrap();
        assert_eq!(access.sub, alice.id.to_string());
        assert_eq!(refresh.sub, alice.id.to_string());
        assert_eq!(access.email, "alice@example.com");
        assert_eq!(pair.expires_in, 600);

        // Not interchangeable.
        assert!(
            issuer
                .refresh_codec()
                .verify::<RefreshClaims>(&pair.access_token)
                .is_err()
        );
        assert!(
            issuer
                .access_codec()
                .verify::<AccessClaims>(&pair.refresh_token)
                .is_err()
        );
    }

    #[tokio::test]
    async fn issue_stores_digest_of_refresh_token() {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        let issuer = TokenIssuer::new(&auth_config(), Arc::new(users.clone()));

        let pair = issuer.issue(&alice).await.unwrap();

        match users.session_of(alice.id).await.unwrap() {
            StoredSession::Active {
                refresh_token_digest: digest,
                ..
            } => {
                assert_eq!(digest, refresh_token_digest(&pair.refresh_token));
                assert_ne!(digest, pair.refresh_token);
            }
            StoredSession::None => panic!("expected an active session"),
        }
    }

    #[tokio::test]
    async fn reissue_overwrites_previous_session() {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        let issuer = TokenIssuer::new(&auth_config(), Arc::new(users.clone()));

        let first = issuer.issue(&alice).await.unwrap();
        let second = issuer.issue(&alice).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        let Some(StoredSession::Active {
            refresh_token_digest: digest,
            ..
        }) = users.session_of(alice.id).await
        else {
            panic!("expected an active session");
        };
        assert_eq!(digest, refresh_token_digest(&second.refresh_token));
    }

    #[tokio::test]
    async fn storage_failure_is_token_generation_failure() {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        users.fail_writes(true);
        let issuer = TokenIssuer::new(&auth_config(), Arc::new(users.clone()));

        let err = issuer.issue(&alice).await.unwrap_err();
        assert!(matches!(err, AppError::TokenGenerationFailure));
        assert_eq!(users.session_of(alice.id).await, Some(StoredSession::None));
    }

    #[tokio::test]
    async fn unknown_user_is_token_generation_failure() {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        let ghost = UserProfile {
            id: Uuid::new_v4(),
            ..alice
        };
        let issuer = TokenIssuer::new(&auth_config(), Arc::new(users));

        let err = issuer.issue(&ghost).await.unwrap_err();
        assert!(matches!(err, AppError::TokenGenerationFailure));
    }

    #[tokio::test]
    async fn unrepresentable_ttl_fails_without_session_write() {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        let config = AuthConfig {
            refresh_token_ttl_seconds: u64::MAX,
            ..auth_config()
        };
        let issuer = TokenIssuer::new(&config, Arc::new(users.clone()));

        let err = issuer.issue(&alice).await.unwrap_err();
        assert!(matches!(err, AppError::TokenGenerationFailure));
        assert_eq!(users.session_of(alice.id).await, Some(StoredSession::None));
    }

    #[test]
    fn expiry_rejects_overflow() {
        assert_eq!(expiry(1_000, 600), Some(1_600));
        assert_eq!(expiry(1_000, u64::MAX), None);
        assert_eq!(expiry(1_000, i64::MAX as u64), None);
    }

    #[test]
    fn digest_is_stable_and_unpadded() {
        let a = refresh_token_digest("token");
        assert_eq!(a, refresh_token_digest("token"));
        assert_ne!(a, refresh_token_digest("token2"));
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }
}
