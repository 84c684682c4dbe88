use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::user_repo::{StoredSession, UserProfile, UserStore};
use crate::services::auth::claims::RefreshClaims;
use crate::services::auth::token_issuer::{IssuedTokenPair, TokenIssuer, refresh_token_digest};

/// Service that orchestrates the session lifecycle on top of `TokenIssuer`.
///
/// - login: issue a pair (delegated to `TokenIssuer`)
/// - refresh: validate the presented refresh token against the stored session, then rotate
/// - logout: drop the stored session
///
/// Two concurrent refreshes with the same token can both pass the session check; the
/// pair written last is the one that stays valid.
#[derive(Clone)]
pub struct TokenService {
    issuer: TokenIssuer,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenService {
    pub fn new(issuer: TokenIssuer, users: Arc<dyn UserStore>) -> Self {
        Self { issuer, users }
    }

    pub async fn issue_token_pair(&self, user: &UserProfile) -> Result<IssuedTokenPair, AppError> {
        self.issuer.issue(user).await
    }

    /// Rotate a refresh token.
    ///
    /// - absent → `Unauthorized`
    /// - signature / expiry failure or unknown subject → `InvalidCredential`
    /// - not the currently stored session → `CredentialExpiredOrReused`
    pub async fn refresh(
        &self,
        presented: Option<&str>,
    ) -> Result<(UserProfile, IssuedTokenPair), AppError> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let claims: RefreshClaims = self.issuer.verify_refresh(presented).map_err(|reason| {
            warn!(error = %reason, "refresh token verification failed");
            AppError::invalid_credential(reason.to_string())
        })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::invalid_credential("Invalid refresh token"))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_credential("Invalid refresh token"))?;

        match &user.session {
            StoredSession::Active {
                refresh_token_digest: stored,
                ..
            } if *stored == refresh_token_digest(presented) => {}
            StoredSession::Active { issued_at, .. } => {
                warn!(
                    user_id = %user_id,
                    session_issued_at = %issued_at,
                    "refresh token does not match the active session"
                );
                return Err(AppError::CredentialExpiredOrReused);
            }
            StoredSession::None => {
                warn!(user_id = %user_id, "refresh attempted without an active session");
                return Err(AppError::CredentialExpiredOrReused);
            }
        }

        let pair = self.issuer.issue(&user.profile).await?;
        debug!(user_id = %user_id, "refresh token rotated");

        Ok((user.profile, pair))
    }

    /// Drop the stored session. Access tokens already issued stay valid until they expire.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        let found = self
            .users
            .set_session(user_id, StoredSession::None)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "failed to clear session");
                AppError::Internal
            })?;

        if !found {
            return Err(AppError::not_found("User not found"));
        }

        info!(user_id = %user_id, "user logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory::MemoryUserStore;
    use crate::services::auth::jwt::JwtCodec;
    use crate::test_support::{REFRESH_SECRET, auth_config};

    async fn setup() -> (MemoryUserStore, TokenService, UserProfile) {
        let users = MemoryUserStore::new();
        let alice = users.seed("alice@example.com", "Alice").await;
        let store: Arc<dyn UserStore> = Arc::new(users.clone());
        let issuer = TokenIssuer::new(&auth_config(), store.clone());
        (users, TokenService::new(issuer, store), alice)
    }

    #[tokio::test]
    async fn login_pair_decodes_to_same_user() {
        let (_, tokens, alice) = setup().await;
        let pair = tokens.issue_token_pair(&alice).await.unwrap();

        let codec = JwtCodec::hs256(REFRESH_SECRET, 0, 0);
        let refresh: RefreshClaims = codec.verify(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, alice.id.to_string());
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_reuse() {
        let (_, tokens, alice) = setup().await;

        let first = tokens.issue_token_pair(&alice).await.unwrap();
        let (user, second) = tokens.refresh(Some(&first.refresh_token)).await.unwrap();
        assert_eq!(user.id, alice.id);
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_ne!(second.access_token, first.access_token);

        let reused = tokens.refresh(Some(&first.refresh_token)).await.unwrap_err();
        assert!(matches!(reused, AppError::CredentialExpiredOrReused));

        let (_, third) = tokens.refresh(Some(&second.refresh_token)).await.unwrap();
        assert_ne!(third.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn second_login_invalidates_first_refresh_token() {
        let (_, tokens, alice) = setup().await;

        let first = tokens.issue_token_pair(&alice).await.unwrap();
        let second = tokens.issue_token_pair(&alice).await.unwrap();

        let err = tokens.refresh(Some(&first.refresh_token)).await.unwrap_err();
        assert!(matches!(err, AppError::CredentialExpiredOrReused));
        assert!(tokens.refresh(Some(&second.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_without_token_is_unauthorized() {
        let (_, tokens, _) = setup().await;
        assert!(matches!(
            tokens.refresh(None).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            tokens.refresh(Some("")).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn expired_refresh_token_is_rejected_without_rotation() {
        let (users, tokens, alice) = setup().await;
        let current = tokens.issue_token_pair(&alice).await.unwrap();
        let session_before = users.session_of(alice.id).await;

        let now = chrono::Utc::now().timestamp();
        let expired = JwtCodec::hs256(REFRESH_SECRET, 0, 0)
            .sign(&RefreshClaims {
                sub: alice.id.to_string(),
                iat: now - 7200,
                exp: now - 3600,
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();

        let err = tokens.refresh(Some(&expired)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(ref r) if r.contains("expired")));

        // Nothing was issued; the current session is untouched.
        assert_eq!(users.session_of(alice.id).await, session_before);
        assert!(tokens.refresh(Some(&current.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let (_, tokens, alice) = setup().await;
        let pair = tokens.issue_token_pair(&alice).await.unwrap();

        let err = tokens.refresh(Some(&pair.access_token)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn refresh_for_unknown_user_is_invalid_credential() {
        let (_, tokens, _) = setup().await;
        let now = chrono::Utc::now().timestamp();
        let orphan = JwtCodec::hs256(REFRESH_SECRET, 0, 0)
            .sign(&RefreshClaims {
                sub: Uuid::new_v4().to_string(),
                iat: now,
                exp: now + 600,
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();

        let err = tokens.refresh(Some(&orphan)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn logout_then_refresh_is_rejected() {
        let (users, tokens, alice) = setup().await;
        let pair = tokens.issue_token_pair(&alice).await.unwrap();

        tokens.logout(alice.id).await.unwrap();
        assert_eq!(users.session_of(alice.id).await, Some(StoredSession::None));

        let err = tokens.refresh(Some(&pair.refresh_token)).await.unwrap_err();
        assert!(matches!(err, AppError::CredentialExpiredOrReused));
    }

    #[tokio::test]
    async fn logout_for_unknown_user_is_not_found() {
        let (_, tokens, _) = setup().await;
        assert!(matches!(
            tokens.logout(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn refresh_surfaces_storage_failure_during_rotation() {
        let (users, tokens, alice) = setup().await;
        let pair = tokens.issue_token_pair(&alice).await.unwrap();

        users.fail_writes(true);
        let err = tokens.refresh(Some(&pair.refresh_token)).await.unwrap_err();
        assert!(matches!(err, AppError::TokenGenerationFailure));

        // The old token is still the stored one once storage recovers.
        users.fail_writes(false);
        assert!(tokens.refresh(Some(&pair.refresh_token)).await.is_ok());
    }
}
