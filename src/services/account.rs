/*
 * Responsibility
 * - register / login のユースケース
 * - email の正規化、重複チェック、password hash (Argon2id) の検証
 * - login 成功時は TokenService にトークン発行を委譲する
 */
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, UserProfile, UserStore};
use crate::services::auth::password;
use crate::services::auth::{IssuedTokenPair, TokenService};

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<UserProfile, AppError> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User with the given email already exists"));
        }

        let password_hash = hash_off_thread(password.to_string()).await?;

        let profile = self
            .users
            .insert(NewUser {
                email,
                full_name: full_name.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                RepoError::Conflict => {
                    AppError::conflict("User with the given email already exists")
                }
                other => AppError::from(other),
            })?;

        info!(user_id = %profile.id, "user registered");
        Ok(profile)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserProfile, IssuedTokenPair), AppError> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("No such user exists!"))?;

        let valid = verify_off_thread(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            warn!(user_id = %user.profile.id, "login with incorrect password");
            return Err(AppError::invalid_credential("Password incorrect"));
        }

        let pair = self.tokens.issue_token_pair(&user.profile).await?;
        info!(user_id = %user.profile.id, "user logged in");

        Ok((user.profile, pair))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|_| AppError::Internal)?
}

async fn verify_off_thread(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|_| AppError::Internal)?
}
