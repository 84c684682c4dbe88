//! Shared fixtures for `#[cfg(test)]` modules.
use crate::config::AuthConfig;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        access_token_secret: ACCESS_SECRET.into(),
        access_token_ttl_seconds: 600,
        refresh_token_secret: REFRESH_SECRET.into(),
        refresh_token_ttl_seconds: 3600,
        leeway_seconds: 0,
    }
}
