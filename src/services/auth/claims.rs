use serde::{Deserialize, Serialize};

/// Access token claims. `sub` is the user id (UUID string).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Refresh token claims. Carries nothing but the subject and its own identity,
/// so two tokens minted within the same second still differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}
