//! Token cookies (`accessToken` / `refreshToken`).
//!
//! Both are `HttpOnly` and, unless disabled for local development, `Secure`.
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::services::auth::IssuedTokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn set_tokens(&self, jar: CookieJar, pair: &IssuedTokenPair) -> CookieJar {
        jar.add(self.build(ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
            .add(self.build(REFRESH_TOKEN_COOKIE, pair.refresh_token.clone()))
    }

    /// Always emits expired cookies, even when the request authenticated with a header.
    pub fn clear_tokens(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal(ACCESS_TOKEN_COOKIE))
            .add(self.removal(REFRESH_TOKEN_COOKIE))
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new());
        cookie.make_removal();
        cookie
    }

    fn build(&self, name: &'static str, value: String) -> Cookie<'static> {
        // Cross-site cookies require Secure; fall back to Lax for plain-http development.
        let same_site = if self.secure {
            SameSite::None
        } else {
            SameSite::Lax
        };

        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
            .path("/")
            .build()
    }
}

/// Non-empty cookie value, if present.
pub fn token_from_jar(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}
