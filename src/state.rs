/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: accounts, tokens, authorizer, products, cookie policy
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - store の実装 (Postgres / in-memory) は呼び出し側が選んで注入する
 */
use std::sync::Arc;

use crate::api::v1::cookies::CookiePolicy;
use crate::config::AuthConfig;
use crate::repos::{product_repo::ProductStore, user_repo::UserStore};
use crate::services::account::AccountService;
use crate::services::auth::{RequestAuthorizer, TokenIssuer, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub tokens: Arc<TokenService>,
    pub authorizer: Arc<RequestAuthorizer>,
    pub products: Arc<dyn ProductStore>,
    pub cookies: CookiePolicy,
}

impl AppState {
    pub fn new(
        auth: &AuthConfig,
        cookies: CookiePolicy,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        let issuer = TokenIssuer::new(auth, users.clone());
        let tokens = Arc::new(TokenService::new(issuer, users.clone()));
        let authorizer = Arc::new(RequestAuthorizer::new(auth, users.clone()));
        let accounts = AccountService::new(users, tokens.clone());

        Self {
            accounts,
            tokens,
            authorizer,
            products,
            cookies,
        }
    }
}
