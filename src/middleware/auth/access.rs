//! access token 検証 → AuthCtx を extensions に入れる
//!
//! - token は `accessToken` cookie を優先し、無ければ `Authorization: Bearer <jwt>` を使う
//! - 署名 / exp の検証とユーザー解決は `RequestAuthorizer` に委譲する
//! - 失敗時は handler に到達させず、そのまま AppError を返す

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::v1::cookies::{ACCESS_TOKEN_COOKIE, token_from_jar};
use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// 保護対象の Router に認証を掛ける。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/products", get(list_products));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // route_layer: マッチしたルートにだけ掛ける (未定義パスは 404 のまま)
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token_from(req.headers());

    let user = state.authorizer.authorize(token.as_deref()).await?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(user));

    Ok(next.run(req).await)
}

/// Cookie takes precedence over the Authorization header.
pub fn access_token_from(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(token) = token_from_jar(&jar, ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
