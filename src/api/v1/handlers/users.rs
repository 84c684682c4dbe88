/*
 * Responsibility
 * - /users 系 handler (register / login / refresh-token / logout)
 * - DTO validation → AccountService / TokenService 呼び出し
 * - 発行したトークンは body と cookie の両方で返す
 */
use axum::{body::Bytes, extract::State};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    api::v1::{
        cookies::{REFRESH_TOKEN_COOKIE, token_from_jar},
        dto::users::{
            LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, TokenPairResponse,
            UserResponse,
        },
        extractors::{AuthCtxExtractor, JsonBody},
        response::{ApiResponse, Empty},
    },
    error::AppError,
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let profile = state
        .accounts
        .register(&req.email, &req.full_name, &req.password)
        .await?;

    Ok(ApiResponse::created(
        profile.into(),
        "User registered successfully",
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let (profile, pair) = state.accounts.login(&req.email, &req.password).await?;
    let jar = state.cookies.set_tokens(jar, &pair);

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: profile.into(),
                tokens: pair.into(),
            },
            "Logged in successfully",
        ),
    ))
}

/// The `refreshToken` cookie wins; the JSON body is only read when the cookie is absent.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<TokenPairResponse>), AppError> {
    let presented = match token_from_jar(&jar, REFRESH_TOKEN_COOKIE) {
        Some(token) => Some(token),
        None => refresh_token_from_body(&body)?,
    };

    let (_, pair) = state.tokens.refresh(presented.as_deref()).await?;
    let jar = state.cookies.set_tokens(jar, &pair);

    Ok((jar, ApiResponse::ok(pair.into(), "Access token refreshed")))
}

pub async fn logout(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>), AppError> {
    state.tokens.logout(ctx.user_id()).await?;
    let jar = state.cookies.clear_tokens(jar);

    Ok((jar, ApiResponse::ok(Empty {}, "User logged out")))
}

fn refresh_token_from_body(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let req: RefreshRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))?;
    Ok(req.refresh_token)
}
