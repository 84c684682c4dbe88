/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON envelope)
 * - RepoError / validation error / auth error を統一的に変換
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;
use crate::repos::error::RepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { message: String },

    /// No credential was presented at all.
    #[error("Unauthorized request")]
    Unauthorized,

    /// Signature, expiry or subject lookup failed. Carries the reason.
    #[error("{0}")]
    InvalidCredential(String),

    /// Refresh token verified but is no longer the one stored for the user.
    #[error("Refresh token is expired or used")]
    CredentialExpiredOrReused,

    #[error("{0}")]
    NotFound(String),

    /// Request rejected before reaching a handler (unsupported media type, body too large).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Something went wrong while generating access and refresh token")]
    TokenGenerationFailure,

    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn invalid_credential(reason: impl Into<String>) -> Self {
        Self::InvalidCredential(reason.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized
            | AppError::InvalidCredential(_)
            | AppError::CredentialExpiredOrReused => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected { status, .. } => *status,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TokenGenerationFailure | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::failure(self.status(), self.to_string()).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("conflict"),
            RepoError::Db(e) => {
                tracing::error!(error = %e, "repository failure");
                AppError::Internal
            }
        }
    }
}
