/*
 * Responsibility
 * - GET /health (疎通用)
 * - access middleware の外に置く
 */
use crate::api::v1::response::{ApiResponse, Empty};

pub async fn health() -> ApiResponse<Empty> {
    ApiResponse::ok(Empty {}, "ok")
}
