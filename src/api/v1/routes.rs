/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - public (health, register, login, refresh-token) と protected (logout, products) を merge
 * - protected 側にだけ access middleware を route_layer で掛ける
 */
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    products::{add_product, list_products, remove_product, update_product},
    users::{login, logout, refresh_token, register},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/refresh-token", post(refresh_token));

    let protected = Router::new()
        .route("/users/logout", post(logout))
        .route("/products", get(list_products))
        .route("/products/add-product", post(add_product))
        .route("/products/update-product", put(update_product))
        .route("/products/remove-product", delete(remove_product));
    let protected = middleware::auth::access::apply(protected, state);

    public.merge(protected)
}
