/*
 * Responsibility
 * - /products 系 handler (cart の list / add / update / remove)
 * - user_id は AuthCtx から取り、他ユーザーの cart には触れない
 */
use axum::extract::State;
use tracing::info;

use crate::{
    api::v1::{
        dto::products::{
            AddProductRequest, CartResponse, ProductResponse, RemoveProductRequest,
            UpdateProductRequest,
        },
        extractors::{AuthCtxExtractor, JsonBody},
        response::{ApiResponse, Empty},
    },
    error::AppError,
    repos::error::RepoError,
    state::AppState,
};

const ALREADY_ADDED: &str = "This product has already been added";
const NOT_IN_CART: &str = "Product not found in the cart";

pub async fn list_products(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<ApiResponse<CartResponse>, AppError> {
    let items = state.products.list_by_user(ctx.user_id()).await?;

    if items.is_empty() {
        return Ok(ApiResponse::ok(CartResponse::Empty {}, "No product in the cart"));
    }

    Ok(ApiResponse::ok(
        CartResponse::Items {
            all_items: items.into_iter().map(ProductResponse::from).collect(),
        },
        "All products in the cart fetched successfully",
    ))
}

pub async fn add_product(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<AddProductRequest>,
) -> Result<ApiResponse<ProductResponse>, AppError> {
    let product = req.into_new_product().map_err(AppError::bad_request)?;
    let user_id = ctx.user_id();

    if state.products.find(user_id, product.product_id).await?.is_some() {
        return Err(AppError::conflict(ALREADY_ADDED));
    }

    let record = state
        .products
        .insert(user_id, product)
        .await
        .map_err(|e| match e {
            RepoError::Conflict => AppError::conflict(ALREADY_ADDED),
            other => AppError::from(other),
        })?;

    info!(user_id = %user_id, product_id = record.product_id, "product added to cart");
    Ok(ApiResponse::created(record.into(), "Product added successfully"))
}

pub async fn update_product(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<UpdateProductRequest>,
) -> Result<ApiResponse<ProductResponse>, AppError> {
    let (product_id, quantity) = req.validate().map_err(AppError::bad_request)?;

    let record = state
        .products
        .update_quantity(ctx.user_id(), product_id, quantity)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_IN_CART))?;

    Ok(ApiResponse::ok(record.into(), "Product updated successfully"))
}

pub async fn remove_product(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<RemoveProductRequest>,
) -> Result<ApiResponse<Empty>, AppError> {
    let product_id = req.validate().map_err(AppError::bad_request)?;

    if !state.products.delete(ctx.user_id(), product_id).await? {
        return Err(AppError::not_found(NOT_IN_CART));
    }

    info!(user_id = %ctx.user_id(), product_id, "product removed from cart");
    Ok(ApiResponse::ok(Empty {}, "Product deleted successfully"))
}
