/*
 * Responsibility
 * - cart_products の永続化インターフェース (ProductStore) と Postgres 実装
 * - 全操作を user_id でスコープする (他ユーザーの cart には触れない)
 */
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    #[serde(rename = "electronics")]
    Electronics,
    #[serde(rename = "jewelery")]
    Jewelery,
    #[serde(rename = "men's clothing")]
    MensClothing,
    #[serde(rename = "women's clothing")]
    WomensClothing,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::Jewelery,
        Category::MensClothing,
        Category::WomensClothing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Jewelery => "jewelery",
            Category::MensClothing => "men's clothing",
            Category::WomensClothing => "women's clothing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: Uuid,
    pub product_id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub price: f64,
    pub discount: f64,
    pub quantity: i32,
    pub rating: f64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub price: f64,
    pub discount: f64,
    pub quantity: i32,
    pub rating: f64,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<ProductRecord>>;

    async fn find(&self, user_id: Uuid, product_id: i64) -> RepoResult<Option<ProductRecord>>;

    /// Returns `RepoError::Conflict` when the product is already in this user's cart.
    async fn insert(&self, user_id: Uuid, product: NewProduct) -> RepoResult<ProductRecord>;

    async fn update_quantity(
        &self,
        user_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> RepoResult<Option<ProductRecord>>;

    async fn delete(&self, user_id: Uuid, product_id: i64) -> RepoResult<bool>;
}

#[derive(Debug, FromRow)]
struct ProductRow {
    cart_product_id: Uuid,
    product_id: i64,
    title: String,
    description: String,
    image: String,
    category: String,
    price: f64,
    discount: f64,
    quantity: i32,
    rating: f64,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<Category>().map_err(|e| {
            RepoError::Db(sqlx::Error::Decode(
                format!("unknown category in cart_products: {}", e.0).into(),
            ))
        })?;

        Ok(Self {
            id: row.cart_product_id,
            product_id: row.product_id,
            title: row.title,
            description: row.description,
            image: row.image,
            category,
            price: row.price,
            discount: row.discount,
            quantity: row.quantity,
            rating: row.rating,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = r#"
    cart_product_id, product_id, title, description, image, category,
    price, discount, quantity, rating, user_id, created_at, updated_at
"#;

#[derive(Clone, Debug)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM cart_products WHERE user_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ProductRecord::try_from).collect()
    }

    async fn find(&self, user_id: Uuid, product_id: i64) -> RepoResult<Option<ProductRecord>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM cart_products WHERE user_id = $1 AND product_id = $2"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn insert(&self, user_id: Uuid, product: NewProduct) -> RepoResult<ProductRecord> {
        let sql = format!(
            r#"
            INSERT INTO cart_products (
                cart_product_id, user_id, product_id, title, description, image,
                category, price, discount, quantity, rating
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(product.product_id)
            .bind(&product.title)
            .bind(&product.description)
            .bind(&product.image)
            .bind(product.category.as_str())
            .bind(product.price)
            .bind(product.discount)
            .bind(product.quantity)
            .bind(product.rating)
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        ProductRecord::try_from(row)
    }

    async fn update_quantity(
        &self,
        user_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> RepoResult<Option<ProductRecord>> {
        let sql = format!(
            r#"
            UPDATE cart_products
            SET quantity = $3, updated_at = now()
            WHERE user_id = $1 AND product_id = $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn delete(&self, user_id: Uuid, product_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_products
            WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
