/*
 * Responsibility
 * - Cart products の request/response DTO
 * - 入力チェックを通ったものだけを NewProduct / quantity として repo に渡す
 * - owner (user_id) はレスポンスに含めない
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::product_repo::{Category, NewProduct, ProductRecord};

pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub quantity: Option<i64>,
    pub rating: Option<f64>,
}

impl AddProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct, String> {
        if [&self.title, &self.description, &self.image, &self.category]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err("All string fields are necessary and cannot be empty.".into());
        }

        let product_id = self.id.ok_or("The field id must be a valid number.")?;
        let price = finite("price", self.price)?;
        let discount = finite("discount", self.discount)?;
        let rating = finite("rating", self.rating)?;
        let quantity = quantity(self.quantity)?;

        let category = self.category.parse::<Category>().map_err(|_| {
            format!(
                "category must be one of: {}",
                Category::ALL.map(|c| c.as_str()).join(", ")
            )
        })?;

        Ok(NewProduct {
            product_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            category,
            price,
            discount,
            quantity,
            rating,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub id: Option<i64>,
    pub quantity: Option<i64>,
}

impl UpdateProductRequest {
    /// Returns `(product_id, quantity)`.
    pub fn validate(&self) -> Result<(i64, i32), String> {
        let product_id = self.id.ok_or("id is required")?;
        let quantity = self
            .quantity
            .ok_or("quantity is required to update product details")?;
        Ok((product_id, self::quantity(Some(quantity))?))
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveProductRequest {
    pub id: Option<i64>,
}

impl RemoveProductRequest {
    pub fn validate(&self) -> Result<i64, &'static str> {
        self.id.ok_or("id is required")
    }
}

fn finite(field: &str, value: Option<f64>) -> Result<f64, String> {
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("The field {field} must be a valid number."))
}

fn quantity(value: Option<i64>) -> Result<i32, String> {
    let q = value.ok_or("The field quantity must be a valid number.")?;
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&q) {
        return Err(format!(
            "quantity cannot be less than {MIN_QUANTITY} or more than {MAX_QUANTITY}"
        ));
    }
    // In range, so it fits.
    Ok(q as i32)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub price: f64,
    pub discount: f64,
    pub quantity: i32,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(p: ProductRecord) -> Self {
        Self {
            id: p.product_id,
            title: p.title,
            description: p.description,
            image: p.image,
            category: p.category,
            price: p.price,
            discount: p.discount,
            quantity: p.quantity,
            rating: p.rating,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// `{}` for an empty cart, `{ "allItems": [...] }` otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CartResponse {
    Empty {},
    Items {
        #[serde(rename = "allItems")]
        all_items: Vec<ProductResponse>,
    },
}
