//! Product row CRUD.

use std::collections::BTreeMap;

use moosicbox_json_utils::database::ToValue as _;
use salescraft_models::{Product, StockStatus};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{StoreError, exec, parse_timestamp, query};

/// Inserts a new product row.
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails.
pub async fn insert(db: &dyn Database, product: &Product) -> Result<(), StoreError> {
    let features_json = serde_json::to_string(&product.features)?;
    let specifications_json = serde_json::to_string(&product.specifications)?;

    exec(
        db,
        "INSERT INTO products (
            id, agent_id, name, description, detailed_description, price,
            currency, image_url, category, features, specifications,
            stock_status, sku, is_featured, is_active, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                   $14, $15, $16, $17)",
        &[
            DatabaseValue::String(product.id.clone()),
            DatabaseValue::String(product.agent_id.clone()),
            DatabaseValue::String(product.name.clone()),
            opt_string(&product.description),
            opt_string(&product.detailed_description),
            product
                .price
                .map_or(DatabaseValue::Null, DatabaseValue::Real64),
            DatabaseValue::String(product.currency.clone()),
            opt_string(&product.image_url),
            opt_string(&product.category),
            DatabaseValue::String(features_json),
            DatabaseValue::String(specifications_json),
            DatabaseValue::String(product.stock_status.to_string()),
            opt_string(&product.sku),
            DatabaseValue::Int32(i32::from(product.is_featured)),
            DatabaseValue::Int32(i32::from(product.is_active)),
            DatabaseValue::String(product.created_at.to_rfc3339()),
            DatabaseValue::String(product.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches a product by id. Returns `None` on a miss.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn get(db: &dyn Database, id: &str) -> Result<Option<Product>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM products WHERE id = $1",
        &[DatabaseValue::String(id.to_string())],
    )
    .await?;

    rows.first().map(parse_product_row).transpose()
}

/// Lists all products for an agent, newest first.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn list_by_agent(db: &dyn Database, agent_id: &str) -> Result<Vec<Product>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM products WHERE agent_id = $1 ORDER BY created_at DESC",
        &[DatabaseValue::String(agent_id.to_string())],
    )
    .await?;

    rows.iter().map(parse_product_row).collect()
}

/// Rewrites a product row (identity and `agent_id` are never rewritten).
/// Returns `false` if the product does not exist.
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails.
pub async fn update(db: &dyn Database, product: &Product) -> Result<bool, StoreError> {
    let features_json = serde_json::to_string(&product.features)?;
    let specifications_json = serde_json::to_string(&product.specifications)?;

    let updated = exec(
        db,
        "UPDATE products SET
            name = $1, description = $2, detailed_description = $3,
            price = $4, currency = $5, image_url = $6, category = $7,
            features = $8, specifications = $9, stock_status = $10,
            sku = $11, is_featured = $12, is_active = $13, updated_at = $14
         WHERE id = $15",
        &[
            DatabaseValue::String(product.name.clone()),
            opt_string(&product.description),
            opt_string(&product.detailed_description),
            product
                .price
                .map_or(DatabaseValue::Null, DatabaseValue::Real64),
            DatabaseValue::String(product.currency.clone()),
            opt_string(&product.image_url),
            opt_string(&product.category),
            DatabaseValue::String(features_json),
            DatabaseValue::String(specifications_json),
            DatabaseValue::String(product.stock_status.to_string()),
            opt_string(&product.sku),
            DatabaseValue::Int32(i32::from(product.is_featured)),
            DatabaseValue::Int32(i32::from(product.is_active)),
            DatabaseValue::String(product.updated_at.to_rfc3339()),
            DatabaseValue::String(product.id.clone()),
        ],
    )
    .await?;

    Ok(updated > 0)
}

/// Deletes a product. Returns `false` if it did not exist.
///
/// # Errors
///
/// Returns [`StoreError`] if the delete fails.
pub async fn delete(db: &dyn Database, id: &str) -> Result<bool, StoreError> {
    let deleted = exec(
        db,
        "DELETE FROM products WHERE id = $1",
        &[DatabaseValue::String(id.to_string())],
    )
    .await?;

    Ok(deleted > 0)
}

fn opt_string(value: &Option<String>) -> DatabaseValue {
    value
        .clone()
        .map_or(DatabaseValue::Null, DatabaseValue::String)
}

fn parse_product_row(row: &Row) -> Result<Product, StoreError> {
    let features_json: String = row.to_value("features").unwrap_or_default();
    let features: Vec<String> = serde_json::from_str(&features_json).unwrap_or_default();

    let specifications_json: String = row.to_value("specifications").unwrap_or_default();
    let specifications: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&specifications_json).unwrap_or_default();

    let stock_status: String = row.to_value("stock_status").unwrap_or_default();
    let is_featured: i32 = row.to_value("is_featured").unwrap_or(0);
    let is_active: i32 = row.to_value("is_active").unwrap_or(0);
    let created_at: String = row.to_value("created_at").unwrap_or_default();
    let updated_at: String = row.to_value("updated_at").unwrap_or_default();

    Ok(Product {
        id: row.to_value("id").unwrap_or_default(),
        agent_id: row.to_value("agent_id").unwrap_or_default(),
        name: row.to_value("name").unwrap_or_default(),
        description: row.to_value("description").unwrap_or(None),
        detailed_description: row.to_value("detailed_description").unwrap_or(None),
        price: row.to_value("price").unwrap_or(None),
        currency: row.to_value("currency").unwrap_or_default(),
        image_url: row.to_value("image_url").unwrap_or(None),
        category: row.to_value("category").unwrap_or(None),
        features,
        specifications,
        stock_status: stock_status.parse::<StockStatus>().unwrap_or_default(),
        sku: row.to_value("sku").unwrap_or(None),
        is_featured: is_featured != 0,
        is_active: is_active != 0,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}
