//! Agent row CRUD.

use moosicbox_json_utils::database::ToValue as _;
use salescraft_models::{Agent, ProductEntry, Tone};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{StoreError, exec, parse_timestamp, query};

/// Inserts a new agent row.
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails (including an
/// `index_namespace` uniqueness violation).
pub async fn insert(db: &dyn Database, agent: &Agent) -> Result<(), StoreError> {
    let products_json = serde_json::to_string(&agent.products)?;

    exec(
        db,
        "INSERT INTO agents (
            id, owner_id, name, company_name, company_description, tone,
            language, greeting_message, sales_strategy, products,
            index_namespace, is_active, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        &[
            DatabaseValue::String(agent.id.clone()),
            DatabaseValue::String(agent.owner_id.clone()),
            DatabaseValue::String(agent.name.clone()),
            DatabaseValue::String(agent.company_name.clone()),
            DatabaseValue::String(agent.company_description.clone()),
            DatabaseValue::String(agent.tone.to_string()),
            DatabaseValue::String(agent.language.clone()),
            opt_string(&agent.greeting_message),
            opt_string(&agent.sales_strategy),
            DatabaseValue::String(products_json),
            DatabaseValue::String(agent.index_namespace.clone()),
            DatabaseValue::Int32(i32::from(agent.is_active)),
            DatabaseValue::String(agent.created_at.to_rfc3339()),
            DatabaseValue::String(agent.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches an agent by id. Returns `None` on a miss.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn get(db: &dyn Database, id: &str) -> Result<Option<Agent>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM agents WHERE id = $1",
        &[DatabaseValue::String(id.to_string())],
    )
    .await?;

    rows.first().map(parse_agent_row).transpose()
}

/// Lists all agents belonging to an owner, newest first.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn list_by_owner(db: &dyn Database, owner_id: &str) -> Result<Vec<Agent>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM agents WHERE owner_id = $1 ORDER BY created_at DESC",
        &[DatabaseValue::String(owner_id.to_string())],
    )
    .await?;

    rows.iter().map(parse_agent_row).collect()
}

/// Updates a mutable agent row in place (identity and `index_namespace`
/// are never rewritten). Returns `false` if the agent does not exist.
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails.
pub async fn update(db: &dyn Database, agent: &Agent) -> Result<bool, StoreError> {
    let products_json = serde_json::to_string(&agent.products)?;

    let updated = exec(
        db,
        "UPDATE agents SET
            name = $1, company_name = $2, company_description = $3,
            tone = $4, language = $5, greeting_message = $6,
            sales_strategy = $7, products = $8, is_active = $9,
            updated_at = $10
         WHERE id = $11",
        &[
            DatabaseValue::String(agent.name.clone()),
            DatabaseValue::String(agent.company_name.clone()),
            DatabaseValue::String(agent.company_description.clone()),
            DatabaseValue::String(agent.tone.to_string()),
            DatabaseValue::String(agent.language.clone()),
            opt_string(&agent.greeting_message),
            opt_string(&agent.sales_strategy),
            DatabaseValue::String(products_json),
            DatabaseValue::Int32(i32::from(agent.is_active)),
            DatabaseValue::String(agent.updated_at.to_rfc3339()),
            DatabaseValue::String(agent.id.clone()),
        ],
    )
    .await?;

    Ok(updated > 0)
}

/// Deletes an agent and everything it owns: products, conversations,
/// training rows, and orders. Vector entries under the agent's
/// `index_namespace` are the caller's responsibility (the store has no
/// vector-index connection).
///
/// Returns `false` if the agent did not exist.
///
/// # Errors
///
/// Returns [`StoreError`] if any delete fails.
pub async fn delete(db: &dyn Database, id: &str) -> Result<bool, StoreError> {
    let params = [DatabaseValue::String(id.to_string())];

    // Child tables first; the FK cascade covers engines where PRAGMA
    // enforcement is active, the explicit deletes cover the rest.
    for sql in [
        "DELETE FROM products WHERE agent_id = $1",
        "DELETE FROM conversations WHERE agent_id = $1",
        "DELETE FROM training_data WHERE agent_id = $1",
        "DELETE FROM orders WHERE agent_id = $1",
    ] {
        exec(db, sql, &params).await?;
    }

    let deleted = exec(db, "DELETE FROM agents WHERE id = $1", &params).await?;

    Ok(deleted > 0)
}

fn opt_string(value: &Option<String>) -> DatabaseValue {
    value
        .clone()
        .map_or(DatabaseValue::Null, DatabaseValue::String)
}

fn parse_agent_row(row: &Row) -> Result<Agent, StoreError> {
    let products_json: String = row.to_value("products").unwrap_or_default();
    let products: Vec<ProductEntry> = serde_json::from_str(&products_json)?;

    let tone: String = row.to_value("tone").unwrap_or_default();
    let is_active: i32 = row.to_value("is_active").unwrap_or(0);
    let created_at: String = row.to_value("created_at").unwrap_or_default();
    let updated_at: String = row.to_value("updated_at").unwrap_or_default();

    Ok(Agent {
        id: row.to_value("id").unwrap_or_default(),
        owner_id: row.to_value("owner_id").unwrap_or_default(),
        name: row.to_value("name").unwrap_or_default(),
        company_name: row.to_value("company_name").unwrap_or_default(),
        company_description: row.to_value("company_description").unwrap_or_default(),
        tone: tone.parse::<Tone>().unwrap_or_default(),
        language: row.to_value("language").unwrap_or_default(),
        greeting_message: row.to_value("greeting_message").unwrap_or(None),
        sales_strategy: row.to_value("sales_strategy").unwrap_or(None),
        products,
        index_namespace: row.to_value("index_namespace").unwrap_or_default(),
        is_active: is_active != 0,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}
