//! Training-data row lifecycle.

use moosicbox_json_utils::database::ToValue as _;
use salescraft_models::{TrainingData, TrainingKind, TrainingStatus};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{StoreError, exec, parse_timestamp, query};

/// Inserts a fresh training row (normally in `processing` status).
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails.
pub async fn insert(db: &dyn Database, row: &TrainingData) -> Result<(), StoreError> {
    exec(
        db,
        "INSERT INTO training_data (id, agent_id, kind, status, metadata, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
        &[
            DatabaseValue::String(row.id.clone()),
            DatabaseValue::String(row.agent_id.clone()),
            DatabaseValue::String(row.kind.to_string()),
            DatabaseValue::String(row.status.to_string()),
            DatabaseValue::String(serde_json::to_string(&row.metadata)?),
            DatabaseValue::String(row.created_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches a training row by id. Returns `None` on a miss.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn get(db: &dyn Database, id: &str) -> Result<Option<TrainingData>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM training_data WHERE id = $1",
        &[DatabaseValue::String(id.to_string())],
    )
    .await?;

    rows.first().map(parse_training_row).transpose()
}

/// Lists training rows for an agent, newest first.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn list_by_agent(
    db: &dyn Database,
    agent_id: &str,
) -> Result<Vec<TrainingData>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM training_data WHERE agent_id = $1 ORDER BY created_at DESC",
        &[DatabaseValue::String(agent_id.to_string())],
    )
    .await?;

    rows.iter().map(parse_training_row).collect()
}

/// Advances a training row's status, merging extra keys into its
/// metadata (e.g. `chunks_created` on success, `error` on failure).
///
/// The transition must be legal per
/// [`TrainingStatus::can_transition_to`]; completed and failed rows are
/// immutable.
///
/// # Errors
///
/// Returns [`StoreError::InvalidTransition`] for an illegal move, or a
/// database error if the write fails. A missing row is reported as an
/// invalid transition from nowhere.
pub async fn update_status(
    db: &dyn Database,
    id: &str,
    next: TrainingStatus,
    metadata_patch: &serde_json::Value,
) -> Result<(), StoreError> {
    let Some(current) = get(db, id).await? else {
        return Err(StoreError::InvalidTransition {
            from: "missing".to_string(),
            to: next.to_string(),
        });
    };

    if !current.status.can_transition_to(next) {
        return Err(StoreError::InvalidTransition {
            from: current.status.to_string(),
            to: next.to_string(),
        });
    }

    let mut metadata = current.metadata;
    if let (Some(target), Some(patch)) = (metadata.as_object_mut(), metadata_patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }

    exec(
        db,
        "UPDATE training_data SET status = $1, metadata = $2 WHERE id = $3",
        &[
            DatabaseValue::String(next.to_string()),
            DatabaseValue::String(serde_json::to_string(&metadata)?),
            DatabaseValue::String(id.to_string()),
        ],
    )
    .await?;

    Ok(())
}

/// Deletes a training row. Returns `false` if it did not exist. Vector
/// entries keyed by this row's id are the caller's responsibility.
///
/// # Errors
///
/// Returns [`StoreError`] if the delete fails.
pub async fn delete(db: &dyn Database, id: &str) -> Result<bool, StoreError> {
    let deleted = exec(
        db,
        "DELETE FROM training_data WHERE id = $1",
        &[DatabaseValue::String(id.to_string())],
    )
    .await?;

    Ok(deleted > 0)
}

fn parse_training_row(row: &Row) -> Result<TrainingData, StoreError> {
    let kind: String = row.to_value("kind").unwrap_or_default();
    let status: String = row.to_value("status").unwrap_or_default();
    let metadata_json: String = row.to_value("metadata").unwrap_or_default();
    let metadata: serde_json::Value = serde_json::from_str(&metadata_json)
        .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
    let created_at: String = row.to_value("created_at").unwrap_or_default();

    Ok(TrainingData {
        id: row.to_value("id").unwrap_or_default(),
        agent_id: row.to_value("agent_id").unwrap_or_default(),
        kind: kind.parse::<TrainingKind>().unwrap_or_default(),
        status: status.parse::<TrainingStatus>().unwrap_or_default(),
        metadata,
        created_at: parse_timestamp(&created_at),
    })
}
