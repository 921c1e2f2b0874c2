//! Conversation row persistence.
//!
//! One row per `(agent_id, session_id)` pair accumulates all turns of a
//! session. Updates are last-writer-wins; the chat handler serializes
//! concurrent turns on one session above this layer.

use chrono::{DateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use salescraft_models::{Channel, Conversation, ConversationTurn, LeadInfo};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{StoreError, exec, parse_timestamp, query};

/// Fetches the conversation for a session. Returns `None` on a miss.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn get_by_session(
    db: &dyn Database,
    agent_id: &str,
    session_id: &str,
) -> Result<Option<Conversation>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM conversations WHERE agent_id = $1 AND session_id = $2",
        &[
            DatabaseValue::String(agent_id.to_string()),
            DatabaseValue::String(session_id.to_string()),
        ],
    )
    .await?;

    rows.first().map(parse_conversation_row).transpose()
}

/// Inserts or rewrites the conversation row for its session
/// (last-writer-wins on conflict).
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails.
pub async fn upsert(db: &dyn Database, conversation: &Conversation) -> Result<(), StoreError> {
    let messages_json = serde_json::to_string(&conversation.messages)?;
    let lead_json = conversation
        .lead_info
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    exec(
        db,
        "INSERT INTO conversations (
            id, agent_id, session_id, channel, messages, lead_info,
            created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (agent_id, session_id) DO UPDATE SET
            channel = excluded.channel,
            messages = excluded.messages,
            lead_info = excluded.lead_info,
            updated_at = excluded.updated_at",
        &[
            DatabaseValue::String(conversation.id.clone()),
            DatabaseValue::String(conversation.agent_id.clone()),
            DatabaseValue::String(conversation.session_id.clone()),
            DatabaseValue::String(conversation.channel.to_string()),
            DatabaseValue::String(messages_json),
            lead_json.map_or(DatabaseValue::Null, DatabaseValue::String),
            DatabaseValue::String(conversation.created_at.to_rfc3339()),
            DatabaseValue::String(conversation.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Lists conversations for an agent, most recently updated first.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn list_by_agent(
    db: &dyn Database,
    agent_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<Conversation>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM conversations
         WHERE agent_id = $1
         ORDER BY updated_at DESC
         LIMIT $2 OFFSET $3",
        &[
            DatabaseValue::String(agent_id.to_string()),
            DatabaseValue::UInt32(limit),
            DatabaseValue::UInt32(offset),
        ],
    )
    .await?;

    rows.iter().map(parse_conversation_row).collect()
}

/// Lists conversations across all of an owner's agents within a time
/// window, optionally narrowed to one agent. Used by analytics.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn list_for_owner(
    db: &dyn Database,
    owner_id: &str,
    agent_id: Option<&str>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Conversation>, StoreError> {
    let mut sql = String::from(
        "SELECT c.* FROM conversations c
         JOIN agents a ON a.id = c.agent_id
         WHERE a.owner_id = $1 AND c.created_at >= $2 AND c.created_at <= $3",
    );
    let mut params = vec![
        DatabaseValue::String(owner_id.to_string()),
        DatabaseValue::String(from.to_rfc3339()),
        DatabaseValue::String(to.to_rfc3339()),
    ];

    if let Some(agent_id) = agent_id {
        sql.push_str(" AND c.agent_id = $4");
        params.push(DatabaseValue::String(agent_id.to_string()));
    }

    sql.push_str(" ORDER BY c.created_at");

    let rows = query(db, &sql, &params).await?;

    rows.iter().map(parse_conversation_row).collect()
}

fn parse_conversation_row(row: &Row) -> Result<Conversation, StoreError> {
    let messages_json: String = row.to_value("messages").unwrap_or_default();
    let messages: Vec<ConversationTurn> = serde_json::from_str(&messages_json)?;

    let lead_json: Option<String> = row.to_value("lead_info").unwrap_or(None);
    let lead_info: Option<LeadInfo> = lead_json
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(serde_json::from_str)
        .transpose()?;

    let channel: String = row.to_value("channel").unwrap_or_default();
    let created_at: String = row.to_value("created_at").unwrap_or_default();
    let updated_at: String = row.to_value("updated_at").unwrap_or_default();

    Ok(Conversation {
        id: row.to_value("id").unwrap_or_default(),
        agent_id: row.to_value("agent_id").unwrap_or_default(),
        session_id: row.to_value("session_id").unwrap_or_default(),
        channel: channel.parse::<Channel>().unwrap_or_default(),
        messages,
        lead_info,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}
