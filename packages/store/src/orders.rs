//! Order persistence and order-number allocation.

use chrono::{DateTime, Datelike as _, Utc};
use moosicbox_json_utils::database::ToValue as _;
use salescraft_models::{Order, OrderItem, OrderStatus, StatusChange};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{StoreError, exec, parse_timestamp, query};

/// Allocates the next `ORD-YYYY-NNNNNN` order number for the current
/// year. The per-year counter lives in `order_sequences`; the upsert and
/// read happen in one statement so concurrent allocations never observe
/// the same value.
///
/// # Errors
///
/// Returns [`StoreError`] if the sequence update fails.
pub async fn allocate_order_number(db: &dyn Database) -> Result<String, StoreError> {
    let year = Utc::now().year();

    let rows = query(
        db,
        "INSERT INTO order_sequences (year, next) VALUES ($1, 1)
         ON CONFLICT (year) DO UPDATE SET next = order_sequences.next + 1
         RETURNING next",
        &[DatabaseValue::Int32(year)],
    )
    .await?;

    let seq: i64 = rows.first().map_or(0, |r| r.to_value("next").unwrap_or(0));
    if seq == 0 {
        return Err(StoreError::Database(
            "order sequence returned no value".to_string(),
        ));
    }

    Ok(format!("ORD-{year:04}-{seq:06}"))
}

/// Inserts a new order row. The caller sets `order_number` from
/// [`allocate_order_number`]; uniqueness is enforced by the store.
///
/// # Errors
///
/// Returns [`StoreError`] if the write fails.
pub async fn insert(db: &dyn Database, order: &Order) -> Result<(), StoreError> {
    exec(
        db,
        "INSERT INTO orders (
            id, agent_id, session_id, order_number, customer_name,
            customer_email, customer_phone, shipping_address, items,
            total_amount, status, status_history, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        &[
            DatabaseValue::String(order.id.clone()),
            DatabaseValue::String(order.agent_id.clone()),
            opt_string(&order.session_id),
            DatabaseValue::String(order.order_number.clone()),
            DatabaseValue::String(order.customer_name.clone()),
            DatabaseValue::String(order.customer_email.clone()),
            opt_string(&order.customer_phone),
            opt_string(&order.shipping_address),
            DatabaseValue::String(serde_json::to_string(&order.items)?),
            DatabaseValue::Real64(order.total_amount),
            DatabaseValue::String(order.status.to_string()),
            DatabaseValue::String(serde_json::to_string(&order.status_history)?),
            DatabaseValue::String(order.created_at.to_rfc3339()),
            DatabaseValue::String(order.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches an order by id. Returns `None` on a miss.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn get(db: &dyn Database, id: &str) -> Result<Option<Order>, StoreError> {
    fetch_one(db, "SELECT * FROM orders WHERE id = $1", id).await
}

/// Fetches an order by its public order number. Returns `None` on a miss.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn get_by_order_number(
    db: &dyn Database,
    order_number: &str,
) -> Result<Option<Order>, StoreError> {
    fetch_one(
        db,
        "SELECT * FROM orders WHERE order_number = $1",
        order_number,
    )
    .await
}

/// Lists orders for an agent, newest first.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub async fn list_by_agent(db: &dyn Database, agent_id: &str) -> Result<Vec<Order>, StoreError> {
    let rows = query(
        db,
        "SELECT * FROM orders WHERE agent_id = $1 ORDER BY created_at DESC",
        &[DatabaseValue::String(agent_id.to_string())],
    )
    .await?;

    rows.iter().map(parse_order_row).collect()
}

/// Lists orders across all of an owner's agents within a time window,
/// optionally narrowed to one agent. Used by analytics.
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
) -> Result<Vec<Order>, StoreError> {
    let mut sql = String::from(
        "SELECT o.* FROM orders o
         JOIN agents a ON a.id = o.agent_id
         WHERE a.owner_id = $1 AND o.created_at >= $2 AND o.created_at <= $3",
    );
    let mut params = vec![
        DatabaseValue::String(owner_id.to_string()),
        DatabaseValue::String(from.to_rfc3339()),
        DatabaseValue::String(to.to_rfc3339()),
    ];

    if let Some(agent_id) = agent_id {
        sql.push_str(" AND o.agent_id = $4");
        params.push(DatabaseValue::String(agent_id.to_string()));
    }

    sql.push_str(" ORDER BY o.created_at");

    let rows = query(db, &sql, &params).await?;

    rows.iter().map(parse_order_row).collect()
}

/// Moves an order to a new status, appending to its history. The
/// transition must be legal per [`OrderStatus::can_transition_to`].
///
/// Returns the updated order, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`StoreError::InvalidTransition`] for an illegal move, or a
/// database error if the write fails.
pub async fn update_status(
    db: &dyn Database,
    id: &str,
    next: OrderStatus,
    note: Option<String>,
) -> Result<Option<Order>, StoreError> {
    let Some(mut order) = get(db, id).await? else {
        return Ok(None);
    };

    if !order.status.can_transition_to(next) {
        return Err(StoreError::InvalidTransition {
            from: order.status.to_string(),
            to: next.to_string(),
        });
    }

    let now = Utc::now();
    order.status = next;
    order.status_history.push(StatusChange {
        status: next,
        timestamp: now,
        note,
    });
    order.updated_at = now;

    exec(
        db,
        "UPDATE orders SET status = $1, status_history = $2, updated_at = $3
         WHERE id = $4",
        &[
            DatabaseValue::String(order.status.to_string()),
            DatabaseValue::String(serde_json::to_string(&order.status_history)?),
            DatabaseValue::String(order.updated_at.to_rfc3339()),
            DatabaseValue::String(order.id.clone()),
        ],
    )
    .await?;

    Ok(Some(order))
}

async fn fetch_one(db: &dyn Database, sql: &str, param: &str) -> Result<Option<Order>, StoreError> {
    let rows = query(db, sql, &[DatabaseValue::String(param.to_string())]).await?;

    rows.first().map(parse_order_row).transpose()
}

fn opt_string(value: &Option<String>) -> DatabaseValue {
    value
        .clone()
        .map_or(DatabaseValue::Null, DatabaseValue::String)
}

fn parse_order_row(row: &Row) -> Result<Order, StoreError> {
    let items_json: String = row.to_value("items").unwrap_or_default();
    let items: Vec<OrderItem> = serde_json::from_str(&items_json)?;

    let history_json: String = row.to_value("status_history").unwrap_or_default();
    let status_history: Vec<StatusChange> = serde_json::from_str(&history_json)?;

    let status: String = row.to_value("status").unwrap_or_default();
    let created_at: String = row.to_value("created_at").unwrap_or_default();
    let updated_at: String = row.to_value("updated_at").unwrap_or_default();

    Ok(Order {
        id: row.to_value("id").unwrap_or_default(),
        agent_id: row.to_value("agent_id").unwrap_or_default(),
        session_id: row.to_value("session_id").unwrap_or(None),
        order_number: row.to_value("order_number").unwrap_or_default(),
        customer_name: row.to_value("customer_name").unwrap_or_default(),
        customer_email: row.to_value("customer_email").unwrap_or_default(),
        customer_phone: row.to_value("customer_phone").unwrap_or(None),
        shipping_address: row.to_value("shipping_address").unwrap_or(None),
        items,
        total_amount: row.to_value("total_amount").unwrap_or(0.0),
        status: status.parse::<OrderStatus>().unwrap_or_default(),
        status_history,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}
