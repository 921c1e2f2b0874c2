#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read-side analytics over conversations and orders.
//!
//! All reports are computed for one owner over a time window, optionally
//! narrowed to a single agent: the acquisition funnel, hour-of-day
//! peaks, daily trends, and per-agent performance. The store supplies
//! filtered rows; aggregation happens in-process so the same pure
//! functions serve both the HTTP handlers and the tests.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Timelike as _, Utc};
use salescraft_models::{Agent, Conversation, Order};
use salescraft_store::StoreError;
use serde::Serialize;
use switchy_database::Database;
use thiserror::Error;

/// Sessions with at least this many messages count as engaged.
const ENGAGED_MESSAGE_FLOOR: usize = 3;

/// Errors from analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Store read failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Query scope shared by every report.
#[derive(Debug, Clone)]
pub struct ReportScope {
    /// Owner whose agents are reported on.
    pub owner_id: String,
    /// Narrow to one agent when set.
    pub agent_id: Option<String>,
    /// Window start (inclusive).
    pub from: DateTime<Utc>,
    /// Window end (inclusive).
    pub to: DateTime<Utc>,
}

/// The acquisition funnel and its stage conversion rates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    /// Distinct sessions.
    pub visitors: u64,
    /// Sessions with at least three messages.
    pub engaged: u64,
    /// Sessions with non-empty lead info.
    pub qualified: u64,
    /// Sessions with a linked order.
    pub converted: u64,
    /// `engaged / visitors`.
    pub visitor_to_engaged_rate: f64,
    /// `qualified / engaged`.
    pub engaged_to_qualified_rate: f64,
    /// `converted / qualified`.
    pub qualified_to_converted_rate: f64,
}

/// Conversations bucketed by hour of day (UTC).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHoursReport {
    /// Index 0 = midnight UTC.
    pub hours: Vec<u64>,
}

/// One day of activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrendPoint {
    /// Day (UTC).
    pub date: NaiveDate,
    /// Conversations started that day.
    pub conversations: u64,
    /// Conversations that produced lead info that day.
    pub leads: u64,
}

/// Per-agent totals, sorted by conversion rate descending.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    /// Agent id.
    pub agent_id: String,
    /// Agent name at report time.
    pub agent_name: String,
    /// Conversations in the window.
    pub conversations: u64,
    /// Conversations with lead info.
    pub leads: u64,
    /// Orders in the window.
    pub orders: u64,
    /// `orders / conversations`.
    pub conversion_rate: f64,
}

/// Computes the funnel report for a scope.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store reads fail.
pub async fn funnel(db: &dyn Database, scope: &ReportScope) -> Result<FunnelReport, AnalyticsError> {
    let (conversations, orders) = load_window(db, scope).await?;
    Ok(compute_funnel(&conversations, &orders))
}

/// Computes the peak-hours report for a scope.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store reads fail.
pub async fn peak_hours(
    db: &dyn Database,
    scope: &ReportScope,
) -> Result<PeakHoursReport, AnalyticsError> {
    let conversations = load_conversations(db, scope).await?;
    Ok(compute_peak_hours(&conversations))
}

/// Computes the daily trend series for a scope.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store reads fail.
pub async fn daily_trends(
    db: &dyn Database,
    scope: &ReportScope,
) -> Result<Vec<DailyTrendPoint>, AnalyticsError> {
    let conversations = load_conversations(db, scope).await?;
    Ok(compute_daily_trends(&conversations))
}

/// Computes per-agent performance for a scope, best converters first.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store reads fail.
pub async fn agent_performance(
    db: &dyn Database,
    scope: &ReportScope,
) -> Result<Vec<AgentPerformance>, AnalyticsError> {
    let agents = salescraft_store::agents::list_by_owner(db, &scope.owner_id).await?;
    let (conversations, orders) = load_window(db, scope).await?;
    Ok(compute_agent_performance(&agents, &conversations, &orders))
}

async fn load_conversations(
    db: &dyn Database,
    scope: &ReportScope,
) -> Result<Vec<Conversation>, AnalyticsError> {
    Ok(salescraft_store::conversations::list_for_owner(
        db,
        &scope.owner_id,
        scope.agent_id.as_deref(),
        scope.from,
        scope.to,
    )
    .await?)
}

async fn load_window(
    db: &dyn Database,
    scope: &ReportScope,
) -> Result<(Vec<Conversation>, Vec<Order>), AnalyticsError> {
    let conversations = load_conversations(db, scope).await?;
    let orders = salescraft_store::orders::list_for_owner(
        db,
        &scope.owner_id,
        scope.agent_id.as_deref(),
        scope.from,
        scope.to,
    )
    .await?;
    Ok((conversations, orders))
}

fn has_lead(conversation: &Conversation) -> bool {
    conversation
        .lead_info
        .as_ref()
        .is_some_and(|lead| !lead.is_empty())
}

/// Sessions that have a linked order, keyed by `(agent_id, session_id)`.
fn converted_sessions(orders: &[Order]) -> HashSet<(String, String)> {
    orders
        .iter()
        .filter_map(|o| {
            o.session_id
                .as_ref()
                .map(|s| (o.agent_id.clone(), s.clone()))
        })
        .collect()
}

fn compute_funnel(conversations: &[Conversation], orders: &[Order]) -> FunnelReport {
    let converted_keys = converted_sessions(orders);

    let visitors = conversations.len() as u64;
    let engaged = conversations
        .iter()
        .filter(|c| c.messages.len() >= ENGAGED_MESSAGE_FLOOR)
        .count() as u64;
    let qualified = conversations.iter().filter(|c| has_lead(c)).count() as u64;
    let converted = conversations
        .iter()
        .filter(|c| converted_keys.contains(&(c.agent_id.clone(), c.session_id.clone())))
        .count() as u64;

    FunnelReport {
        visitors,
        engaged,
        qualified,
        converted,
        visitor_to_engaged_rate: rate(engaged, visitors),
        engaged_to_qualified_rate: rate(qualified, engaged),
        qualified_to_converted_rate: rate(converted, qualified),
    }
}

fn compute_peak_hours(conversations: &[Conversation]) -> PeakHoursReport {
    let mut hours = vec![0_u64; 24];
    for conversation in conversations {
        let hour = conversation.created_at.hour() as usize;
        hours[hour] += 1;
    }
    PeakHoursReport { hours }
}

fn compute_daily_trends(conversations: &[Conversation]) -> Vec<DailyTrendPoint> {
    let mut days: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();

    for conversation in conversations {
        let day = conversation.created_at.date_naive();
        let entry = days.entry(day).or_default();
        entry.0 += 1;
        if has_lead(conversation) {
            entry.1 += 1;
        }
    }

    days.into_iter()
        .map(|(date, (conversations, leads))| DailyTrendPoint {
            date,
            conversations,
            leads,
        })
        .collect()
}

fn compute_agent_performance(
    agents: &[Agent],
    conversations: &[Conversation],
    orders: &[Order],
) -> Vec<AgentPerformance> {
    let mut rows: Vec<AgentPerformance> = agents
        .iter()
        .map(|agent| {
            let convs: Vec<&Conversation> = conversations
                .iter()
                .filter(|c| c.agent_id == agent.id)
                .collect();
            let lead_count = convs.iter().filter(|c| has_lead(c)).count() as u64;
            let order_count = orders.iter().filter(|o| o.agent_id == agent.id).count() as u64;
            let conversation_count = convs.len() as u64;

            AgentPerformance {
                agent_id: agent.id.clone(),
                agent_name: agent.name.clone(),
                conversations: conversation_count,
                leads: lead_count,
                orders: order_count,
                conversion_rate: rate(order_count, conversation_count),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.conversion_rate
            .partial_cmp(&a.conversion_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    rows
}

fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            numerator as f64 / denominator as f64
        }
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation)]
mod tests {
    use chrono::TimeZone as _;
    use salescraft_models::{Channel, ConversationTurn, LeadInfo, OrderStatus, Role, Tone};

    use super::*;

    fn conversation(agent_id: &str, session_id: &str, messages: usize, lead: bool) -> Conversation {
        let mut c = Conversation::new(agent_id, session_id, Channel::Web);
        c.created_at = Utc.with_ymd_and_hms(2026, 2, 10, 14, 0, 0).unwrap();
        for i in 0..messages {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            c.messages.push(ConversationTurn::now(role, format!("m{i}")));
        }
        if lead {
            c.lead_info = Some(LeadInfo {
                email: Some("jane@example.com".to_string()),
                ..LeadInfo::default()
            });
        }
        c
    }

    fn order(agent_id: &str, session_id: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: uuid_like(agent_id, session_id),
            agent_id: agent_id.to_string(),
            session_id: session_id.map(String::from),
            order_number: "ORD-2026-000001".to_string(),
            customer_name: "Jane".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: None,
            shipping_address: None,
            items: Vec::new(),
            total_amount: 100.0,
            status: OrderStatus::Pending,
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn uuid_like(a: &str, b: Option<&str>) -> String {
        format!("{a}-{}", b.unwrap_or("none"))
    }

    fn agent(id: &str, name: &str) -> Agent {
        let now = Utc::now();
        Agent {
            id: id.to_string(),
            owner_id: "u1".to_string(),
            name: name.to_string(),
            company_name: "Acme".to_string(),
            company_description: String::new(),
            tone: Tone::Friendly,
            language: "en".to_string(),
            greeting_message: None,
            sales_strategy: None,
            products: Vec::new(),
            index_namespace: format!("agent_{id}"),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn funnel_counts_each_stage() {
        let conversations = vec![
            conversation("a1", "s1", 1, false),
            conversation("a1", "s2", 4, false),
            conversation("a1", "s3", 6, true),
            conversation("a1", "s4", 8, true),
        ];
        let orders = vec![order("a1", Some("s4"))];

        let funnel = compute_funnel(&conversations, &orders);
        assert_eq!(funnel.visitors, 4);
        assert_eq!(funnel.engaged, 3);
        assert_eq!(funnel.qualified, 2);
        assert_eq!(funnel.converted, 1);
        assert!((funnel.visitor_to_engaged_rate - 0.75).abs() < f64::EPSILON);
        assert!((funnel.qualified_to_converted_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn funnel_rates_are_zero_when_empty() {
        let funnel = compute_funnel(&[], &[]);
        assert_eq!(funnel.visitors, 0);
        assert!((funnel.visitor_to_engaged_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn orders_without_sessions_do_not_convert() {
        let conversations = vec![conversation("a1", "s1", 6, true)];
        let orders = vec![order("a1", None)];
        let funnel = compute_funnel(&conversations, &orders);
        assert_eq!(funnel.converted, 0);
    }

    #[test]
    fn peak_hours_buckets_by_utc_hour() {
        let conversations = vec![
            conversation("a1", "s1", 1, false),
            conversation("a1", "s2", 1, false),
        ];
        let report = compute_peak_hours(&conversations);
        assert_eq!(report.hours[14], 2);
        assert_eq!(report.hours.iter().sum::<u64>(), 2);
    }

    #[test]
    fn daily_trends_count_conversations_and_leads() {
        let conversations = vec![
            conversation("a1", "s1", 2, false),
            conversation("a1", "s2", 2, true),
        ];
        let trends = compute_daily_trends(&conversations);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].conversations, 2);
        assert_eq!(trends[0].leads, 1);
    }

    #[test]
    fn agent_performance_sorts_by_conversion_rate() {
        let agents = vec![agent("a1", "Alex"), agent("a2", "Maya")];
        let conversations = vec![
            conversation("a1", "s1", 2, false),
            conversation("a1", "s2", 2, false),
            conversation("a2", "s3", 2, true),
        ];
        let orders = vec![order("a2", Some("s3"))];

        let rows = compute_agent_performance(&agents, &conversations, &orders);
        assert_eq!(rows[0].agent_id, "a2");
        assert!((rows[0].conversion_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].agent_id, "a1");
        assert_eq!(rows[1].orders, 0);
    }
}
