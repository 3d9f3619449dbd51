use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of an order.
///
/// The escalation engine only ever moves `Pending -> Overdue`; `Completed`
/// is reached through the admin surface when the problem is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Pending,
    Overdue,
    Completed,
}

/// One reported problem against a terminal/location.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub warning_sent: bool,
    pub reference_id: Option<i64>,
}
