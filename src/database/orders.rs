use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::models::{Order, OrderState, ReferenceRecord};

/// An order joined with its reference row, as the sweep consumes it.
/// Orders created before the reference import ran can have no reference.
#[derive(Debug, Clone)]
pub struct OrderWithReference {
    pub order: Order,
    pub reference: Option<ReferenceRecord>,
}

/// Query/update surface the escalation sweep needs from the store.
///
/// The two candidate queries partition pending orders by threshold so the
/// same order can never appear in both sets within one sweep. Updates are
/// committed per batch, not per order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Pending orders created before `cutoff` (the hard SLA threshold).
    async fn escalation_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderWithReference>, DatabaseError>;

    /// Pending orders older than the warning threshold but not yet past the
    /// hard threshold, with no warning sent so far.
    async fn warning_candidates(
        &self,
        warning_cutoff: DateTime<Utc>,
        overdue_cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderWithReference>, DatabaseError>;

    /// Transition the given orders to `overdue`, committed as one batch.
    async fn mark_overdue(&self, ids: &[i64]) -> Result<(), DatabaseError>;

    /// Set `warning_sent` on the given orders, committed as one batch.
    async fn mark_warning_sent(&self, ids: &[i64]) -> Result<(), DatabaseError>;
}

/// Postgres-backed store used in production.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_candidates(
        &self,
        where_clause: &str,
        binds: &[DateTime<Utc>],
    ) -> Result<Vec<OrderWithReference>, DatabaseError> {
        let sql = format!(
            "SELECT o.id, o.state, o.created_at, o.completed_at, o.warning_sent, o.reference_id, \
                    r.id AS ref_id, r.tid, r.pengelola, r.kc_supervisi, r.lokasi \
             FROM orders o \
             LEFT JOIN reference_records r ON r.id = o.reference_id \
             WHERE {} \
             ORDER BY o.created_at",
            where_clause
        );

        let mut query = sqlx::query_as::<_, CandidateRow>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(CandidateRow::into_candidate).collect())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn escalation_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderWithReference>, DatabaseError> {
        self.fetch_candidates("o.state = 'pending' AND o.created_at < $1", &[cutoff])
            .await
    }

    async fn warning_candidates(
        &self,
        warning_cutoff: DateTime<Utc>,
        overdue_cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderWithReference>, DatabaseError> {
        self.fetch_candidates(
            "o.state = 'pending' AND o.created_at < $1 AND o.created_at >= $2 \
             AND o.warning_sent = FALSE",
            &[warning_cutoff, overdue_cutoff],
        )
        .await
    }

    async fn mark_overdue(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE orders SET state = 'overdue' WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_warning_sent(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE orders SET warning_sent = TRUE WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Flat row shape for the joined candidate query.
#[derive(Debug, FromRow)]
struct CandidateRow {
    id: i64,
    state: OrderState,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    warning_sent: bool,
    reference_id: Option<i64>,
    ref_id: Option<i64>,
    tid: Option<String>,
    pengelola: Option<String>,
    kc_supervisi: Option<String>,
    lokasi: Option<String>,
}

impl CandidateRow {
    fn into_candidate(self) -> OrderWithReference {
        let reference = self.ref_id.map(|id| ReferenceRecord {
            id,
            tid: self.tid,
            pengelola: self.pengelola,
            kc_supervisi: self.kc_supervisi,
            lokasi: self.lokasi,
        });

        OrderWithReference {
            order: Order {
                id: self.id,
                state: self.state,
                created_at: self.created_at,
                completed_at: self.completed_at,
                warning_sent: self.warning_sent,
                reference_id: self.reference_id,
            },
            reference,
        }
    }
}
