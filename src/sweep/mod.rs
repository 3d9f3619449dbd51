//! Periodic SLA escalation sweep.
//!
//! Each run partitions pending orders into an escalate set and a warn set,
//! commits the state mutations per batch, then attempts notifications.
//! Notification failures never reverse a committed mutation; store failures
//! abort the sweep.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::SlaConfig;
use crate::database::manager::DatabaseError;
use crate::database::orders::{OrderStore, OrderWithReference};
use crate::lifecycle::{classify, SlaAction};
use crate::notify::{render, resolve_recipients, NoticeKind, Notifier};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Store error: {0}")]
    Database(#[from] DatabaseError),
}

/// Outcome counters for one sweep, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub escalated: usize,
    pub warned: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    /// Set when another sweep held the lock and this run did nothing.
    pub skipped: bool,
}

/// Runs the escalation sweep over an [`OrderStore`] with a [`Notifier`].
///
/// Sweeps are serialized with a non-reentrant lock: the store read and the
/// batch write are not one transaction, so overlapping runs could observe
/// the same pending order twice and double-send the escalation notice.
pub struct SlaSweeper<S, N> {
    store: S,
    notifier: N,
    config: SlaConfig,
    running: Mutex<()>,
}

impl<S: OrderStore, N: Notifier> SlaSweeper<S, N> {
    pub fn new(store: S, notifier: N, config: SlaConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            running: Mutex::new(()),
        }
    }

    /// One full sweep at the given instant.
    ///
    /// The escalate batch is fully committed before the warn batch is even
    /// queried, so an order mutated mid-sweep by a concurrent writer cannot
    /// be double-flagged across both buckets.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let _guard = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Sweep already in progress, skipping this trigger");
                return Ok(SweepReport {
                    skipped: true,
                    ..SweepReport::default()
                });
            }
        };

        let mut report = SweepReport::default();
        self.escalate_batch(now, &mut report).await?;
        self.warn_batch(now, &mut report).await?;

        info!(
            escalated = report.escalated,
            warned = report.warned,
            sent = report.notifications_sent,
            failed = report.notifications_failed,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Orders past the hard threshold: stage `overdue`, commit the batch,
    /// then notify. The transition is applied whether or not any
    /// notification goes out.
    async fn escalate_batch(
        &self,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> Result<(), SweepError> {
        let cutoff = now - self.config.overdue_limit;
        let candidates = self.store.escalation_candidates(cutoff).await?;

        let escalate: Vec<&OrderWithReference> = candidates
            .iter()
            .filter(|c| {
                classify(
                    &c.order,
                    now,
                    self.config.warning_limit,
                    self.config.overdue_limit,
                ) == SlaAction::Escalate
            })
            .collect();

        if escalate.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = escalate.iter().map(|c| c.order.id).collect();
        self.store.mark_overdue(&ids).await?;
        report.escalated = ids.len();
        info!(count = ids.len(), "Escalated orders past SLA limit");

        for candidate in escalate {
            self.dispatch(candidate, NoticeKind::Escalate, report).await;
        }
        Ok(())
    }

    /// Orders inside the warning window: notify first, then commit
    /// `warning_sent` for every order whose dispatch was attempted. Orders
    /// without reference data are skipped and stay eligible.
    async fn warn_batch(
        &self,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> Result<(), SweepError> {
        let warning_cutoff = now - self.config.warning_limit;
        let overdue_cutoff = now - self.config.overdue_limit;
        let candidates = self
            .store
            .warning_candidates(warning_cutoff, overdue_cutoff)
            .await?;

        let mut flagged = Vec::new();
        for candidate in &candidates {
            let action = classify(
                &candidate.order,
                now,
                self.config.warning_limit,
                self.config.overdue_limit,
            );
            if action != SlaAction::Warn {
                continue;
            }
            if self.dispatch(candidate, NoticeKind::Warn, report).await {
                flagged.push(candidate.order.id);
            }
        }

        if !flagged.is_empty() {
            self.store.mark_warning_sent(&flagged).await?;
            report.warned = flagged.len();
            info!(count = flagged.len(), "Warned orders approaching SLA limit");
        }
        Ok(())
    }

    /// Render and send one notice to every resolved recipient. A failed
    /// recipient is logged and does not block the others. Returns whether
    /// dispatch was attempted at all (false only when reference data is
    /// missing).
    async fn dispatch(
        &self,
        candidate: &OrderWithReference,
        kind: NoticeKind,
        report: &mut SweepReport,
    ) -> bool {
        let reference = match &candidate.reference {
            Some(reference) => reference,
            None => {
                warn!(
                    order_id = candidate.order.id,
                    "Order has no reference data, skipping notification"
                );
                return false;
            }
        };

        let message = render(&candidate.order, reference, kind, self.config.timezone);
        for chat_id in resolve_recipients(reference, &self.config) {
            match self.notifier.send(&chat_id, &message).await {
                Ok(()) => report.notifications_sent += 1,
                Err(error) => {
                    report.notifications_failed += 1;
                    warn!(
                        order_id = candidate.order.id,
                        chat_id = %chat_id,
                        %error,
                        "Failed to send notification"
                    );
                }
            }
        }
        true
    }
}
