//! Test doubles for the store and notifier seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Mutex;

use crate::database::manager::DatabaseError;
use crate::database::models::{Order, OrderState};
use crate::database::orders::{OrderStore, OrderWithReference};
use crate::notify::{Notifier, NotifyError};

/// In-memory [`OrderStore`] mirroring the Postgres query predicates.
pub struct MemoryStore {
    rows: Mutex<Vec<OrderWithReference>>,
}

impl MemoryStore {
    pub fn new(rows: Vec<OrderWithReference>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Current state of one order; panics if the id is unknown.
    pub fn order(&self, id: i64) -> Order {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.order.id == id)
            .map(|c| c.order.clone())
            .unwrap_or_else(|| panic!("no order with id {}", id))
    }

    fn select<F>(&self, predicate: F) -> Vec<OrderWithReference>
    where
        F: Fn(&Order) -> bool,
    {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| predicate(&c.order))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn escalation_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderWithReference>, DatabaseError> {
        Ok(self.select(|o| o.state == OrderState::Pending && o.created_at < cutoff))
    }

    async fn warning_candidates(
        &self,
        warning_cutoff: DateTime<Utc>,
        overdue_cutoff: DateTime<Utc>,
    ) -> Result<Vec<OrderWithReference>, DatabaseError> {
        Ok(self.select(|o| {
            o.state == OrderState::Pending
                && o.created_at < warning_cutoff
                && o.created_at >= overdue_cutoff
                && !o.warning_sent
        }))
    }

    async fn mark_overdue(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if ids.contains(&row.order.id) {
                row.order.state = OrderState::Overdue;
            }
        }
        Ok(())
    }

    async fn mark_warning_sent(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if ids.contains(&row.order.id) {
                row.order.warning_sent = true;
            }
        }
        Ok(())
    }
}

/// [`Notifier`] that records every (chat_id, text) pair and always succeeds.
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// [`Notifier`] that fails for a chosen set of chat ids but still records
/// every attempt, simulating a partially unreachable messaging API.
pub struct FailingNotifier {
    failing: HashSet<String>,
    attempts: Mutex<Vec<String>>,
}

impl FailingNotifier {
    pub fn failing_for<I, S>(chat_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: chat_ids.into_iter().map(Into::into).collect(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, chat_id: &str, _text: &str) -> Result<(), NotifyError> {
        self.attempts.lock().unwrap().push(chat_id.to_string());
        if self.failing.contains(chat_id) {
            return Err(NotifyError::Api {
                status: 502,
                body: "simulated network error".to_string(),
            });
        }
        Ok(())
    }
}
