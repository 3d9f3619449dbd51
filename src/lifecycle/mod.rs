//! Order lifecycle state machine.
//!
//! Pure classification of an order against the SLA thresholds. The sweep
//! owns all side effects; nothing in this module touches the store.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::database::models::{Order, OrderState};

/// What the sweep should do with an order right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaAction {
    /// Within SLA, or already handled.
    None,
    /// Past the hard threshold: transition to overdue and notify.
    Escalate,
    /// Past the soft threshold with no warning sent yet: notify once.
    Warn,
}

/// Classify an order by elapsed time against the two thresholds.
///
/// Only pending orders are actionable; `Warn` is suppressed once
/// `warning_sent` is set so the soft notice goes out at most once.
pub fn classify(
    order: &Order,
    now: DateTime<Utc>,
    warning_limit: Duration,
    overdue_limit: Duration,
) -> SlaAction {
    if order.state != OrderState::Pending {
        return SlaAction::None;
    }

    let age = now - order.created_at;
    if age >= overdue_limit {
        SlaAction::Escalate
    } else if age >= warning_limit && !order.warning_sent {
        SlaAction::Warn
    } else {
        SlaAction::None
    }
}

/// For a completed order, how far past the SLA limit it finished.
///
/// Returns `"lewat {h} jam {m} menit"` when completion exceeded the limit,
/// with minutes truncated rather than rounded. `None` for orders still open
/// or completed within the limit.
pub fn overdue_duration(order: &Order, overdue_limit: Duration) -> Option<String> {
    let completed_at = order.completed_at?;
    let elapsed = completed_at - order.created_at;
    if elapsed <= overdue_limit {
        return None;
    }

    let excess_minutes = (elapsed - overdue_limit).num_minutes();
    let hours = excess_minutes / 60;
    let minutes = excess_minutes % 60;
    Some(format!("lewat {} jam {} menit", hours, minutes))
}

/// Convert a stored timestamp to the canonical display timezone.
///
/// Single conversion point for both duration math and rendering, so the
/// display zone never drifts between the two.
pub fn to_display_zone(ts: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    ts.with_timezone(&tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_order(age_minutes: i64) -> Order {
        Order {
            id: 1,
            state: OrderState::Pending,
            created_at: Utc::now() - Duration::minutes(age_minutes),
            completed_at: None,
            warning_sent: false,
            reference_id: Some(1),
        }
    }

    fn limits() -> (Duration, Duration) {
        (Duration::hours(1), Duration::hours(2))
    }

    #[test]
    fn test_fresh_order_is_not_actionable() {
        let (warn, overdue) = limits();
        let order = pending_order(30);
        assert_eq!(classify(&order, Utc::now(), warn, overdue), SlaAction::None);
    }

    #[test]
    fn test_warning_at_exactly_one_hour() {
        let (warn, overdue) = limits();
        let now = Utc::now();
        let mut order = pending_order(0);
        order.created_at = now - Duration::hours(1);
        assert_eq!(classify(&order, now, warn, overdue), SlaAction::Warn);
    }

    #[test]
    fn test_warning_window_upper_edge_escalates() {
        let (warn, overdue) = limits();
        let now = Utc::now();
        let mut order = pending_order(0);
        order.created_at = now - Duration::hours(2);
        assert_eq!(classify(&order, now, warn, overdue), SlaAction::Escalate);
    }

    #[test]
    fn test_warning_suppressed_after_flag_set() {
        let (warn, overdue) = limits();
        let mut order = pending_order(90);
        order.warning_sent = true;
        assert_eq!(classify(&order, Utc::now(), warn, overdue), SlaAction::None);
    }

    #[test]
    fn test_escalate_ignores_warning_flag() {
        let (warn, overdue) = limits();
        let mut order = pending_order(130);
        order.warning_sent = true;
        assert_eq!(
            classify(&order, Utc::now(), warn, overdue),
            SlaAction::Escalate
        );
    }

    #[test]
    fn test_non_pending_states_are_inert() {
        let (warn, overdue) = limits();
        let now = Utc::now();
        for state in [OrderState::Overdue, OrderState::Completed] {
            let mut order = pending_order(500);
            order.state = state;
            assert_eq!(classify(&order, now, warn, overdue), SlaAction::None);
        }
    }

    #[test]
    fn test_overdue_duration_formats_excess() {
        let created = Utc::now();
        let order = Order {
            id: 1,
            state: OrderState::Completed,
            created_at: created,
            completed_at: Some(created + Duration::hours(3) + Duration::minutes(30)),
            warning_sent: false,
            reference_id: None,
        };
        assert_eq!(
            overdue_duration(&order, Duration::hours(2)),
            Some("lewat 1 jam 30 menit".to_string())
        );
    }

    #[test]
    fn test_overdue_duration_truncates_seconds() {
        let created = Utc::now();
        let order = Order {
            id: 1,
            state: OrderState::Completed,
            created_at: created,
            completed_at: Some(created + Duration::hours(2) + Duration::seconds(119)),
            warning_sent: false,
            reference_id: None,
        };
        // 1 minute 59 seconds over: seconds are dropped, not rounded up
        assert_eq!(
            overdue_duration(&order, Duration::hours(2)),
            Some("lewat 0 jam 1 menit".to_string())
        );
    }

    #[test]
    fn test_overdue_duration_absent_within_limit() {
        let created = Utc::now();
        let order = Order {
            id: 1,
            state: OrderState::Completed,
            created_at: created,
            completed_at: Some(created + Duration::minutes(90)),
            warning_sent: false,
            reference_id: None,
        };
        assert_eq!(overdue_duration(&order, Duration::hours(2)), None);
    }

    #[test]
    fn test_overdue_duration_absent_for_open_order() {
        let order = pending_order(300);
        assert_eq!(overdue_duration(&order, Duration::hours(2)), None);
    }
}
