//! Workflow metrics
//!
//! Recording is a no-op until the host process installs a `metrics` recorder.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::domain::workflow::ActionKind;

/// Count one committed transition by audit kind
pub fn record_transition(action: ActionKind) {
    counter!("workflow_transitions_total", "action" => action.as_str()).increment(1);
}

/// Count a notification that the sink refused
pub fn record_notification_failure(event: &str) {
    counter!("workflow_notifications_failed_total", "event" => event.to_string()).increment(1);
}

/// Count an instance found past its SLA deadline
pub fn record_sla_breach(auto_approved: bool) {
    let outcome = if auto_approved { "auto_approved" } else { "escalated" };
    counter!("workflow_sla_breaches_total", "outcome" => outcome).increment(1);
}

/// Record one sweep run
pub fn record_sweep(duration: Duration, breached: usize, failed: usize) {
    histogram!("workflow_sla_sweep_duration_seconds").record(duration.as_secs_f64());
    if failed > 0 {
        counter!("workflow_sla_sweep_failures_total").increment(failed as u64);
    }
    tracing::debug!(breached, failed, "Recorded SLA sweep metrics");
}
