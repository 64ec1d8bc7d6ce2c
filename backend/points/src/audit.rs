//! Client-event logging for settled billable actions.

use tracing::info;

use logging::{ClientEvent, EventLogEntry, EventLogger};

use crate::bus::BusOutcome;
use crate::detection::ActionInfo;

/// The authorize decision an outcome implies, as written to the event log.
pub fn decision_label(outcome: &BusOutcome) -> &'static str {
    match outcome {
        BusOutcome::Done { .. } | BusOutcome::ActionFailed { .. } => "authorized",
        BusOutcome::NeedsTopup { .. } => "need_topup",
        BusOutcome::NeedsUpgrade { .. } => "need_upgrade",
        BusOutcome::Denied { .. } => "denied",
        BusOutcome::LoginRequired => "login_required",
        BusOutcome::AlreadyInFlight => "in_flight",
        BusOutcome::Failed { .. } => "error",
    }
}

/// Log the authorize decision and, on `Done`, the consume result.
pub fn log_outcome(user_id: &str, action: &ActionInfo, outcome: &BusOutcome) -> Vec<EventLogEntry> {
    let decision = decision_label(outcome);
    let mut entries = vec![EventLogger::log_event(
        user_id,
        ClientEvent::Authorize {
            module: action.module.clone(),
            mode: action.mode.clone(),
            count: action.count,
            decision: decision.to_string(),
        },
    )];
    if let BusOutcome::Done { usage_id, consumed } = outcome {
        entries.push(EventLogger::log_event(
            user_id,
            ClientEvent::Consume {
                usage_id: usage_id.clone(),
                module: action.module.clone(),
                points: action.cost.unwrap_or(0),
                ok: *consumed,
            },
        ));
    } else {
        info!(trigger = %action.trigger_id, decision, "Billable action not completed");
    }
    entries
}
