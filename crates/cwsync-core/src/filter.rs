//! Message filtering for room deltas.
//!
//! A candidate is accepted only when all of these hold, checked against the
//! room state as it was *before* the batch:
//! - its id is above the room's high-water mark (already-emitted ids never repeat)
//! - its timestamp is not older than the room's last update
//! - it is no older than the recency window relative to `now`
//!
//! The returned state is the component-wise max of the old state and the
//! accepted messages, so it never moves backwards.

use std::collections::HashSet;
use std::time::Duration;

use crate::models::{RawMessage, RoomState};

/// Result of filtering one room's delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub state: RoomState,
    /// Accepted messages, in delivery order
    pub accepted: Vec<RawMessage>,
}

pub fn filter_messages(
    state: RoomState,
    candidates: &[RawMessage],
    now: i64,
    window: Duration,
) -> FilterOutcome {
    let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    let mut seen = HashSet::new();
    let mut maxima = RoomState::default();
    let mut accepted = Vec::new();

    for message in candidates {
        if message.id <= state.high_water_message_id {
            continue;
        }
        if message.timestamp < state.last_update_timestamp {
            continue;
        }
        if now.saturating_sub(message.timestamp) > window {
            continue;
        }
        // A page can repeat an id; emit it once
        if !seen.insert(message.id) {
            continue;
        }

        maxima.high_water_message_id = maxima.high_water_message_id.max(message.id);
        maxima.last_update_timestamp = maxima.last_update_timestamp.max(message.timestamp);
        accepted.push(message.clone());
    }

    FilterOutcome {
        state: state.max(maxima),
        accepted,
    }
}
