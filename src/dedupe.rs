use std::collections::HashSet;

use crate::domain::EventCandidate;

/// Composite identity of an event record across overlapping queries.
/// Missing fields participate as empty strings; venue and artist fields are
/// deliberately not part of the key.
pub fn composite_key(event: &EventCandidate) -> (String, String, String, String, String) {
    (
        event.source.clone(),
        event.source_id.clone(),
        event.url.clone(),
        event.event_name.to_lowercase(),
        event.start_utc.clone().unwrap_or_default(),
    )
}

/// Removes later candidates whose composite key matches an earlier one.
/// Order-stable and idempotent.
pub fn dedupe(events: Vec<EventCandidate>) -> Vec<EventCandidate> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|e| seen.insert(composite_key(e)))
        .collect()
}
