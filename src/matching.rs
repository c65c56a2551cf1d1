use tracing::debug;

use crate::domain::{EmbeddedPerformer, EventCandidate, RawEventRecord, EVENT_SOURCE};
use crate::normalize::normalize;

/// How a query asserts "this event features artist X".
#[derive(Debug, Clone)]
pub enum MatchMode {
    /// The caller resolved a stable performer id up front. A performer is
    /// accepted only when both the id and the normalized name agree — an id
    /// hit on a renamed or merged performer record is rejected.
    Identity {
        ensure_id: String,
        artist_name: String,
    },
    /// Only a name is available; normalized name equality is the whole test.
    Name { artist_name: String },
}

impl MatchMode {
    fn target_name(&self) -> &str {
        match self {
            MatchMode::Identity { artist_name, .. } => artist_name,
            MatchMode::Name { artist_name } => artist_name,
        }
    }
}

/// Why the title guard rejected an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardReason {
    Tribute,
    MusicOf,
    Versus,
    ThemedNight,
    Party,
    Orchestral,
    Candlelight,
    StringQuartet,
    Ensemble,
    Experience,
    FilmConcert,
    InConcertWith,
}

/// Marker terms signaling a non-authentic performance, matched word-bounded
/// against the normalized title. More specific phrases come first so the
/// attributed reason is the most precise one.
const TITLE_MARKERS: &[(&str, GuardReason)] = &[
    ("a tribute to", GuardReason::Tribute),
    ("tribute", GuardReason::Tribute),
    ("performs the music of", GuardReason::MusicOf),
    ("performing the music of", GuardReason::MusicOf),
    ("plays the music of", GuardReason::MusicOf),
    ("music of", GuardReason::MusicOf),
    ("in concert with", GuardReason::InConcertWith),
    ("film concert", GuardReason::FilmConcert),
    ("string quartet", GuardReason::StringQuartet),
    ("vs", GuardReason::Versus),
    ("night", GuardReason::ThemedNight),
    ("party", GuardReason::Party),
    ("orchestra", GuardReason::Orchestral),
    ("symphony", GuardReason::Orchestral),
    ("philharmonic", GuardReason::Orchestral),
    ("candlelight", GuardReason::Candlelight),
    ("ensemble", GuardReason::Ensemble),
    ("experience", GuardReason::Experience),
];

/// Tests an event title against the marker table. Returns the first
/// matching rule's reason, or `None` for a clean title. Markers match whole
/// words only, so "Nightwish" passes while "80s Night" does not.
pub fn title_guard(title: &str) -> Option<GuardReason> {
    let padded = format!(" {} ", normalize(title));
    TITLE_MARKERS
        .iter()
        .find(|(marker, _)| padded.contains(&format!(" {} ", marker)))
        .map(|(_, reason)| *reason)
}

/// Decides whether one embedded performer satisfies the active match mode.
///
/// Names are compared by exact normalized equality in both modes; there is
/// deliberately no phrase-containment relaxation for multi-word names.
pub fn performer_matches(performer: &EmbeddedPerformer, mode: &MatchMode) -> bool {
    let name_matches = normalize(&performer.name) == normalize(mode.target_name());
    match mode {
        MatchMode::Identity { ensure_id, .. } => {
            performer.id.as_deref() == Some(ensure_id.as_str()) && name_matches
        }
        MatchMode::Name { .. } => name_matches,
    }
}

/// Turns one raw event record into zero or more event candidates.
///
/// Emits one candidate per performer accepted under `mode` (normally one),
/// carrying the performer's own name as `artist_name` and the first embedded
/// venue as the location fields. Name-mode matches additionally pass through
/// the title guard; identity-mode matches bypass it, since an official
/// attraction id is trusted regardless of title wording.
pub fn map_event(record: &RawEventRecord, mode: &MatchMode) -> Vec<EventCandidate> {
    let matched: Vec<&EmbeddedPerformer> = record
        .performers
        .iter()
        .filter(|p| performer_matches(p, mode))
        .collect();
    if matched.is_empty() {
        return Vec::new();
    }

    if matches!(mode, MatchMode::Name { .. }) {
        if let Some(reason) = title_guard(&record.title) {
            debug!(
                event_id = %record.id,
                title = %record.title,
                ?reason,
                "discarding name-matched event, title marks a non-authentic performance"
            );
            return Vec::new();
        }
    }

    let venue = record.venues.first();
    matched
        .into_iter()
        .map(|performer| EventCandidate {
            source: EVENT_SOURCE.to_string(),
            source_id: record.id.clone(),
            event_name: record.title.clone(),
            artist_name: performer.name.clone(),
            venue_name: venue.and_then(|v| v.name.clone()),
            city: venue.and_then(|v| v.city.clone()),
            state: venue.and_then(|v| v.state.clone()),
            country: venue.and_then(|v| v.country.clone()),
            lat: venue
                .and_then(|v| v.latitude.as_deref())
                .and_then(|s| s.parse::<f64>().ok()),
            lon: venue
                .and_then(|v| v.longitude.as_deref())
                .and_then(|s| s.parse::<f64>().ok()),
            start_utc: record.start_utc.clone(),
            url: record.url.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmbeddedVenue;

    fn record(title: &str, performers: Vec<EmbeddedPerformer>) -> RawEventRecord {
        RawEventRecord {
            id: "ev1".to_string(),
            title: title.to_string(),
            url: "https://tickets.example/ev1".to_string(),
            start_utc: Some("2026-09-20T02:00:00Z".to_string()),
            performers,
            venues: vec![EmbeddedVenue {
                name: Some("The Showbox".to_string()),
                city: Some("Seattle".to_string()),
                state: Some("WA".to_string()),
                country: Some("US".to_string()),
                latitude: Some("47.6085".to_string()),
                longitude: Some("-122.3401".to_string()),
            }],
        }
    }

    fn performer(id: Option<&str>, name: &str) -> EmbeddedPerformer {
        EmbeddedPerformer {
            id: id.map(str::to_string),
            name: name.to_string(),
        }
    }

    #[test]
    fn identity_mode_requires_id_and_name() {
        let mode = MatchMode::Identity {
            ensure_id: "K8vZ91".to_string(),
            artist_name: "Queen".to_string(),
        };
        assert!(performer_matches(&performer(Some("K8vZ91"), "Queen"), &mode));
        // id matches but the performer record was renamed/merged
        assert!(!performer_matches(
            &performer(Some("K8vZ91"), "Queen + Adam Lambert"),
            &mode
        ));
        assert!(!performer_matches(&performer(Some("other"), "Queen"), &mode));
        assert!(!performer_matches(&performer(None, "Queen"), &mode));
    }

    #[test]
    fn name_mode_is_exact_normalized_equality() {
        let mode = MatchMode::Name {
            artist_name: "Beyoncé".to_string(),
        };
        assert!(performer_matches(&performer(None, "beyonce"), &mode));
        // no phrase-containment relaxation, even for multi-word names
        let multi = MatchMode::Name {
            artist_name: "Chris Brown".to_string(),
        };
        assert!(!performer_matches(
            &performer(None, "Chris Brown & Friends"),
            &multi
        ));
    }

    #[test]
    fn title_guard_flags_markers_word_bounded() {
        assert_eq!(title_guard("Tribute to Queen"), Some(GuardReason::Tribute));
        assert_eq!(
            title_guard("Candlelight: Coldplay favorites"),
            Some(GuardReason::Candlelight)
        );
        assert_eq!(
            title_guard("The Orchestra Performs The Music Of Pink Floyd"),
            Some(GuardReason::MusicOf)
        );
        assert_eq!(title_guard("80s Night"), Some(GuardReason::ThemedNight));
        // whole words only
        assert_eq!(title_guard("Nightwish"), None);
        assert_eq!(title_guard("Radiohead"), None);
    }

    #[test]
    fn name_match_on_tribute_title_is_discarded() {
        let rec = record("Tribute to Queen", vec![performer(None, "Queen")]);
        let mode = MatchMode::Name {
            artist_name: "Queen".to_string(),
        };
        assert!(map_event(&rec, &mode).is_empty());
    }

    #[test]
    fn identity_match_bypasses_title_guard() {
        let rec = record(
            "Tribute to Queen",
            vec![performer(Some("K8vZ91"), "Queen")],
        );
        let mode = MatchMode::Identity {
            ensure_id: "K8vZ91".to_string(),
            artist_name: "Queen".to_string(),
        };
        let out = map_event(&rec, &mode);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].artist_name, "Queen");
    }

    #[test]
    fn candidate_carries_provider_spelling_and_first_venue() {
        let rec = record("An Evening With Sigur Ros", vec![performer(None, "Sigur Rós")]);
        let mode = MatchMode::Name {
            artist_name: "sigur ros".to_string(),
        };
        let out = map_event(&rec, &mode);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.artist_name, "Sigur Rós");
        assert_eq!(c.venue_name.as_deref(), Some("The Showbox"));
        assert_eq!(c.lat, Some(47.6085));
        assert_eq!(c.lon, Some(-122.3401));
        assert_eq!(c.source, "ticketmaster");
    }

    #[test]
    fn unmatched_record_produces_nothing() {
        let rec = record("Queen Live", vec![performer(None, "Queen")]);
        let mode = MatchMode::Name {
            artist_name: "Kiss".to_string(),
        };
        assert!(map_event(&rec, &mode).is_empty());
    }

    #[test]
    fn one_candidate_per_matched_performer() {
        // Same act listed twice under co-headline billing quirks
        let rec = record(
            "Queen Live",
            vec![performer(None, "Queen"), performer(Some("x"), "Queen")],
        );
        let mode = MatchMode::Name {
            artist_name: "Queen".to_string(),
        };
        assert_eq!(map_event(&rec, &mode).len(), 2);
    }
}
