use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{EventCandidate, RankedEvent};

/// Mean Earth radius in statute miles, accurate enough for the step
/// thresholds below.
const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// Day count assigned to events with a missing or unparseable start, pushing
/// them past every date-score threshold.
const UNKNOWN_START_DAYS: i64 = 9999;

/// Everything the ranker knows about the user: location plus the
/// lowercase-keyed membership sets produced by the pool builder.
#[derive(Debug, Default)]
pub struct RankContext {
    pub user_lat: Option<f64>,
    pub user_lon: Option<f64>,
    pub liked: HashSet<String>,
    pub top: HashSet<String>,
    pub followed: HashSet<String>,
    pub preferred: HashSet<String>,
    /// Reserved for future weighting strategies; not consulted today.
    pub profile_tag: Option<String>,
}

/// Great-circle distance in statute miles between two points.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let (delta_phi, delta_lambda) = ((lat2 - lat1).to_radians(), (lon2 - lon1).to_radians());
    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    EARTH_RADIUS_MILES * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

fn tier_score(event: &EventCandidate, ctx: &RankContext) -> f64 {
    let key = if event.artist_name.is_empty() {
        event.event_name.to_lowercase()
    } else {
        event.artist_name.to_lowercase()
    };
    if ctx.liked.contains(&key) {
        140.0
    } else if ctx.top.contains(&key) {
        95.0
    } else if ctx.followed.contains(&key) {
        75.0
    } else if ctx.preferred.contains(&key) {
        40.0
    } else {
        0.0
    }
}

/// Distance from the user to the event venue, when both sides have
/// coordinates.
fn distance_to_user(event: &EventCandidate, ctx: &RankContext) -> Option<f64> {
    match (ctx.user_lat, ctx.user_lon, event.lat, event.lon) {
        (Some(ulat), Some(ulon), Some(elat), Some(elon)) => {
            Some(haversine_miles(ulat, ulon, elat, elon))
        }
        _ => None,
    }
}

fn location_score(distance: Option<f64>) -> f64 {
    let Some(miles) = distance else { return 0.0 };
    match miles {
        m if m <= 15.0 => 6.0,
        m if m <= 50.0 => 5.0,
        m if m <= 120.0 => 4.0,
        m if m <= 200.0 => 3.0,
        m if m <= 400.0 => 1.0,
        _ => 0.0,
    }
}

fn parse_start(start_utc: Option<&str>) -> Option<DateTime<Utc>> {
    start_utc
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn date_score(start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let days = match start {
        Some(start) => (start - now).num_days().max(0),
        None => UNKNOWN_START_DAYS,
    };
    match days {
        d if d <= 14 => 2.0,
        d if d <= 45 => 1.0,
        d if d <= 180 => 1.0,
        _ => 0.0,
    }
}

/// Scores and totally orders the candidate set relative to `now`.
///
/// Descending score; ties broken by earlier start (unparseable starts sort
/// last), then by smaller distance to the user, then by event name.
pub fn rank_at(
    events: Vec<EventCandidate>,
    ctx: &RankContext,
    now: DateTime<Utc>,
) -> Vec<RankedEvent> {
    let mut scored: Vec<(EventCandidate, f64, Option<DateTime<Utc>>, f64)> = events
        .into_iter()
        .map(|event| {
            let start = parse_start(event.start_utc.as_deref());
            let distance = distance_to_user(&event, ctx);
            let score =
                tier_score(&event, ctx) + location_score(distance) + date_score(start, now);
            (event, score, start, distance.unwrap_or(f64::INFINITY))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| match (a.2, b.2) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.3.partial_cmp(&b.3).unwrap_or(Ordering::Equal))
            .then_with(|| a.0.event_name.cmp(&b.0.event_name))
    });

    scored
        .into_iter()
        .map(|(event, score, _, _)| RankedEvent { event, score })
        .collect()
}

/// `rank_at` against the current instant.
pub fn rank(events: Vec<EventCandidate>, ctx: &RankContext) -> Vec<RankedEvent> {
    rank_at(events, ctx, Utc::now())
}
