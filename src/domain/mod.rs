use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Constant source tag carried by every candidate produced from the
/// event-search provider.
pub const EVENT_SOURCE: &str = "ticketmaster";

/// Provenance of an artist signal: which taste source(s) surfaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Liked,
    Top,
    Followed,
}

/// An artist as seen by the profile provider, tagged with every tier that
/// surfaced it. One entry exists per identity within a request; when the
/// same artist reappears from another source only `tiers` is unioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
    pub genres: Vec<String>,
    pub tiers: BTreeSet<Tier>,
}

impl ArtistRef {
    pub fn new(id: Option<String>, name: impl Into<String>, genres: Vec<String>, tier: Tier) -> Self {
        Self {
            id,
            name: name.into(),
            genres,
            tiers: BTreeSet::from([tier]),
        }
    }
}

/// A performer embedded in a raw event record (the provider's "attraction").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedPerformer {
    pub id: Option<String>,
    pub name: String,
}

/// A venue embedded in a raw event record. Coordinates arrive as decimal
/// strings and are only parsed at candidate-mapping time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddedVenue {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// An event exactly as returned by the event-search provider, owned solely
/// by the query that fetched it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    /// ISO-8601 start instant, when the provider knows it.
    pub start_utc: Option<String>,
    pub performers: Vec<EmbeddedPerformer>,
    pub venues: Vec<EmbeddedVenue>,
}

/// Normalized projection of one raw event record. Carries the matched
/// performer's own name (the provider's spelling, not the query string) and
/// no back-reference to the raw record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCandidate {
    pub source: String,
    pub source_id: String,
    pub event_name: String,
    pub artist_name: String,
    pub venue_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub start_utc: Option<String>,
    pub url: String,
}

/// An event candidate plus its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEvent {
    #[serde(flatten)]
    pub event: EventCandidate,
    pub score: f64,
}
