use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{EmbeddedPerformer, EmbeddedVenue, RawEventRecord};
use crate::error::{RadarError, Result};
use crate::providers::{EventQuery, EventSearchProvider, PerformerRef, SearchWindow};

const API_BASE: &str = "https://app.ticketmaster.com/discovery/v2";

/// Discovery API datetime format: whole seconds, Zulu, no fraction.
const TM_DATETIME: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Ticketmaster Discovery v2 client, keyed by a static API key.
pub struct TicketmasterClient {
    client: reqwest::Client,
    api_key: String,
}

impl TicketmasterClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", API_BASE, path);
        let response = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RadarError::Provider {
                message: format!("ticketmaster {} returned {}", path, response.status()),
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct AttractionsEnvelope {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedAttractions>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedAttractions {
    #[serde(default)]
    attractions: Vec<TmAttraction>,
}

#[derive(Debug, Deserialize)]
struct TmAttraction {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEvents {
    #[serde(default)]
    events: Vec<TmEvent>,
}

#[derive(Debug, Deserialize)]
struct TmEvent {
    id: String,
    name: Option<String>,
    url: Option<String>,
    dates: Option<TmDates>,
    #[serde(rename = "_embedded")]
    embedded: Option<TmEventEmbedded>,
}

#[derive(Debug, Deserialize)]
struct TmDates {
    start: Option<TmStart>,
}

#[derive(Debug, Deserialize)]
struct TmStart {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmEventEmbedded {
    #[serde(default)]
    attractions: Vec<TmAttraction>,
    #[serde(default)]
    venues: Vec<TmVenue>,
}

#[derive(Debug, Deserialize)]
struct TmVenue {
    name: Option<String>,
    city: Option<TmNamed>,
    state: Option<TmState>,
    country: Option<TmCountry>,
    location: Option<TmLocation>,
}

#[derive(Debug, Deserialize)]
struct TmNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmState {
    #[serde(rename = "stateCode")]
    state_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmCountry {
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmLocation {
    latitude: Option<String>,
    longitude: Option<String>,
}

impl TmEvent {
    fn into_record(self) -> RawEventRecord {
        let (performers, venues) = match self.embedded {
            Some(embedded) => (
                embedded
                    .attractions
                    .into_iter()
                    .map(|a| EmbeddedPerformer {
                        id: a.id,
                        name: a.name.unwrap_or_default(),
                    })
                    .collect(),
                embedded
                    .venues
                    .into_iter()
                    .map(|v| EmbeddedVenue {
                        name: v.name,
                        city: v.city.and_then(|c| c.name),
                        state: v.state.and_then(|s| s.state_code),
                        country: v.country.and_then(|c| c.country_code),
                        latitude: v.location.as_ref().and_then(|l| l.latitude.clone()),
                        longitude: v.location.as_ref().and_then(|l| l.longitude.clone()),
                    })
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        RawEventRecord {
            id: self.id,
            title: self.name.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            start_utc: self.dates.and_then(|d| d.start).and_then(|s| s.date_time),
            performers,
            venues,
        }
    }
}

#[async_trait]
impl EventSearchProvider for TicketmasterClient {
    #[instrument(skip(self))]
    async fn find_performers(&self, keyword: &str) -> Result<Vec<PerformerRef>> {
        let envelope: AttractionsEnvelope = self
            .get_json(
                "attractions.json",
                &[
                    ("keyword", keyword.to_string()),
                    ("classificationName", "music".to_string()),
                    ("size", "20".to_string()),
                ],
            )
            .await?;
        let performers: Vec<PerformerRef> = envelope
            .embedded
            .map(|e| e.attractions)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| match (a.id, a.name) {
                (Some(id), Some(name)) => Some(PerformerRef { id, name }),
                _ => None,
            })
            .collect();
        debug!(keyword, found = performers.len(), "performer lookup");
        Ok(performers)
    }

    #[instrument(skip(self, window))]
    async fn search_events(
        &self,
        query: &EventQuery,
        window: &SearchWindow,
    ) -> Result<Vec<RawEventRecord>> {
        let mut params = vec![
            ("classificationName", "music".to_string()),
            ("latlong", format!("{},{}", window.lat, window.lon)),
            ("radius", window.radius_miles.to_string()),
            ("unit", "miles".to_string()),
            ("startDateTime", window.start.format(TM_DATETIME).to_string()),
            ("endDateTime", window.end.format(TM_DATETIME).to_string()),
            ("size", window.size.to_string()),
            ("sort", "date,asc".to_string()),
        ];
        match query {
            EventQuery::ByPerformer { performer_id } => {
                params.push(("attractionId", performer_id.clone()));
            }
            EventQuery::ByKeyword { keyword } => {
                params.push(("keyword", keyword.clone()));
            }
            EventQuery::Generic => {}
        }

        let envelope: EventsEnvelope = self.get_json("events.json", &params).await?;
        let records: Vec<RawEventRecord> = envelope
            .embedded
            .map(|e| e.events)
            .unwrap_or_default()
            .into_iter()
            .map(TmEvent::into_record)
            .collect();
        debug!(?query, found = records.len(), "event search");
        Ok(records)
    }
}
