use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::dedupe::dedupe;
use crate::domain::{ArtistRef, EventCandidate, RankedEvent, RawEventRecord};
use crate::error::Result;
use crate::fetch::map_bounded;
use crate::matching::{map_event, MatchMode};
use crate::normalize::normalize;
use crate::pool::{build_pool, ArtistPool};
use crate::providers::{
    drain_pages, EventQuery, EventSearchProvider, MusicProfileProvider, RankingWindow,
    SearchWindow,
};
use crate::rank::{rank_at, RankContext};

/// End-to-end aggregation: taste signals in, ranked event candidates out.
pub struct Aggregator {
    profile: Arc<dyn MusicProfileProvider>,
    events: Arc<dyn EventSearchProvider>,
    settings: Settings,
}

impl Aggregator {
    pub fn new(
        profile: Arc<dyn MusicProfileProvider>,
        events: Arc<dyn EventSearchProvider>,
        settings: Settings,
    ) -> Self {
        Self {
            profile,
            events,
            settings,
        }
    }

    #[instrument(skip(self))]
    pub async fn recommend(&self) -> Result<Vec<RankedEvent>> {
        let (user_lat, user_lon) = self.settings.user_coords()?;

        let liked = self.liked_artists().await?;
        let top = self.top_artists().await;
        let followed = self.followed_artists().await?;
        info!(
            liked = liked.len(),
            top = top.len(),
            followed = followed.len(),
            "gathered taste signals"
        );

        let ignore: HashSet<String> = self.settings.ignore_artists.iter().cloned().collect();
        let pool = build_pool(liked, top, followed, &ignore, self.settings.pool_cap);

        let window = SearchWindow::new(
            user_lat,
            user_lon,
            self.settings.radius_miles,
            Utc::now(),
            Utc::now() + ChronoDuration::days(self.settings.lookahead_days),
            self.settings.events_per_artist,
        );

        let provider = Arc::clone(&self.events);
        let worker_window = window.clone();
        let batch = map_bounded(
            pool.artists.clone(),
            self.settings.fetch_concurrency,
            self.pace(),
            move |artist| {
                let provider = Arc::clone(&provider);
                let window = worker_window.clone();
                async move { events_for_artist(provider, artist, window).await }
            },
        )
        .await;
        if !batch.failures.is_empty() {
            warn!(
                failed = batch.failures.len(),
                "some artist queries failed; continuing with partial results"
            );
        }

        let mut candidates = batch.items;
        if candidates.is_empty() {
            candidates = self.generic_fallback(&pool, &window).await?;
        }

        let ctx = RankContext {
            user_lat: Some(user_lat),
            user_lon: Some(user_lon),
            liked: pool.liked,
            top: pool.top,
            followed: pool.followed,
            preferred: pool.preferred,
            profile_tag: None,
        };
        let mut ranked = rank_at(dedupe(candidates), &ctx, Utc::now());
        ranked.truncate(self.settings.max_results);
        info!(results = ranked.len(), "ranked event candidates");
        Ok(ranked)
    }

    fn pace(&self) -> Duration {
        Duration::from_millis(self.settings.delay_ms)
    }

    /// Liked-Songs artists: a fold over library pages, deduped in order.
    async fn liked_artists(&self) -> Result<Vec<ArtistRef>> {
        let page_size = self.settings.page_size;
        let artists = drain_pages(
            |cursor| self.profile.library_page(cursor, page_size),
            self.settings.max_library_items,
        )
        .await?;
        Ok(dedupe_by_name(artists))
    }

    /// Top artists across the three ranking windows, unioned. Window fetches
    /// run through the bounded mapper; a failed window degrades the signal
    /// rather than failing the request.
    async fn top_artists(&self) -> Vec<ArtistRef> {
        let profile = Arc::clone(&self.profile);
        let batch = map_bounded(
            RankingWindow::ALL.to_vec(),
            self.settings.fetch_concurrency,
            self.pace(),
            move |window| {
                let profile = Arc::clone(&profile);
                async move { profile.top_artists(window).await }
            },
        )
        .await;
        dedupe_by_name(batch.items)
    }

    /// Followed artists: a fold over cursor pages until exhaustion.
    async fn followed_artists(&self) -> Result<Vec<ArtistRef>> {
        let page_size = self.settings.page_size;
        let artists = drain_pages(
            |after| self.profile.followed_page(after, page_size),
            usize::MAX,
        )
        .await?;
        Ok(dedupe_by_name(artists))
    }

    /// When no artist query matched anything: one generic geo/date search,
    /// filtered to the liked set first, then to the full preferred set.
    async fn generic_fallback(
        &self,
        pool: &ArtistPool,
        window: &SearchWindow,
    ) -> Result<Vec<EventCandidate>> {
        info!("no artist-matched events; running generic geo fallback");
        let records = self
            .events
            .search_events(&EventQuery::Generic, window)
            .await?;
        let liked_hits = filter_records(&records, &pool.liked);
        if !liked_hits.is_empty() {
            return Ok(liked_hits);
        }
        Ok(filter_records(&records, &pool.preferred))
    }
}

/// Per-artist event query: identity mode when an exact-named performer id
/// resolves and yields events, name-mode keyword search otherwise.
async fn events_for_artist(
    provider: Arc<dyn EventSearchProvider>,
    artist: ArtistRef,
    window: SearchWindow,
) -> Result<Vec<EventCandidate>> {
    let target = normalize(&artist.name);
    let performers = provider.find_performers(&artist.name).await?;
    let exact = performers
        .into_iter()
        .find(|p| normalize(&p.name) == target);

    if let Some(performer) = exact {
        let mode = MatchMode::Identity {
            ensure_id: performer.id.clone(),
            artist_name: performer.name,
        };
        let records = provider
            .search_events(
                &EventQuery::ByPerformer {
                    performer_id: performer.id,
                },
                &window,
            )
            .await?;
        let candidates: Vec<EventCandidate> =
            records.iter().flat_map(|r| map_event(r, &mode)).collect();
        if !candidates.is_empty() {
            return Ok(candidates);
        }
    }

    let mode = MatchMode::Name {
        artist_name: artist.name.clone(),
    };
    let records = provider
        .search_events(
            &EventQuery::ByKeyword {
                keyword: artist.name,
            },
            &window,
        )
        .await?;
    Ok(records.iter().flat_map(|r| map_event(r, &mode)).collect())
}

/// Keeps generic-search records whose embedded performers hit the given
/// lowercase-keyed name set, mapped under name-mode rules (title guard on).
fn filter_records(records: &[RawEventRecord], names: &HashSet<String>) -> Vec<EventCandidate> {
    records
        .iter()
        .flat_map(|record| {
            record
                .performers
                .iter()
                .filter(|p| names.contains(&p.name.to_lowercase()))
                .flat_map(|p| {
                    map_event(
                        record,
                        &MatchMode::Name {
                            artist_name: p.name.clone(),
                        },
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Order-preserving per-tier dedupe by normalized name.
fn dedupe_by_name(artists: Vec<ArtistRef>) -> Vec<ArtistRef> {
    let mut seen = HashSet::with_capacity(artists.len());
    artists
        .into_iter()
        .filter(|a| seen.insert(normalize(&a.name)))
        .collect()
}
