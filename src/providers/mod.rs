pub mod spotify;
pub mod ticketmaster;

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ArtistRef, RawEventRecord};
use crate::error::Result;

/// One page of a cursor-paginated listing. `next` is an opaque pointer the
/// provider understands; `None` means the listing is exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Ranking window for the profile provider's top-artists query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingWindow {
    Short,
    Medium,
    Long,
}

impl RankingWindow {
    pub const ALL: [RankingWindow; 3] =
        [RankingWindow::Short, RankingWindow::Medium, RankingWindow::Long];
}

/// Authenticated source of the user's taste signals. Each listing method
/// tags the artists it yields with its own tier.
#[async_trait]
pub trait MusicProfileProvider: Send + Sync {
    /// One page of the user's library items, yielding the embedded artists.
    async fn library_page(&self, cursor: Option<String>, limit: usize) -> Result<Page<ArtistRef>>;

    /// The user's top artists for one ranking window, single page of up to 50.
    async fn top_artists(&self, window: RankingWindow) -> Result<Vec<ArtistRef>>;

    /// One page of the artists the user follows.
    async fn followed_page(&self, after: Option<String>, limit: usize) -> Result<Page<ArtistRef>>;
}

/// A performer candidate from the event-search provider's keyword lookup.
#[derive(Debug, Clone)]
pub struct PerformerRef {
    pub id: String,
    pub name: String,
}

/// Geographic and temporal bounds shared by every event search.
#[derive(Debug, Clone)]
pub struct SearchWindow {
    pub lat: f64,
    pub lon: f64,
    pub radius_miles: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub size: usize,
}

impl SearchWindow {
    /// The provider rejects radii outside [1, 200] of its distance unit, so
    /// clamp here instead of surfacing its 400s.
    pub fn new(
        lat: f64,
        lon: f64,
        radius_miles: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        size: usize,
    ) -> Self {
        Self {
            lat,
            lon,
            radius_miles: radius_miles.clamp(1, 200),
            start,
            end,
            size,
        }
    }
}

/// The three shapes of event search the provider supports.
#[derive(Debug, Clone)]
pub enum EventQuery {
    ByPerformer { performer_id: String },
    ByKeyword { keyword: String },
    Generic,
}

/// Unauthenticated (static-key) source of event records.
#[async_trait]
pub trait EventSearchProvider: Send + Sync {
    /// Performer lookup by free-text keyword.
    async fn find_performers(&self, keyword: &str) -> Result<Vec<PerformerRef>>;

    /// Event search within `window`, shaped by `query`. Every returned
    /// record embeds its matched performer(s) and at least one venue.
    async fn search_events(
        &self,
        query: &EventQuery,
        window: &SearchWindow,
    ) -> Result<Vec<RawEventRecord>>;
}

/// Folds a cursor-paginated listing into one vec, fetching until the
/// provider reports no further cursor or `cap` items have accumulated.
pub async fn drain_pages<T, F, Fut>(mut fetch_page: F, cap: usize) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    loop {
        let page = fetch_page(cursor).await?;
        let empty = page.items.is_empty();
        items.extend(page.items);
        if items.len() >= cap {
            items.truncate(cap);
            break;
        }
        match page.next {
            // An empty page with a cursor would loop forever; stop instead.
            Some(next) if !empty => cursor = Some(next),
            _ => break,
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(data: Vec<(Vec<u32>, Option<&str>)>) -> impl FnMut(Option<String>) -> std::future::Ready<Result<Page<u32>>> {
        let mut remaining: std::collections::VecDeque<Page<u32>> = data
            .into_iter()
            .map(|(items, next)| Page {
                items,
                next: next.map(str::to_string),
            })
            .collect();
        move |_cursor| {
            let page = remaining.pop_front().unwrap_or(Page {
                items: Vec::new(),
                next: None,
            });
            std::future::ready(Ok(page))
        }
    }

    #[tokio::test]
    async fn drains_until_cursor_exhausted() {
        let fetched = drain_pages(
            pages(vec![
                (vec![1, 2], Some("c1")),
                (vec![3], Some("c2")),
                (vec![4], None),
            ]),
            100,
        )
        .await
        .unwrap();
        assert_eq!(fetched, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn truncates_at_cap() {
        let fetched = drain_pages(
            pages(vec![(vec![1, 2, 3], Some("c1")), (vec![4, 5], None)]),
            4,
        )
        .await
        .unwrap();
        assert_eq!(fetched, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn stops_on_empty_page_with_dangling_cursor() {
        let fetched = drain_pages(pages(vec![(vec![], Some("c1"))]), 100)
            .await
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[test]
    fn radius_is_clamped_to_provider_bounds() {
        let now = Utc::now();
        assert_eq!(SearchWindow::new(0.0, 0.0, 0, now, now, 10).radius_miles, 1);
        assert_eq!(SearchWindow::new(0.0, 0.0, 75, now, now, 10).radius_miles, 75);
        assert_eq!(SearchWindow::new(0.0, 0.0, 999, now, now, 10).radius_miles, 200);
    }
}
