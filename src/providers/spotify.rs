use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{ArtistRef, Tier};
use crate::error::{RadarError, Result};
use crate::providers::{MusicProfileProvider, Page, RankingWindow};

const API_BASE: &str = "https://api.spotify.com/v1";

/// Spotify Web API client. Expects an already-acquired user access token;
/// the OAuth dance lives outside this process.
pub struct SpotifyClient {
    client: reqwest::Client,
    token: String,
}

impl SpotifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RadarError::Provider {
                message: format!("spotify {} returned {}", what, response.status()),
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: Option<String>,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
}

impl SpotifyArtist {
    fn into_ref(self, tier: Tier) -> ArtistRef {
        ArtistRef::new(self.id, self.name, self.genres, tier)
    }
}

#[derive(Debug, Deserialize)]
struct SavedTracksPage {
    items: Vec<SavedTrackItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavedTrackItem {
    track: Option<SavedTrack>,
}

#[derive(Debug, Deserialize)]
struct SavedTrack {
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct TopArtistsPage {
    items: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct FollowingEnvelope {
    artists: FollowedArtistsPage,
}

#[derive(Debug, Deserialize)]
struct FollowedArtistsPage {
    items: Vec<SpotifyArtist>,
    #[serde(default)]
    cursors: FollowCursors,
}

#[derive(Debug, Default, Deserialize)]
struct FollowCursors {
    after: Option<String>,
}

#[async_trait]
impl MusicProfileProvider for SpotifyClient {
    /// Liked-Songs page. The cursor is the provider's own `next` URL.
    #[instrument(skip(self))]
    async fn library_page(&self, cursor: Option<String>, limit: usize) -> Result<Page<ArtistRef>> {
        let url = cursor.unwrap_or_else(|| format!("{}/me/tracks?limit={}", API_BASE, limit));
        let page: SavedTracksPage = self.get_json(&url, "/me/tracks").await?;
        debug!(tracks = page.items.len(), "fetched liked-tracks page");
        let items = page
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .flat_map(|track| track.artists)
            .map(|artist| artist.into_ref(Tier::Liked))
            .collect();
        Ok(Page {
            items,
            next: page.next,
        })
    }

    #[instrument(skip(self))]
    async fn top_artists(&self, window: RankingWindow) -> Result<Vec<ArtistRef>> {
        let time_range = match window {
            RankingWindow::Short => "short_term",
            RankingWindow::Medium => "medium_term",
            RankingWindow::Long => "long_term",
        };
        let url = format!(
            "{}/me/top/artists?time_range={}&limit=50",
            API_BASE, time_range
        );
        let page: TopArtistsPage = self.get_json(&url, "/me/top/artists").await?;
        debug!(artists = page.items.len(), ?window, "fetched top artists");
        Ok(page
            .items
            .into_iter()
            .map(|artist| artist.into_ref(Tier::Top))
            .collect())
    }

    #[instrument(skip(self))]
    async fn followed_page(&self, after: Option<String>, limit: usize) -> Result<Page<ArtistRef>> {
        let mut url = format!("{}/me/following?type=artist&limit={}", API_BASE, limit);
        if let Some(after) = after {
            url.push_str(&format!("&after={}", after));
        }
        let envelope: FollowingEnvelope = self.get_json(&url, "/me/following").await?;
        let page = envelope.artists;
        debug!(artists = page.items.len(), "fetched followed-artists page");
        // Spotify keeps returning an `after` cursor on the final page; an
        // empty page is the real end and drain_pages treats it as such.
        Ok(Page {
            items: page
                .items
                .into_iter()
                .map(|artist| artist.into_ref(Tier::Followed))
                .collect(),
            next: page.cursors.after,
        })
    }
}
