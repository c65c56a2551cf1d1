use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{RadarError, Result};

const CONFIG_PATH: &str = "config.toml";

/// Tunable settings, read from `config.toml` when present. Secrets never
/// live here; see [`Secrets`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// User location as "lat,lon" decimal degrees.
    pub geo_point: String,
    /// Event-search radius; the provider accepts [1, 200] miles.
    pub radius_miles: u32,
    /// How far into the future to search.
    pub lookahead_days: i64,
    /// Pacing delay between downstream requests per worker.
    pub delay_ms: u64,
    /// Bounded-mapper concurrency for provider queries.
    pub fetch_concurrency: usize,
    /// Cap on library items walked for the Liked signal.
    pub max_library_items: usize,
    /// Page size for cursor-paginated profile listings.
    pub page_size: usize,
    /// Maximum artist-pool size after merge.
    pub pool_cap: usize,
    /// Result-size cap per event query.
    pub events_per_artist: usize,
    /// Cap on the final ranked output.
    pub max_results: usize,
    /// Case-insensitive artist names excluded from the pool.
    pub ignore_artists: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geo_point: "47.6062,-122.3321".to_string(),
            radius_miles: 50,
            lookahead_days: 180,
            delay_ms: 250,
            fetch_concurrency: 2,
            max_library_items: 200,
            page_size: 50,
            pool_cap: 60,
            events_per_artist: 20,
            max_results: 50,
            ignore_artists: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads `config.toml`, falling back to defaults when the file is
    /// absent. A present-but-invalid file is an error, not a silent default.
    pub fn load() -> Result<Self> {
        if !Path::new(CONFIG_PATH).exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(CONFIG_PATH).map_err(|e| {
            RadarError::Config(format!("failed to read '{}': {}", CONFIG_PATH, e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Parses `geo_point` into coordinates.
    pub fn user_coords(&self) -> Result<(f64, f64)> {
        let (lat, lon) = self
            .geo_point
            .split_once(',')
            .ok_or_else(|| RadarError::Config(format!("geo_point '{}' is not 'lat,lon'", self.geo_point)))?;
        let parse = |s: &str, which: &str| {
            s.trim().parse::<f64>().map_err(|_| {
                RadarError::Config(format!("geo_point {} '{}' is not a number", which, s))
            })
        };
        Ok((parse(lat, "latitude")?, parse(lon, "longitude")?))
    }
}

/// Provider credentials, read from the environment (a `.env` file is loaded
/// by the binary before this runs).
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Already-acquired Spotify user access token; the OAuth flow is
    /// external to this process.
    pub spotify_token: String,
    /// Ticketmaster Discovery API key.
    pub ticketmaster_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            spotify_token: std::env::var("SPOTIFY_ACCESS_TOKEN").map_err(|_| {
                RadarError::Config("SPOTIFY_ACCESS_TOKEN is not set".to_string())
            })?,
            ticketmaster_key: std::env::var("TICKETMASTER_API_KEY").map_err(|_| {
                RadarError::Config("TICKETMASTER_API_KEY is not set".to_string())
            })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_parses() {
        let settings = Settings::default();
        let (lat, lon) = settings.user_coords().unwrap();
        assert!((lat - 47.6062).abs() < 1e-9);
        assert!((lon + 122.3321).abs() < 1e-9);
    }

    #[test]
    fn malformed_geo_point_is_a_config_error() {
        let settings = Settings {
            geo_point: "downtown".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.user_coords(),
            Err(RadarError::Config(_))
        ));
    }

    #[test]
    fn settings_deserialize_with_partial_overrides() {
        let settings: Settings =
            toml::from_str("radius_miles = 120\nignore_artists = [\"Various Artists\"]").unwrap();
        assert_eq!(settings.radius_miles, 120);
        assert_eq!(settings.ignore_artists, vec!["Various Artists".to_string()]);
        // untouched fields keep their defaults
        assert_eq!(settings.max_results, Settings::default().max_results);
    }
}
