use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::domain::ArtistRef;
use crate::normalize::normalize;

/// The merged artist pool plus the lowercase-keyed membership sets the
/// ranker scores against. `preferred` holds everything retained in the pool;
/// the tier sets are taken per source list before the cap, so a capped-out
/// artist still scores its tier if the provider surfaces it anyway.
#[derive(Debug)]
pub struct ArtistPool {
    pub artists: Vec<ArtistRef>,
    pub liked: HashSet<String>,
    pub top: HashSet<String>,
    pub followed: HashSet<String>,
    pub preferred: HashSet<String>,
}

/// Merges the three ranked signal lists into one ordered, deduplicated,
/// capped pool.
///
/// Concatenation order is liked, top, followed: Liked-Songs artists are the
/// strongest signal of genuine listening and must come first so truncation
/// never drops them in favor of broader signals. Entries whose normalized
/// name is in the ignore set are dropped; duplicates (by normalized name)
/// keep their first-seen position and union their tier tags.
pub fn build_pool(
    liked: Vec<ArtistRef>,
    top: Vec<ArtistRef>,
    followed: Vec<ArtistRef>,
    ignore: &HashSet<String>,
    cap: usize,
) -> ArtistPool {
    let ignored: HashSet<String> = ignore.iter().map(|s| normalize(s)).collect();
    let keep = |a: &ArtistRef| {
        let key = normalize(&a.name);
        !key.is_empty() && !ignored.contains(&key)
    };

    let tier_names = |list: &[ArtistRef]| -> HashSet<String> {
        list.iter()
            .filter(|a| keep(a))
            .map(|a| a.name.to_lowercase())
            .collect()
    };
    let liked_set = tier_names(&liked);
    let top_set = tier_names(&top);
    let followed_set = tier_names(&followed);

    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, ArtistRef> = HashMap::new();
    for artist in liked.into_iter().chain(top).chain(followed) {
        if !keep(&artist) {
            continue;
        }
        let key = normalize(&artist.name);
        match by_key.get_mut(&key) {
            Some(existing) => {
                existing.tiers.extend(artist.tiers.iter().copied());
                if existing.id.is_none() {
                    existing.id = artist.id;
                }
                if existing.genres.is_empty() {
                    existing.genres = artist.genres;
                }
            }
            None => {
                order.push(key.clone());
                by_key.insert(key, artist);
            }
        }
    }
    order.truncate(cap);

    let artists: Vec<ArtistRef> = order
        .iter()
        .filter_map(|key| by_key.remove(key))
        .collect();
    let preferred: HashSet<String> = artists.iter().map(|a| a.name.to_lowercase()).collect();

    info!(
        pool = artists.len(),
        liked = liked_set.len(),
        top = top_set.len(),
        followed = followed_set.len(),
        "built artist pool"
    );

    ArtistPool {
        artists,
        liked: liked_set,
        top: top_set,
        followed: followed_set,
        preferred,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;

    fn refs(names: &[&str], tier: Tier) -> Vec<ArtistRef> {
        names
            .iter()
            .map(|n| ArtistRef::new(None, *n, Vec::new(), tier))
            .collect()
    }

    #[test]
    fn merges_tiers_and_preserves_first_seen_order() {
        let pool = build_pool(
            refs(&["A", "b", "A"], Tier::Liked),
            refs(&["B"], Tier::Top),
            Vec::new(),
            &HashSet::new(),
            10,
        );
        let names: Vec<&str> = pool.artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b"]);
        assert_eq!(pool.artists[0].tiers, [Tier::Liked].into());
        assert_eq!(pool.artists[1].tiers, [Tier::Liked, Tier::Top].into());
    }

    #[test]
    fn liked_survives_truncation_over_broader_signals() {
        let pool = build_pool(
            refs(&["one", "two"], Tier::Liked),
            refs(&["three", "four"], Tier::Top),
            refs(&["five"], Tier::Followed),
            &HashSet::new(),
            3,
        );
        let names: Vec<&str> = pool.artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        // tier sets are pre-cap
        assert!(pool.followed.contains("five"));
        assert!(!pool.preferred.contains("five"));
    }

    #[test]
    fn ignore_set_is_case_insensitive() {
        let ignore: HashSet<String> = ["dj screeches"].iter().map(|s| s.to_string()).collect();
        let pool = build_pool(
            refs(&["DJ Screeches", "Mitski"], Tier::Liked),
            Vec::new(),
            Vec::new(),
            &ignore,
            10,
        );
        let names: Vec<&str> = pool.artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Mitski"]);
        assert!(!pool.liked.contains("dj screeches"));
    }

    #[test]
    fn later_duplicate_backfills_missing_id() {
        let liked = vec![ArtistRef::new(None, "Mitski", Vec::new(), Tier::Liked)];
        let top = vec![ArtistRef::new(
            Some("sp123".to_string()),
            "mitski",
            vec!["indie rock".to_string()],
            Tier::Top,
        )];
        let pool = build_pool(liked, top, Vec::new(), &HashSet::new(), 10);
        assert_eq!(pool.artists.len(), 1);
        assert_eq!(pool.artists[0].id.as_deref(), Some("sp123"));
        assert_eq!(pool.artists[0].genres, vec!["indie rock".to_string()]);
        // first spelling wins
        assert_eq!(pool.artists[0].name, "Mitski");
    }

    #[test]
    fn empty_inputs_build_empty_pool() {
        let pool = build_pool(Vec::new(), Vec::new(), Vec::new(), &HashSet::new(), 10);
        assert!(pool.artists.is_empty());
        assert!(pool.preferred.is_empty());
    }
}
