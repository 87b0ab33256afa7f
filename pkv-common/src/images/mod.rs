//! Venue image resolution
//!
//! Maps a venue to the best available photo URL. Strategies are tried in
//! priority order and the first hit wins:
//!
//! 1. Exact Place ID match in the mapping table
//! 2. Exact name match (case-insensitive), preferring same category and city
//! 3. Fuzzy name match (normalised names, Jaro-Winkler, token containment)
//! 4. Image URL declared on the venue record itself
//! 5. Probing generated folder paths (`<category>/<spelling>/<file>`)
//! 6. Placeholder (per category when configured)
//!
//! Every outcome, placeholder included, is cached per venue key so repeated
//! listing renders never repeat the matching or probing work.

pub mod mapping;
pub mod paths;
pub mod probe;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::ImageConfig;
use crate::model::Venue;
use crate::text::{fold, normalize_name};

pub use mapping::{ImageMapping, MappingEntry};
pub use probe::{HttpProbe, ImageProbe, ManifestProbe, NoProbe};

/// Score given to a name whose words are all contained in the other name
const CONTAINMENT_SCORE: f64 = 0.9;
/// Bonus for a fuzzy candidate located in the venue's city
const SAME_CITY_BONUS: f64 = 0.02;

/// Which strategy produced an image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSource {
    PlaceId,
    ExactName,
    FuzzyName { score: f64 },
    Declared,
    Probed { key: String },
    Placeholder,
}

impl MatchSource {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, MatchSource::Placeholder)
    }
}

/// Resolved image for one venue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedImage {
    /// Cover image URL
    pub url: String,
    /// All known images, cover first (just the cover for non-mapping sources)
    pub gallery: Vec<String>,
    pub source: MatchSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_folder: Option<String>,
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Image resolver shared by all request handlers
pub struct ImageResolver {
    mapping: ImageMapping,
    probe: Box<dyn ImageProbe>,
    config: ImageConfig,
    cache: RwLock<HashMap<String, ResolvedImage>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("mapping_entries", &self.mapping.len())
            .field("probe", &self.probe.name())
            .finish()
    }
}

/// Cache key: Place ID when known, otherwise category + normalised name + city
pub fn cache_key(venue: &Venue) -> String {
    match venue.place_id.as_deref() {
        Some(place_id) => format!("place:{}", place_id),
        None => format!(
            "{}:{}:{}",
            venue.category.slug(),
            normalize_name(&venue.name),
            fold(&venue.city)
        ),
    }
}

/// Similarity of two normalised names in [0, 1]
fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let mut score = strsim::jaro_winkler(a, b);

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let longer_words: Vec<&str> = longer.split_whitespace().collect();
    if shorter.split_whitespace().all(|w| longer_words.contains(&w)) {
        score = score.max(CONTAINMENT_SCORE);
    }

    score
}

impl ImageResolver {
    pub fn new(mapping: ImageMapping, probe: Box<dyn ImageProbe>, config: ImageConfig) -> Self {
        Self {
            mapping,
            probe,
            config,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn mapping(&self) -> &ImageMapping {
        &self.mapping
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }

    fn default_file(&self) -> &str {
        self.config
            .probe_files
            .first()
            .map(String::as_str)
            .unwrap_or("1.jpg")
    }

    /// Placeholder for a venue's category
    pub fn placeholder(&self, venue: &Venue) -> ResolvedImage {
        let url = self
            .config
            .category_placeholders
            .get(venue.category.slug())
            .cloned()
            .unwrap_or_else(|| self.config.placeholder_url.clone());
        ResolvedImage {
            gallery: vec![url.clone()],
            url,
            source: MatchSource::Placeholder,
            s3_folder: None,
        }
    }

    fn from_entry(&self, index: usize, source: MatchSource) -> ResolvedImage {
        let entry = self.mapping.entry(index);
        let gallery = entry.image_urls(&self.config.base_url, self.default_file());
        ResolvedImage {
            url: gallery[0].clone(),
            gallery,
            source,
            s3_folder: Some(entry.s3_folder.trim_matches('/').to_string()),
        }
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), key)
    }

    /// Mapping-table strategies: Place ID, exact name, fuzzy name
    pub fn match_mapping(&self, venue: &Venue) -> Option<(usize, MatchSource)> {
        if let Some(index) = venue
            .place_id
            .as_deref()
            .and_then(|id| self.mapping.find_by_place_id(id))
        {
            return Some((index, MatchSource::PlaceId));
        }

        // Same category beats same city; ties keep mapping order
        let exact = self
            .mapping
            .find_by_name(&venue.name)
            .iter()
            .copied()
            .min_by_key(|&i| {
                let entry = self.mapping.entry(i);
                let category_rank = if entry.accepts(venue.category) { 0 } else { 2 };
                let city_rank = if entry.in_city(&venue.city) { 0 } else { 1 };
                category_rank + city_rank
            });
        if let Some(index) = exact {
            return Some((index, MatchSource::ExactName));
        }

        let wanted = normalize_name(&venue.name);
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.mapping.len() {
            let entry = self.mapping.entry(index);
            if !entry.accepts(venue.category) {
                continue;
            }
            let mut score = name_similarity(&wanted, self.mapping.normalized_name(index));
            if entry.in_city(&venue.city) {
                score += SAME_CITY_BONUS;
            }
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((index, score));
            }
        }

        best.filter(|&(_, score)| score >= self.config.fuzzy_threshold)
            .map(|(index, score)| (index, MatchSource::FuzzyName { score: score.min(1.0) }))
    }

    /// First generated key the probe confirms
    async fn probe_paths(&self, venue: &Venue) -> Option<String> {
        let keys = paths::candidate_keys(venue, &self.config.probe_files, self.config.max_probes);
        for key in keys {
            if self.probe.exists(&key).await {
                return Some(key);
            }
        }
        None
    }

    /// Run every strategy without touching the cache
    pub async fn resolve_uncached(&self, venue: &Venue) -> ResolvedImage {
        if let Some((index, source)) = self.match_mapping(venue) {
            return self.from_entry(index, source);
        }

        if let Some(url) = venue.image_url.as_deref() {
            return ResolvedImage {
                url: url.to_string(),
                gallery: vec![url.to_string()],
                source: MatchSource::Declared,
                s3_folder: venue.s3_folder.clone(),
            };
        }

        if let Some(key) = self.probe_paths(venue).await {
            let url = self.key_url(&key);
            let folder = key.rsplit_once('/').map(|(folder, _)| folder.to_string());
            return ResolvedImage {
                gallery: vec![url.clone()],
                url,
                source: MatchSource::Probed { key },
                s3_folder: folder,
            };
        }

        self.placeholder(venue)
    }

    /// Resolve a venue's image, consulting and filling the cache
    pub async fn resolve(&self, venue: &Venue) -> ResolvedImage {
        let key = cache_key(venue);

        if let Some(found) = self.cache.read().await.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return found.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let resolved = self.resolve_uncached(venue).await;
        debug!(
            venue = %venue.id,
            category = %venue.category,
            source = ?resolved.source,
            url = %resolved.url,
            "Resolved venue image"
        );

        self.cache.write().await.insert(key, resolved.clone());
        resolved
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.read().await.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all cached results, returning how many were removed
    pub async fn clear(&self) -> usize {
        let mut cache = self.cache.write().await;
        let removed = cache.len();
        cache.clear();
        removed
    }
}
