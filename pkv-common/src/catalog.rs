//! Static venue catalog loaded from per-category JSON datasets
//!
//! The data directory holds one `<category-slug>.json` file per category, each
//! a JSON array of venue records. Files are read once at startup; the catalog
//! is immutable afterwards and shared behind an `Arc`.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::model::{Category, Venue, VenueRecord};
use crate::text::fold;
use crate::{Error, Result};

/// Outcome of loading one category dataset
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryReport {
    /// Dataset file was present
    pub found: bool,
    pub loaded: usize,
    /// Records rejected during normalisation (missing name/city)
    pub skipped: usize,
    /// Records dropped because their id was already used in the category
    pub duplicates: usize,
}

/// Summary of a full dataset load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub categories: BTreeMap<Category, CategoryReport>,
}

impl LoadReport {
    pub fn total_loaded(&self) -> usize {
        self.categories.values().map(|c| c.loaded).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.categories.values().map(|c| c.skipped + c.duplicates).sum()
    }
}

/// Venue count for a category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub name: &'static str,
    pub count: usize,
}

/// Venue count for a city
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

/// Venue count for a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Immutable in-memory venue catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    venues: Vec<Venue>,
    by_id: HashMap<(Category, String), usize>,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-normalised venues
    ///
    /// Later venues with an id already present in their category are dropped.
    pub fn from_venues(venues: impl IntoIterator<Item = Venue>) -> Self {
        let mut catalog = Catalog::default();
        for venue in venues {
            catalog.insert(venue);
        }
        catalog
    }

    /// Insert a venue, returning false if its id is already taken
    fn insert(&mut self, venue: Venue) -> bool {
        let key = (venue.category, venue.id.clone());
        if self.by_id.contains_key(&key) {
            return false;
        }

        let index = self.venues.len();
        self.by_id.insert(key, index);
        self.by_slug.entry(venue.slug.clone()).or_insert(index);
        self.venues.push(venue);
        true
    }

    /// Load every category dataset found in `dir`
    ///
    /// Missing files are logged and skipped. A file that is not a JSON array
    /// of records fails the whole load so a broken deploy is noticed at
    /// startup rather than serving a partial catalog.
    pub fn load_dir(dir: &Path) -> Result<(Self, LoadReport)> {
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "Data directory does not exist: {}",
                dir.display()
            )));
        }

        let mut catalog = Catalog::default();
        let mut report = LoadReport::default();

        for category in Category::ALL {
            let path = dir.join(category.dataset_file());
            let mut entry = CategoryReport::default();

            if !path.exists() {
                warn!(category = %category, path = %path.display(), "Dataset file missing, category will be empty");
                report.categories.insert(category, entry);
                continue;
            }
            entry.found = true;

            let content = std::fs::read_to_string(&path).map_err(|e| Error::dataset(&path, e))?;
            let records: Vec<serde_json::Value> =
                serde_json::from_str(&content).map_err(|e| Error::dataset(&path, e))?;

            for (index, raw) in records.into_iter().enumerate() {
                let record = match serde_json::from_value::<VenueRecord>(raw) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(category = %category, index, error = %e, "Skipping mistyped venue record");
                        entry.skipped += 1;
                        continue;
                    }
                };
                match Venue::from_record(record, category) {
                    Ok(venue) => {
                        let id = venue.id.clone();
                        if catalog.insert(venue) {
                            entry.loaded += 1;
                        } else {
                            warn!(category = %category, venue = %id, "Duplicate venue id, keeping first record");
                            entry.duplicates += 1;
                        }
                    }
                    Err(e) => {
                        debug!(category = %category, index, error = %e, "Skipping invalid venue record");
                        entry.skipped += 1;
                    }
                }
            }

            info!(
                category = %category,
                loaded = entry.loaded,
                skipped = entry.skipped,
                duplicates = entry.duplicates,
                "Loaded dataset"
            );
            report.categories.insert(category, entry);
        }

        Ok((catalog, report))
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Venue> {
        self.venues.iter()
    }

    /// Look up a venue by category and id
    pub fn get(&self, category: Category, id: &str) -> Option<&Venue> {
        self.by_id
            .get(&(category, id.to_string()))
            .map(|&i| &self.venues[i])
    }

    /// Look up a venue by its slug (first venue wins on slug collisions)
    pub fn find_by_slug(&self, slug: &str) -> Option<&Venue> {
        self.by_slug.get(slug).map(|&i| &self.venues[i])
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Venue> {
        self.venues.iter().filter(move |v| v.category == category)
    }

    /// Venue counts for all categories, including empty ones
    pub fn category_counts(&self) -> Vec<CategoryCount> {
        Category::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category,
                name: category.display_name(),
                count: self.by_category(category).count(),
            })
            .collect()
    }

    /// Venue counts per city, most venues first
    ///
    /// Cities are grouped case-insensitively; the first spelling seen is kept.
    pub fn city_counts(&self) -> Vec<CityCount> {
        let mut counts: HashMap<String, CityCount> = HashMap::new();
        for venue in &self.venues {
            counts
                .entry(fold(&venue.city))
                .or_insert_with(|| CityCount {
                    city: venue.city.clone(),
                    count: 0,
                })
                .count += 1;
        }

        let mut cities: Vec<CityCount> = counts.into_values().collect();
        cities.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
        cities
    }

    /// Tag counts across the catalog, most used first
    ///
    /// Tags are grouped case-insensitively; the first spelling seen is kept.
    pub fn tag_counts(&self) -> Vec<TagCount> {
        let mut counts: HashMap<String, TagCount> = HashMap::new();
        for tag in self.venues.iter().flat_map(|v| v.tags.iter()) {
            counts
                .entry(fold(tag))
                .or_insert_with(|| TagCount {
                    tag: tag.clone(),
                    count: 0,
                })
                .count += 1;
        }

        let mut tags: Vec<TagCount> = counts.into_values().collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags
    }
}
