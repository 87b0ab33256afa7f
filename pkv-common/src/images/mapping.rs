//! Venue → image folder mapping table
//!
//! The table is a JSON array exported from the photo collection job. Each
//! entry names the S3 folder holding one venue's photos and, when known, the
//! venue's Place ID.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ImageConfig;
use crate::model::Category;
use crate::text::{fold, normalize_name};
use crate::{Error, Result};

/// Unknown category strings in mapping files are treated as "any category"
fn lenient_category<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Category>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// One row of the mapping table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default, alias = "placeId")]
    pub place_id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Option<Category>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(alias = "s3Folder", alias = "folder")]
    pub s3_folder: String,
    /// File names (or absolute URLs) inside the folder, cover image first
    #[serde(default)]
    pub images: Vec<String>,
}

impl MappingEntry {
    /// Whether the entry may describe a venue of `category`
    pub fn accepts(&self, category: Category) -> bool {
        self.category.map(|c| c == category).unwrap_or(true)
    }

    pub fn in_city(&self, city: &str) -> bool {
        self.city.as_deref().map(|c| fold(c) == fold(city)).unwrap_or(false)
    }

    /// Public URLs of the entry's images, cover first
    ///
    /// Entries without an image list point at `default_file` in their folder.
    pub fn image_urls(&self, base_url: &str, default_file: &str) -> Vec<String> {
        let folder = self.s3_folder.trim_matches('/');
        let files: Vec<&str> = if self.images.is_empty() {
            vec![default_file]
        } else {
            self.images.iter().map(String::as_str).collect()
        };

        files
            .into_iter()
            .map(|file| {
                if file.starts_with("http://") || file.starts_with("https://") || file.starts_with('/') {
                    file.to_string()
                } else {
                    format!("{}/{}/{}", base_url.trim_end_matches('/'), folder, file)
                }
            })
            .collect()
    }
}

/// Indexed mapping table
#[derive(Debug, Clone, Default)]
pub struct ImageMapping {
    entries: Vec<MappingEntry>,
    /// Normalised names, parallel to `entries`
    normalized: Vec<String>,
    by_place_id: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl ImageMapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        let mut mapping = ImageMapping::default();
        for entry in entries {
            mapping.push(entry);
        }
        mapping
    }

    fn push(&mut self, entry: MappingEntry) {
        let index = self.entries.len();

        if let Some(place_id) = entry.place_id.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if self.by_place_id.contains_key(place_id) {
                warn!(place_id = %place_id, name = %entry.name, "Duplicate Place ID in image mapping, keeping first");
            } else {
                self.by_place_id.insert(place_id.to_string(), index);
            }
        }
        self.by_name.entry(fold(&entry.name)).or_default().push(index);
        self.normalized.push(normalize_name(&entry.name));
        self.entries.push(entry);
    }

    /// Load `mapping_file` plus every `*.json` in `mappings_dir` under `data_dir`
    ///
    /// Files are merged in name order; a missing table yields an empty mapping
    /// so every venue falls through to probing or the placeholder.
    pub fn load(data_dir: &Path, config: &ImageConfig) -> Result<Self> {
        let mut files = Vec::new();

        let main = data_dir.join(&config.mapping_file);
        if main.exists() {
            files.push(main);
        }

        let extra_dir = data_dir.join(&config.mappings_dir);
        if extra_dir.is_dir() {
            let mut extra: Vec<_> = std::fs::read_dir(&extra_dir)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().map(|x| x == "json").unwrap_or(false))
                .collect();
            extra.sort();
            files.extend(extra);
        }

        if files.is_empty() {
            warn!(dir = %data_dir.display(), "No image mapping tables found");
        }

        let mut mapping = ImageMapping::default();
        for path in files {
            let content = std::fs::read_to_string(&path).map_err(|e| Error::dataset(&path, e))?;
            let entries: Vec<MappingEntry> =
                serde_json::from_str(&content).map_err(|e| Error::dataset(&path, e))?;
            info!(path = %path.display(), entries = entries.len(), "Loaded image mapping table");
            for entry in entries {
                mapping.push(entry);
            }
        }

        Ok(mapping)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> &MappingEntry {
        &self.entries[index]
    }

    pub(crate) fn normalized_name(&self, index: usize) -> &str {
        &self.normalized[index]
    }

    pub fn find_by_place_id(&self, place_id: &str) -> Option<usize> {
        self.by_place_id.get(place_id.trim()).copied()
    }

    /// Entries whose name equals `name` ignoring case and surrounding space
    pub fn find_by_name(&self, name: &str) -> &[usize] {
        self.by_name.get(&fold(name)).map(Vec::as_slice).unwrap_or(&[])
    }
}
