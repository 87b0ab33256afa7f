//! Venue model and category definitions
//!
//! Dataset files contain [`VenueRecord`]s. The catalog normalises each record
//! into a [`Venue`] bound to the category of the file it came from.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::text::{fold, slugify};
use crate::{Error, Result};

/// Venue category
///
/// Each category owns one dataset file (`<slug>.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Restaurants,
    Cafes,
    Shopping,
    Entertainment,
    ArtsCulture,
    SportsFitness,
    HealthWellness,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 7] = [
        Category::Restaurants,
        Category::Cafes,
        Category::Shopping,
        Category::Entertainment,
        Category::ArtsCulture,
        Category::SportsFitness,
        Category::HealthWellness,
    ];

    /// URL slug, also the dataset file stem and image folder prefix
    pub fn slug(self) -> &'static str {
        match self {
            Category::Restaurants => "restaurants",
            Category::Cafes => "cafes",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::ArtsCulture => "arts-culture",
            Category::SportsFitness => "sports-fitness",
            Category::HealthWellness => "health-wellness",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Restaurants => "Restaurants",
            Category::Cafes => "Cafes",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::ArtsCulture => "Arts & Culture",
            Category::SportsFitness => "Sports & Fitness",
            Category::HealthWellness => "Health & Wellness",
        }
    }

    /// Dataset file name inside the data directory
    pub fn dataset_file(self) -> String {
        format!("{}.json", self.slug())
    }

    /// schema.org type used for structured data
    pub fn schema_type(self) -> &'static str {
        match self {
            Category::Restaurants => "Restaurant",
            Category::Cafes => "CafeOrCoffeeShop",
            Category::Shopping => "Store",
            Category::Entertainment => "EntertainmentBusiness",
            Category::ArtsCulture => "Museum",
            Category::SportsFitness => "SportsActivityLocation",
            Category::HealthWellness => "HealthAndBeautyBusiness",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts the slug, the display name or snake_case, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let wanted = slugify(&s.replace('_', "-").replace('&', " "));
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted || slugify(c.display_name()) == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown category: {}", s)))
    }
}

/// Price band of a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceLevel {
    Budget,
    Moderate,
    Expensive,
    Luxury,
}

impl PriceLevel {
    pub const ALL: [PriceLevel; 4] = [
        PriceLevel::Budget,
        PriceLevel::Moderate,
        PriceLevel::Expensive,
        PriceLevel::Luxury,
    ];

    /// Dollar-sign rendering ("$" .. "$$$$")
    pub fn symbol(self) -> &'static str {
        match self {
            PriceLevel::Budget => "$",
            PriceLevel::Moderate => "$$",
            PriceLevel::Expensive => "$$$",
            PriceLevel::Luxury => "$$$$",
        }
    }

    fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            1 => Some(PriceLevel::Budget),
            2 => Some(PriceLevel::Moderate),
            3 => Some(PriceLevel::Expensive),
            4 => Some(PriceLevel::Luxury),
            _ => None,
        }
    }
}

impl FromStr for PriceLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c == '$') {
            return PriceLevel::from_rank(s.len() as i64)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown price level: {}", s)));
        }
        if let Ok(rank) = s.parse::<i64>() {
            return PriceLevel::from_rank(rank)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown price level: {}", s)));
        }
        match fold(s).as_str() {
            "budget" | "cheap" | "inexpensive" => Ok(PriceLevel::Budget),
            "moderate" | "mid" | "mid-range" => Ok(PriceLevel::Moderate),
            "expensive" | "high" => Ok(PriceLevel::Expensive),
            "luxury" | "premium" => Ok(PriceLevel::Luxury),
            _ => Err(Error::InvalidInput(format!("Unknown price level: {}", s))),
        }
    }
}

impl<'de> Deserialize<'de> for PriceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Rank(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Rank(rank) => PriceLevel::from_rank(rank)
                .ok_or_else(|| serde::de::Error::custom(format!("price rank out of range: {}", rank))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Venue record as it appears in a dataset file
///
/// Field aliases cover the naming differences between the category datasets
/// (`cuisine` for restaurants, `type` for shops, `placeId` from exports).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default, alias = "reviews", alias = "user_ratings_total")]
    pub review_count: Option<u32>,
    #[serde(default, alias = "price", alias = "priceRange")]
    pub price_level: Option<PriceLevel>,
    #[serde(default, alias = "cuisine", alias = "type")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, alias = "hours", alias = "openingHours")]
    pub opening_hours: Option<String>,
    #[serde(default, alias = "placeId")]
    pub place_id: Option<String>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "image", alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, alias = "s3Folder")]
    pub s3_folder: Option<String>,
}

/// Accept ids exported as JSON numbers as well as strings
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// A normalised venue bound to its category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub category: Category,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    pub review_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_folder: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Venue {
    /// Normalise a dataset record into a venue of `category`
    ///
    /// Rejects records without a name or city. A missing id is derived from
    /// the name and city; an out-of-range rating is dropped.
    pub fn from_record(record: VenueRecord, category: Category) -> Result<Self> {
        let name = record.name.trim().to_string();
        let city = record.city.trim().to_string();

        if name.is_empty() {
            return Err(Error::InvalidInput("venue record has no name".to_string()));
        }
        if city.is_empty() {
            return Err(Error::InvalidInput(format!("venue '{}' has no city", name)));
        }

        let slug = slugify(&format!("{} {}", name, city));
        let id = clean(record.id).unwrap_or_else(|| slug.clone());

        let rating = match record.rating {
            Some(r) if (0.0..=5.0).contains(&r) => Some(r),
            Some(r) => {
                tracing::warn!(venue = %id, rating = r, "Dropping out-of-range rating");
                None
            }
            None => None,
        };

        let mut seen = HashSet::new();
        let tags: Vec<String> = record
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(fold(t)))
            .collect();

        Ok(Venue {
            id,
            slug,
            name,
            category,
            city,
            area: clean(record.area),
            address: clean(record.address),
            rating,
            review_count: record.review_count.unwrap_or(0),
            price_level: record.price_level,
            subcategory: clean(record.subcategory),
            tags,
            description: clean(record.description),
            phone: clean(record.phone),
            website: clean(record.website),
            opening_hours: clean(record.opening_hours),
            place_id: clean(record.place_id),
            latitude: record.latitude,
            longitude: record.longitude,
            image_url: clean(record.image_url),
            s3_folder: clean(record.s3_folder),
        })
    }

    /// Case-insensitive city comparison
    pub fn in_city(&self, city: &str) -> bool {
        fold(&self.city) == fold(city)
    }

    /// Path of the venue's detail page
    pub fn path(&self) -> String {
        format!("/venues/{}/{}", self.category.slug(), self.id)
    }
}
