//! Search, filter, sort and pagination over the catalog
//!
//! Every listing view and the global search page go through [`VenueQuery::run`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::catalog::Catalog;
use crate::model::{Category, PriceLevel, Venue};
use crate::pagination::{Page, DEFAULT_PAGE_SIZE};
use crate::text::fold;
use crate::{Error, Result};

/// Sort order for listing results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Text relevance; rating order when there is no text
    #[default]
    Relevance,
    Rating,
    Reviews,
    Name,
    NameDesc,
    Price,
    PriceDesc,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match fold(s).replace('-', "_").as_str() {
            "" | "relevance" => Ok(SortKey::Relevance),
            "rating" => Ok(SortKey::Rating),
            "reviews" | "popular" => Ok(SortKey::Reviews),
            "name" | "name_asc" => Ok(SortKey::Name),
            "name_desc" => Ok(SortKey::NameDesc),
            "price" | "price_asc" => Ok(SortKey::Price),
            "price_desc" => Ok(SortKey::PriceDesc),
            other => Err(Error::InvalidInput(format!("Unknown sort key: {}", other))),
        }
    }
}

/// Listing query: free text, filters, sort and page
#[derive(Debug, Clone, PartialEq)]
pub struct VenueQuery {
    pub text: Option<String>,
    pub category: Option<Category>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub subcategory: Option<String>,
    pub min_rating: Option<f32>,
    /// Accepted price levels; empty accepts all
    pub price_levels: Vec<PriceLevel>,
    /// Required tags (all must match)
    pub tags: Vec<String>,
    pub sort: SortKey,
    pub page: usize,
    pub page_size: usize,
}

impl Default for VenueQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            city: None,
            area: None,
            subcategory: None,
            min_rating: None,
            price_levels: Vec::new(),
            tags: Vec::new(),
            sort: SortKey::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A venue in a result list with its relevance score
#[derive(Debug, Clone, Serialize)]
pub struct ScoredVenue<'a> {
    pub venue: &'a Venue,
    pub score: u32,
}

/// Result counts used to render filter options
#[derive(Debug, Clone, Default, Serialize)]
pub struct Facets {
    pub categories: BTreeMap<Category, usize>,
    pub cities: BTreeMap<String, usize>,
    pub price_levels: BTreeMap<PriceLevel, usize>,
}

/// Query result: the requested page and facets over all matches
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<'a> {
    #[serde(flatten)]
    pub page: Page<ScoredVenue<'a>>,
    pub facets: Facets,
}

fn contains_folded(field: Option<&str>, needle: &str) -> bool {
    field.map(|f| fold(f).contains(needle)).unwrap_or(false)
}

/// Relevance of one already-folded token against a venue, 0 when absent
fn token_score(venue: &Venue, token: &str) -> u32 {
    let name = fold(&venue.name);
    let mut score = if name == token {
        100
    } else if name.starts_with(token) {
        60
    } else if name.contains(token) {
        40
    } else {
        0
    };

    if contains_folded(venue.subcategory.as_deref(), token)
        || venue.tags.iter().any(|t| fold(t).contains(token))
    {
        score += 20;
    }
    if contains_folded(venue.area.as_deref(), token)
        || contains_folded(Some(venue.city.as_str()), token)
        || contains_folded(venue.address.as_deref(), token)
    {
        score += 10;
    }
    if contains_folded(venue.description.as_deref(), token) {
        score += 5;
    }

    score
}

/// Score a venue against the text query; `None` when some token is unmatched
///
/// The whole query is also tried as one token so "monal" beats "monal
/// restaurant" when the user types the exact name.
fn text_score(venue: &Venue, text: &str) -> Option<u32> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut total = 0;
    for token in &tokens {
        let s = token_score(venue, token);
        if s == 0 {
            return None;
        }
        total += s;
    }
    if tokens.len() > 1 && fold(&venue.name) == text {
        total += 100;
    }
    Some(total)
}

fn cmp_option_desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_option_asc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn tie_break(a: &Venue, b: &Venue) -> Ordering {
    fold(&a.name)
        .cmp(&fold(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

impl VenueQuery {
    /// Folded, trimmed text query; `None` when blank
    fn normalized_text(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(fold)
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
    }

    /// Whether a venue passes every filter except the text query
    pub fn matches_filters(&self, venue: &Venue) -> bool {
        if let Some(category) = self.category {
            if venue.category != category {
                return false;
            }
        }
        if let Some(city) = self.city.as_deref().filter(|c| !c.trim().is_empty()) {
            if !venue.in_city(city) {
                return false;
            }
        }
        if let Some(area) = self.area.as_deref().filter(|a| !a.trim().is_empty()) {
            if !contains_folded(venue.area.as_deref(), &fold(area)) {
                return false;
            }
        }
        if let Some(sub) = self.subcategory.as_deref().filter(|s| !s.trim().is_empty()) {
            if !contains_folded(venue.subcategory.as_deref(), &fold(sub)) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if venue.rating.map(|r| r < min).unwrap_or(true) {
                return false;
            }
        }
        if !self.price_levels.is_empty() {
            match venue.price_level {
                Some(level) if self.price_levels.contains(&level) => {}
                _ => return false,
            }
        }
        self.tags.iter().all(|wanted| {
            let wanted = fold(wanted);
            venue.tags.iter().any(|t| fold(t) == wanted)
        })
    }

    fn compare(&self, a: &ScoredVenue<'_>, b: &ScoredVenue<'_>, has_text: bool) -> Ordering {
        let (va, vb) = (a.venue, b.venue);
        let primary = match self.sort {
            SortKey::Relevance if has_text => b
                .score
                .cmp(&a.score)
                .then_with(|| cmp_option_desc(va.rating, vb.rating)),
            SortKey::Relevance | SortKey::Rating => cmp_option_desc(va.rating, vb.rating)
                .then_with(|| vb.review_count.cmp(&va.review_count)),
            SortKey::Reviews => vb.review_count.cmp(&va.review_count),
            SortKey::Name => Ordering::Equal,
            SortKey::NameDesc => fold(&vb.name).cmp(&fold(&va.name)),
            SortKey::Price => cmp_option_asc(va.price_level, vb.price_level),
            SortKey::PriceDesc => cmp_option_desc(va.price_level, vb.price_level),
        };
        primary.then_with(|| tie_break(va, vb))
    }

    /// Run the query against the catalog
    pub fn run<'a>(&self, catalog: &'a Catalog) -> QueryResult<'a> {
        let text = self.normalized_text();

        let mut matches: Vec<ScoredVenue<'a>> = catalog
            .iter()
            .filter(|v| self.matches_filters(v))
            .filter_map(|venue| {
                let score = match &text {
                    Some(t) => text_score(venue, t)?,
                    None => 0,
                };
                Some(ScoredVenue { venue, score })
            })
            .collect();

        // Cities group case-insensitively under the first spelling seen
        let mut spellings: HashMap<String, String> = HashMap::new();
        let mut facets = Facets::default();
        for m in &matches {
            *facets.categories.entry(m.venue.category).or_default() += 1;
            let city = spellings
                .entry(fold(&m.venue.city))
                .or_insert_with(|| m.venue.city.clone());
            *facets.cities.entry(city.clone()).or_default() += 1;
            if let Some(level) = m.venue.price_level {
                *facets.price_levels.entry(level).or_default() += 1;
            }
        }

        let has_text = text.is_some();
        matches.sort_by(|a, b| self.compare(a, b, has_text));

        tracing::debug!(
            text = ?text,
            category = ?self.category,
            city = ?self.city,
            total = matches.len(),
            "Venue query"
        );

        QueryResult {
            page: Page::from_vec(matches, self.page, self.page_size),
            facets,
        }
    }
}
