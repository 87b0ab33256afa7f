//! Venue recommendations
//!
//! Candidates get a base score from city match, rating and a random jitter
//! term. Selection is greedy: each pick adds a diversity bonus that shrinks as
//! a category accumulates picks, so a page about a restaurant suggests a cafe
//! and a museum before a second restaurant.

use rand::Rng;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::RecommendConfig;
use crate::model::{Category, Venue};

/// What the recommendations are for
#[derive(Debug, Clone, Default)]
pub struct RecommendContext {
    /// Preferred city (usually the viewed venue's city)
    pub city: Option<String>,
    /// Category of the viewed venue; counts as one prior pick
    pub category: Option<Category>,
    /// Venue never to be recommended (the one being viewed)
    pub exclude: Option<(Category, String)>,
}

impl RecommendContext {
    /// Context for the detail page of `venue`
    pub fn for_venue(venue: &Venue) -> Self {
        Self {
            city: Some(venue.city.clone()),
            category: Some(venue.category),
            exclude: Some((venue.category, venue.id.clone())),
        }
    }
}

/// A recommended venue and the score it was picked with
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation<'a> {
    pub venue: &'a Venue,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct Recommender {
    config: RecommendConfig,
}

impl Recommender {
    pub fn new(config: RecommendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Requested count clamped to `[1, max_count]`
    pub fn clamp_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.count)
            .clamp(1, self.config.max_count.max(1))
    }

    fn base_score(&self, venue: &Venue, context: &RecommendContext, rng: &mut impl Rng) -> f64 {
        let mut score = 0.0;
        if let Some(city) = context.city.as_deref() {
            if venue.in_city(city) {
                score += self.config.city_weight;
            }
        }
        if let Some(rating) = venue.rating {
            score += self.config.rating_weight * f64::from(rating) / 5.0;
        }
        if self.config.jitter > 0.0 {
            score += self.config.jitter * rng.gen::<f64>();
        }
        score
    }

    /// Pick up to `count` venues for `context`
    pub fn recommend<'a>(
        &self,
        catalog: &'a Catalog,
        context: &RecommendContext,
        count: usize,
        rng: &mut impl Rng,
    ) -> Vec<Recommendation<'a>> {
        let mut candidates: Vec<(&'a Venue, f64)> = catalog
            .iter()
            .filter(|v| match &context.exclude {
                Some((category, id)) => !(v.category == *category && v.id == *id),
                None => true,
            })
            .filter(|v| {
                self.config.min_rating <= 0.0
                    || v.rating.map(|r| r >= self.config.min_rating).unwrap_or(false)
            })
            .map(|v| (v, self.base_score(v, context, rng)))
            .collect();

        let mut picks_per_category = [0usize; Category::ALL.len()];
        let slot = |c: Category| Category::ALL.iter().position(|x| *x == c).unwrap_or(0);
        if let Some(anchor) = context.category {
            picks_per_category[slot(anchor)] += 1;
        }

        let mut picked = Vec::with_capacity(count.min(candidates.len()));
        while picked.len() < count && !candidates.is_empty() {
            let mut best_index = 0;
            let mut best_score = f64::MIN;
            for (i, (venue, base)) in candidates.iter().enumerate() {
                let prior = picks_per_category[slot(venue.category)] as f64;
                let score = base + self.config.diversity_weight / (1.0 + prior);
                if score > best_score {
                    best_score = score;
                    best_index = i;
                }
            }

            let (venue, _) = candidates.swap_remove(best_index);
            picks_per_category[slot(venue.category)] += 1;
            picked.push(Recommendation {
                venue,
                score: best_score,
            });
        }

        tracing::debug!(
            city = ?context.city,
            category = ?context.category,
            requested = count,
            returned = picked.len(),
            "Recommendations selected"
        );

        picked
    }
}
