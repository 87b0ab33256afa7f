//! Recommendation endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use pkv_common::recommend::RecommendContext;
use pkv_common::{Category, Venue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, AppState};

/// Query parameters for recommendations
#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    /// Preferred city
    pub city: Option<String>,
    /// Anchor category; other categories are favoured
    pub category: Option<String>,
    /// Venue to leave out, as `category/id`
    pub exclude: Option<String>,
    pub count: Option<usize>,
    /// Seed for the jitter term, for repeatable results
    pub seed: Option<u64>,
}

/// Recommended venue with its cover image
#[derive(Debug, Serialize)]
pub struct RecommendedVenue {
    #[serde(flatten)]
    pub venue: Venue,
    pub score: f64,
    pub path: String,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendedVenue>,
}

/// Parse an `exclude` value of the form `category/id`
fn parse_exclude(raw: &str) -> ApiResult<(Category, String)> {
    let (category, id) = raw
        .trim()
        .split_once('/')
        .filter(|(_, id)| !id.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("exclude must look like category/id, got '{}'", raw))
        })?;
    Ok((category.parse()?, id.to_string()))
}

impl RecommendParams {
    fn context(&self) -> ApiResult<RecommendContext> {
        let category = match self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(raw) => Some(raw.parse::<Category>()?),
            None => None,
        };
        let exclude = match self.exclude.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(raw) => Some(parse_exclude(raw)?),
            None => None,
        };
        Ok(RecommendContext {
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            category,
            exclude,
        })
    }
}

/// Pick recommendations and resolve their cover images
pub(crate) async fn recommendation_cards(
    state: &AppState,
    context: &RecommendContext,
    count: usize,
    rng: &mut (impl Rng + Send),
) -> Vec<RecommendedVenue> {
    let picks = state.recommender.recommend(&state.catalog, context, count, rng);

    let mut cards = Vec::with_capacity(picks.len());
    for pick in picks {
        let image = state.images.resolve(pick.venue).await;
        cards.push(RecommendedVenue {
            venue: pick.venue.clone(),
            score: pick.score,
            path: pick.venue.path(),
            image: image.url,
        });
    }
    cards
}

/// GET /api/recommendations
///
/// Without a `seed` the jitter term is drawn from entropy, so repeated calls
/// shuffle near-equal venues.
pub async fn get_recommendations(
    State(state): State<AppState>,
    params: Result<Query<RecommendParams>, QueryRejection>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let Query(params) = params?;
    let context = params.context()?;
    let count = state.recommender.clamp_count(params.count);

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let recommendations = recommendation_cards(&state, &context, count, &mut rng).await;
    Ok(Json(RecommendationsResponse { recommendations }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exclude() {
        let (category, id) = parse_exclude("restaurants/monal-islamabad").unwrap();
        assert_eq!(category, Category::Restaurants);
        assert_eq!(id, "monal-islamabad");

        assert!(parse_exclude("restaurants").is_err());
        assert!(parse_exclude("restaurants/").is_err());
        assert!(parse_exclude("bakeries/x").is_err());
    }

    #[test]
    fn test_context_ignores_blank_values() {
        let params = RecommendParams {
            city: Some(" ".to_string()),
            category: Some("".to_string()),
            ..Default::default()
        };
        let context = params.context().unwrap();
        assert!(context.city.is_none());
        assert!(context.category.is_none());
        assert!(context.exclude.is_none());
    }
}
