//! Venue listing and detail endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use pkv_common::config::ListingConfig;
use pkv_common::images::ResolvedImage;
use pkv_common::pagination::Page;
use pkv_common::query::{Facets, ScoredVenue, SortKey, VenueQuery};
use pkv_common::recommend::RecommendContext;
use pkv_common::seo::SeoMeta;
use pkv_common::{Category, PriceLevel, Venue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::recommend::{recommendation_cards, RecommendedVenue};
use crate::{ApiError, ApiResult, AppState};

/// Query parameters shared by listing and search
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    /// Free-text query
    pub q: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub subcategory: Option<String>,
    pub min_rating: Option<f32>,
    /// Comma-separated price levels (`1,2`, `$$`, `moderate`)
    pub price: Option<String>,
    /// Comma-separated tags; all must be present
    pub tags: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

fn comma_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ListingParams {
    /// Convert to a catalog query; `fixed` overrides the `category` parameter
    pub fn into_query(self, listing: &ListingConfig, fixed: Option<Category>) -> ApiResult<VenueQuery> {
        let category = match (fixed, non_blank(self.category)) {
            (Some(category), _) => Some(category),
            (None, Some(raw)) => Some(raw.parse::<Category>()?),
            (None, None) => None,
        };

        let price_levels = comma_list(self.price.as_deref())
            .map(str::parse::<PriceLevel>)
            .collect::<pkv_common::Result<Vec<_>>>()?;

        let tags = comma_list(self.tags.as_deref()).map(str::to_string).collect();

        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortKey>()?,
            None => SortKey::default(),
        };

        if let Some(min) = self.min_rating {
            if !(0.0..=5.0).contains(&min) {
                return Err(ApiError::BadRequest(format!(
                    "min_rating must be between 0 and 5, got {}",
                    min
                )));
            }
        }

        Ok(VenueQuery {
            text: non_blank(self.q),
            category,
            city: non_blank(self.city),
            area: non_blank(self.area),
            subcategory: non_blank(self.subcategory),
            min_rating: self.min_rating,
            price_levels,
            tags,
            sort,
            page: self.page.unwrap_or(1),
            page_size: listing.clamp_page_size(self.page_size),
        })
    }
}

/// Venue as shown on a listing card
#[derive(Debug, Serialize)]
pub struct VenueCard {
    #[serde(flatten)]
    pub venue: Venue,
    /// Relevance score (0 without a text query)
    pub score: u32,
    /// Detail page path
    pub path: String,
    /// Resolved cover image URL
    pub image: String,
}

/// Listing or search response
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub page: Page<VenueCard>,
    pub facets: Facets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMeta>,
}

/// Resolve cover images for a page of results
pub(crate) async fn venue_cards(state: &AppState, page: Page<ScoredVenue<'_>>) -> Page<VenueCard> {
    let mut images = Vec::with_capacity(page.items.len());
    for item in &page.items {
        images.push(state.images.resolve(item.venue).await.url);
    }

    let mut images = images.into_iter();
    page.map(|item| VenueCard {
        venue: item.venue.clone(),
        score: item.score,
        path: item.venue.path(),
        image: images.next().unwrap_or_default(),
    })
}

/// Run a query and build the listing response
pub(crate) async fn run_listing(
    state: &AppState,
    query: &VenueQuery,
    seo: Option<SeoMeta>,
) -> ListingResponse {
    let result = query.run(&state.catalog);
    let facets = result.facets;
    let page = venue_cards(state, result.page).await;
    ListingResponse { page, facets, seo }
}

/// GET /api/venues
///
/// Query across all categories. Accepts every [`ListingParams`] field.
pub async fn list_venues(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Json<ListingResponse>> {
    let Query(params) = params?;
    let query = params.into_query(&state.listing, None)?;
    Ok(Json(run_listing(&state, &query, None).await))
}

/// GET /api/venues/:category
///
/// Same as `/api/venues` restricted to one category. Unknown categories are
/// rejected with 400.
pub async fn list_category_venues(
    State(state): State<AppState>,
    Path(category): Path<String>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Json<ListingResponse>> {
    let category: Category = category.parse()?;
    let Query(params) = params?;
    let query = params.into_query(&state.listing, Some(category))?;
    let seo = state.seo.listing(category, query.city.as_deref());
    Ok(Json(run_listing(&state, &query, Some(seo)).await))
}

/// Look up a venue by category slug and id, mapping every miss to 404
pub(crate) fn find_venue<'a>(state: &'a AppState, category: &str, id: &str) -> ApiResult<&'a Venue> {
    let category: Category = category.parse().map_err(|_| ApiError::venue_not_found())?;
    state
        .catalog
        .get(category, id)
        .ok_or_else(ApiError::venue_not_found)
}

/// Venue detail response
#[derive(Debug, Serialize)]
pub struct VenueDetailResponse {
    pub venue: Venue,
    pub path: String,
    pub image: ResolvedImage,
    pub recommendations: Vec<RecommendedVenue>,
    pub seo: SeoMeta,
}

/// Everything a detail view renders, shared by the JSON and HTML routes
pub(crate) async fn venue_detail(state: &AppState, venue: &Venue) -> VenueDetailResponse {
    let image = state.images.resolve(venue).await;

    let count = state.recommender.clamp_count(None);
    let mut rng = StdRng::from_entropy();
    let recommendations =
        recommendation_cards(state, &RecommendContext::for_venue(venue), count, &mut rng).await;

    let seo = state.seo.venue(venue, &image.url);

    VenueDetailResponse {
        venue: venue.clone(),
        path: venue.path(),
        image,
        recommendations,
        seo,
    }
}

/// GET /api/venues/:category/:id
pub async fn get_venue(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> ApiResult<Json<VenueDetailResponse>> {
    let venue = find_venue(&state, &category, &id)?;
    Ok(Json(venue_detail(&state, venue).await))
}
