//! Global text search

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use super::venues::{run_listing, ListingParams, ListingResponse};
use crate::{ApiError, ApiResult, AppState};

/// GET /api/search?q=...
///
/// Text search across every category. Accepts the listing filters too; an
/// empty or blank `q` is rejected with 400.
pub async fn search_venues(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Json<ListingResponse>> {
    let Query(params) = params?;
    let text = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("Search query must not be empty".to_string()))?;

    let query = params.into_query(&state.listing, None)?;
    let seo = state.seo.search(&text);

    tracing::debug!(q = %text, "Search");
    Ok(Json(run_listing(&state, &query, Some(seo)).await))
}
