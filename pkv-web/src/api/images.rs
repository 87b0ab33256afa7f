//! Venue image endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use pkv_common::images::{CacheStats, ResolvedImage};
use serde::Serialize;

use super::venues::find_venue;
use crate::{ApiResult, AppState};

/// GET /api/images/:category/:id
///
/// Resolved image for one venue, including which strategy produced it.
pub async fn get_venue_image(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> ApiResult<Json<ResolvedImage>> {
    let venue = find_venue(&state, &category, &id)?;
    Ok(Json(state.images.resolve(venue).await))
}

/// Image cache diagnostics
#[derive(Debug, Serialize)]
pub struct ImageCacheResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub probe: &'static str,
    pub mapping_entries: usize,
}

/// GET /api/images/cache
pub async fn image_cache_stats(State(state): State<AppState>) -> Json<ImageCacheResponse> {
    Json(ImageCacheResponse {
        stats: state.images.stats().await,
        probe: state.images.probe_name(),
        mapping_entries: state.images.mapping().len(),
    })
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}

/// DELETE /api/images/cache
///
/// Forget every cached resolution so updated mapping or bucket contents are
/// picked up on the next request.
pub async fn clear_image_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.images.clear().await;
    tracing::info!(cleared, "Image cache cleared");
    Json(ClearCacheResponse { cleared })
}
