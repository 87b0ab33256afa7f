//! Catalog overview endpoints: categories, cities, tags

use axum::{extract::State, Json};
use pkv_common::catalog::{CategoryCount, CityCount, TagCount};

use crate::AppState;

/// GET /api/categories
///
/// All categories in display order with venue counts, empty ones included.
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryCount>> {
    Json(state.catalog.category_counts())
}

/// GET /api/cities
///
/// Cities with venue counts, most venues first.
pub async fn list_cities(State(state): State<AppState>) -> Json<Vec<CityCount>> {
    Json(state.catalog.city_counts())
}

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<TagCount>> {
    Json(state.catalog.tag_counts())
}
