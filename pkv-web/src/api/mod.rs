//! HTTP API handlers for pkv-web

pub mod buildinfo;
pub mod contact;
pub mod health;
pub mod images;
pub mod meta;
pub mod recommend;
pub mod search;
pub mod ui;
pub mod venues;

pub use buildinfo::get_build_info;
pub use contact::submit_contact;
pub use health::health_routes;
pub use images::{clear_image_cache, get_venue_image, image_cache_stats};
pub use meta::{list_categories, list_cities, list_tags};
pub use recommend::get_recommendations;
pub use search::search_venues;
pub use ui::{listing_page, search_page, serve_app_js, serve_index, serve_placeholder, venue_page};
pub use venues::{get_venue, list_category_venues, list_venues};
