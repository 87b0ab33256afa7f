//! # PKV Common Library
//!
//! Shared code for the Pakistan venue discovery service:
//! - Venue model and category definitions
//! - Static JSON dataset loading
//! - Search, filter, sort and pagination over the catalog
//! - Venue image resolution (mapping table, fuzzy matching, path probing, cache)
//! - Recommendations
//! - SEO head-tag generation
//! - Contact form validation and storage
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod contact;
pub mod error;
pub mod images;
pub mod model;
pub mod pagination;
pub mod query;
pub mod recommend;
pub mod seo;
pub mod text;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use model::{Category, PriceLevel, Venue};
