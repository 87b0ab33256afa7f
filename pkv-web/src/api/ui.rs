//! UI serving routes
//!
//! The index page is a static shell driven by `app.js`. Venue detail pages
//! are rendered on the server so crawlers see the SEO head and content
//! without running scripts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use pkv_common::seo::{escape_html, render_head, SeoMeta};
use pkv_common::Category;
use serde::Deserialize;

use super::venues::{find_venue, venue_detail, VenueDetailResponse};
use crate::AppState;

const INDEX_HTML: &str = include_str!("../../ui/index.html");
const VENUE_HTML: &str = include_str!("../../ui/venue.html");
const APP_JS: &str = include_str!("../../ui/app.js");
const PLACEHOLDER_SVG: &str = include_str!("../../ui/placeholder.svg");

/// Marker in the HTML templates replaced by rendered head tags
const HEAD_MARKER: &str = "<!-- pkv:head -->";
/// Marker in the venue template replaced by the page body
const BODY_MARKER: &str = "<!-- pkv:body -->";

/// GET /
///
/// Serves the main UI page with the home page head tags
pub async fn serve_index(State(state): State<AppState>) -> Html<String> {
    index_with_head(&state.seo.home())
}

fn index_with_head(meta: &SeoMeta) -> Html<String> {
    Html(INDEX_HTML.replace(HEAD_MARKER, &render_head(meta)))
}

/// City filter carried by listing page URLs
#[derive(Debug, Deserialize)]
pub struct ListingPageParams {
    pub city: Option<String>,
}

/// GET /venues/:category
///
/// Index shell with the category listing head; `app.js` preselects the
/// category from the path.
pub async fn listing_page(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<ListingPageParams>,
) -> Response {
    let Ok(category) = category.parse::<Category>() else {
        return not_found_page(&state, "Category not found");
    };
    let city = params.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    index_with_head(&state.seo.listing(category, city)).into_response()
}

/// Search text carried by search page URLs
#[derive(Debug, Deserialize)]
pub struct SearchPageParams {
    pub q: Option<String>,
}

/// GET /search?q=...
pub async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchPageParams>,
) -> Html<String> {
    match params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => index_with_head(&state.seo.search(q)),
        None => index_with_head(&state.seo.home()),
    }
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// GET /static/placeholder.svg
pub async fn serve_placeholder() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "image/svg+xml"),
            ("cache-control", "public, max-age=86400"),
        ],
        PLACEHOLDER_SVG,
    )
        .into_response()
}

fn stars(rating: f32) -> String {
    format!("{:.1} ★", rating)
}

fn render_venue_body(detail: &VenueDetailResponse) -> String {
    let venue = &detail.venue;
    let mut out = String::new();

    out.push_str("<article class=\"venue\">\n");
    out.push_str(&format!(
        "<img class=\"cover\" src=\"{}\" alt=\"{}\">\n",
        escape_html(&detail.image.url),
        escape_html(&venue.name)
    ));
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&venue.name)));

    let mut facts = vec![venue.category.display_name().to_string()];
    if let Some(sub) = &venue.subcategory {
        facts.push(sub.clone());
    }
    match &venue.area {
        Some(area) => facts.push(format!("{}, {}", area, venue.city)),
        None => facts.push(venue.city.clone()),
    }
    if let Some(level) = venue.price_level {
        facts.push(level.symbol().to_string());
    }
    if let Some(rating) = venue.rating {
        facts.push(format!("{} ({} reviews)", stars(rating), venue.review_count));
    }
    out.push_str(&format!(
        "<p class=\"facts\">{}</p>\n",
        escape_html(&facts.join(" · "))
    ));

    if let Some(description) = &venue.description {
        out.push_str(&format!("<p class=\"description\">{}</p>\n", escape_html(description)));
    }

    out.push_str("<dl class=\"details\">\n");
    let rows = [
        ("Address", venue.address.as_deref()),
        ("Hours", venue.opening_hours.as_deref()),
        ("Phone", venue.phone.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            out.push_str(&format!("<dt>{}</dt><dd>{}</dd>\n", label, escape_html(value)));
        }
    }
    if let Some(website) = &venue.website {
        let website = escape_html(website);
        out.push_str(&format!(
            "<dt>Website</dt><dd><a href=\"{}\" rel=\"nofollow noopener\">{}</a></dd>\n",
            website, website
        ));
    }
    out.push_str("</dl>\n");

    if !venue.tags.is_empty() {
        out.push_str("<ul class=\"tags\">");
        for tag in &venue.tags {
            out.push_str(&format!("<li>{}</li>", escape_html(tag)));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</article>\n");

    if !detail.recommendations.is_empty() {
        out.push_str("<section class=\"recommendations\">\n<h2>You might also like</h2>\n<ul>\n");
        for rec in &detail.recommendations {
            out.push_str(&format!(
                "<li><a href=\"{}\"><img src=\"{}\" alt=\"\" loading=\"lazy\"><span>{}</span><small>{} · {}</small></a></li>\n",
                escape_html(&rec.path),
                escape_html(&rec.image),
                escape_html(&rec.venue.name),
                escape_html(rec.venue.category.display_name()),
                escape_html(&rec.venue.city)
            ));
        }
        out.push_str("</ul>\n</section>\n");
    }

    out
}

fn not_found_page(state: &AppState, heading: &str) -> Response {
    let mut meta = state.seo.home();
    meta.title = format!("{} | {}", heading, state.seo.site().name);
    meta.json_ld = None;
    let body = format!(
        "<article class=\"venue\"><h1>{}</h1><p><a href=\"/\">Back to all venues</a></p></article>",
        escape_html(heading)
    );
    let html = VENUE_HTML
        .replace(HEAD_MARKER, &format!("{}<meta name=\"robots\" content=\"noindex\">\n", render_head(&meta)))
        .replace(BODY_MARKER, &body);
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

/// GET /venues/:category/:id
///
/// Server-rendered venue page with SEO head tags and JSON-LD
pub async fn venue_page(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> Response {
    let Ok(venue) = find_venue(&state, &category, &id) else {
        return not_found_page(&state, "Venue not found");
    };

    let detail = venue_detail(&state, venue).await;
    let html = VENUE_HTML
        .replace(HEAD_MARKER, &render_head(&detail.seo))
        .replace(BODY_MARKER, &render_venue_body(&detail));
    Html(html).into_response()
}
