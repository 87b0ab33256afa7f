//! SEO head tags for server-rendered pages
//!
//! Builders produce a [`SeoMeta`] per page type; [`render_head`] turns it into
//! escaped `<head>` markup. The same struct is returned by the JSON API so a
//! client-side renderer can apply identical tags.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::SiteConfig;
use crate::model::{Category, Venue};
use crate::text::truncate_words;

/// Maximum meta description length recommended by search engines
pub const DESCRIPTION_MAX: usize = 160;

/// Head tags for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub keywords: Vec<String>,
    pub image: String,
    /// Open Graph type (`website`, `place`)
    pub og_type: String,
    pub site_name: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_ld: Option<Value>,
}

/// Builds [`SeoMeta`] values for the configured site
#[derive(Debug, Clone)]
pub struct SeoBuilder {
    site: SiteConfig,
}

fn absolute(base: &str, path_or_url: &str) -> String {
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        path_or_url.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path_or_url.trim_start_matches('/')
        )
    }
}

/// Append a form-encoded query pair to an absolute URL
fn with_query(url: &str, key: &str, value: &str) -> String {
    match reqwest::Url::parse_with_params(url, &[(key, value)]) {
        Ok(parsed) => parsed.to_string(),
        Err(e) => {
            tracing::warn!(url, error = %e, "Canonical URL is not absolute, query dropped");
            url.to_string()
        }
    }
}

impl SeoBuilder {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    fn meta(&self, title: &str, description: &str, path: &str, keywords: Vec<String>) -> SeoMeta {
        SeoMeta {
            title: format!("{} | {}", title, self.site.name),
            description: truncate_words(description, DESCRIPTION_MAX),
            canonical_url: absolute(&self.site.base_url, path),
            keywords,
            image: absolute(&self.site.base_url, &self.site.default_image),
            og_type: "website".to_string(),
            site_name: self.site.name.clone(),
            locale: self.site.locale.clone(),
            json_ld: None,
        }
    }

    pub fn home(&self) -> SeoMeta {
        let mut meta = self.meta("Discover venues across Pakistan", &self.site.description, "/", vec![
            "Pakistan".to_string(),
            "restaurants".to_string(),
            "cafes".to_string(),
            "things to do".to_string(),
        ]);
        meta.title = self.site.name.clone();
        meta.json_ld = Some(json!({
            "@context": "https://schema.org",
            "@type": "WebSite",
            "name": self.site.name,
            "url": self.site.base_url,
            "potentialAction": {
                "@type": "SearchAction",
                "target": format!("{}/search?q={{search_term_string}}", self.site.base_url.trim_end_matches('/')),
                "query-input": "required name=search_term_string",
            }
        }));
        meta
    }

    /// Category listing page, optionally narrowed to a city
    pub fn listing(&self, category: Category, city: Option<&str>) -> SeoMeta {
        let (title, description, path) = match city {
            Some(city) => (
                format!("Best {} in {}", category.display_name(), city),
                format!(
                    "Browse top-rated {} in {}, with ratings, prices, opening hours and photos.",
                    category.display_name().to_lowercase(),
                    city
                ),
                format!("/venues/{}", category.slug()),
            ),
            None => (
                format!("Best {} in Pakistan", category.display_name()),
                format!(
                    "Browse top-rated {} across Pakistan, with ratings, prices, opening hours and photos.",
                    category.display_name().to_lowercase()
                ),
                format!("/venues/{}", category.slug()),
            ),
        };

        let mut keywords = vec![category.display_name().to_string(), "Pakistan".to_string()];
        if let Some(city) = city {
            keywords.push(city.to_string());
        }
        let mut meta = self.meta(&title, &description, &path, keywords);
        if let Some(city) = city {
            meta.canonical_url = with_query(&meta.canonical_url, "city", city.trim());
        }
        meta
    }

    pub fn search(&self, query: &str) -> SeoMeta {
        let query = query.trim();
        self.meta(
            &format!("Search results for \"{}\"", query),
            &format!("Venues in Pakistan matching \"{}\".", query),
            "/search",
            vec![query.to_string()],
        )
    }

    /// Venue detail page; `image_url` is the resolved cover image
    pub fn venue(&self, venue: &Venue, image_url: &str) -> SeoMeta {
        let place = match venue.area.as_deref() {
            Some(area) => format!("{}, {}", area, venue.city),
            None => venue.city.clone(),
        };
        let description = venue.description.clone().unwrap_or_else(|| {
            let kind = venue
                .subcategory
                .clone()
                .unwrap_or_else(|| venue.category.display_name().to_string());
            match venue.rating {
                Some(rating) => format!(
                    "{} in {}. {} rated {:.1}/5 from {} reviews.",
                    venue.name, place, kind, rating, venue.review_count
                ),
                None => format!("{} in {}. {}.", venue.name, place, kind),
            }
        });

        let mut keywords = vec![
            venue.name.clone(),
            venue.city.clone(),
            venue.category.display_name().to_string(),
        ];
        keywords.extend(venue.subcategory.iter().cloned());
        keywords.extend(venue.tags.iter().cloned());

        let mut meta = self.meta(&format!("{}, {}", venue.name, place), &description, &venue.path(), keywords);
        meta.image = absolute(&self.site.base_url, image_url);
        meta.og_type = "place".to_string();
        meta.json_ld = Some(self.venue_json_ld(venue, &meta));
        meta
    }

    fn venue_json_ld(&self, venue: &Venue, meta: &SeoMeta) -> Value {
        let mut ld = Map::new();
        ld.insert("@context".into(), json!("https://schema.org"));
        ld.insert("@type".into(), json!(venue.category.schema_type()));
        ld.insert("name".into(), json!(venue.name));
        ld.insert("url".into(), json!(meta.canonical_url));
        ld.insert("image".into(), json!(meta.image));

        let mut address = Map::new();
        address.insert("@type".into(), json!("PostalAddress"));
        if let Some(street) = venue.address.as_deref().or(venue.area.as_deref()) {
            address.insert("streetAddress".into(), json!(street));
        }
        address.insert("addressLocality".into(), json!(venue.city));
        address.insert("addressCountry".into(), json!("PK"));
        ld.insert("address".into(), Value::Object(address));

        if let (Some(lat), Some(lng)) = (venue.latitude, venue.longitude) {
            ld.insert(
                "geo".into(),
                json!({"@type": "GeoCoordinates", "latitude": lat, "longitude": lng}),
            );
        }
        if let Some(rating) = venue.rating {
            if venue.review_count > 0 {
                ld.insert(
                    "aggregateRating".into(),
                    json!({
                        "@type": "AggregateRating",
                        "ratingValue": (f64::from(rating) * 10.0).round() / 10.0,
                        "reviewCount": venue.review_count,
                        "bestRating": 5,
                    }),
                );
            }
        }
        if let Some(phone) = &venue.phone {
            ld.insert("telephone".into(), json!(phone));
        }
        if let Some(level) = venue.price_level {
            ld.insert("priceRange".into(), json!(level.symbol()));
        }
        if venue.category == Category::Restaurants {
            if let Some(cuisine) = &venue.subcategory {
                ld.insert("servesCuisine".into(), json!(cuisine));
            }
        }
        if let Some(hours) = &venue.opening_hours {
            ld.insert("openingHours".into(), json!(hours));
        }

        Value::Object(ld)
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn meta_name(out: &mut String, name: &str, content: &str) {
    out.push_str(&format!(
        "<meta name=\"{}\" content=\"{}\">\n",
        name,
        escape_html(content)
    ));
}

fn meta_property(out: &mut String, property: &str, content: &str) {
    out.push_str(&format!(
        "<meta property=\"{}\" content=\"{}\">\n",
        property,
        escape_html(content)
    ));
}

/// Render head markup for `meta`
pub fn render_head(meta: &SeoMeta) -> String {
    let mut out = String::new();
    out.push_str(&format!("<title>{}</title>\n", escape_html(&meta.title)));
    meta_name(&mut out, "description", &meta.description);
    if !meta.keywords.is_empty() {
        meta_name(&mut out, "keywords", &meta.keywords.join(", "));
    }
    out.push_str(&format!(
        "<link rel=\"canonical\" href=\"{}\">\n",
        escape_html(&meta.canonical_url)
    ));

    meta_property(&mut out, "og:title", &meta.title);
    meta_property(&mut out, "og:description", &meta.description);
    meta_property(&mut out, "og:type", &meta.og_type);
    meta_property(&mut out, "og:url", &meta.canonical_url);
    meta_property(&mut out, "og:image", &meta.image);
    meta_property(&mut out, "og:site_name", &meta.site_name);
    meta_property(&mut out, "og:locale", &meta.locale);

    meta_name(&mut out, "twitter:card", "summary_large_image");
    meta_name(&mut out, "twitter:title", &meta.title);
    meta_name(&mut out, "twitter:description", &meta.description);
    meta_name(&mut out, "twitter:image", &meta.image);

    if let Some(ld) = &meta.json_ld {
        // `</` inside a script body would close the tag early
        let body = ld.to_string().replace("</", "<\\/");
        out.push_str(&format!(
            "<script type=\"application/ld+json\">{}</script>\n",
            body
        ));
    }

    out
}
