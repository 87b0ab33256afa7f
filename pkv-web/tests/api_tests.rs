//! Integration tests for pkv-web API endpoints
//!
//! Each test builds the router over a small dataset written to a temp
//! directory, so dataset loading, mapping tables and the manifest probe are
//! exercised the same way as at startup.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pkv_common::config::TomlConfig;
use pkv_common::contact::ContactInbox;
use pkv_common::images::{probe::probe_from_config, ImageMapping, ImageResolver};
use pkv_common::Catalog;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use pkv_web::{build_router, AppState};

/// Test helper: write fixture datasets, mapping table and manifest
fn write_fixtures(data_dir: &Path) {
    std::fs::create_dir_all(data_dir.join("image-mappings")).unwrap();

    let restaurants = json!([
        {
            "id": "monal",
            "name": "The Monal Restaurant",
            "city": "Islamabad",
            "area": "Pir Sohawa",
            "rating": 4.6,
            "reviews": 21000,
            "price": "$$$",
            "cuisine": "Pakistani",
            "tags": ["Rooftop", "Family"],
            "description": "Hilltop dining with views over Islamabad.",
            "lat": 33.7519,
            "lng": 73.0764
        },
        {
            "id": "butt-karahi",
            "name": "Butt Karahi Tikka",
            "city": "Lahore",
            "area": "Lakshmi Chowk",
            "rating": 4.3,
            "reviews": 8000,
            "price": 1,
            "cuisine": "Pakistani",
            "tags": ["Family"]
        },
        {
            "id": "kolachi",
            "name": "Kolachi",
            "city": "Karachi",
            "area": "Do Darya",
            "rating": 4.4,
            "reviews": 15000,
            "price": "$$$",
            "cuisine": "BBQ"
        },
        { "name": "", "city": "Lahore" },
        { "id": "monal", "name": "Duplicate Monal", "city": "Islamabad" }
    ]);
    let cafes = json!([
        {
            "id": "aylanto",
            "name": "Cafe Aylanto",
            "city": "Lahore",
            "area": "Gulberg",
            "rating": 4.5,
            "reviews": 3000,
            "price": "$$$",
            "placeId": "PID-AYLANTO"
        },
        {
            "id": "chaaye-khana",
            "name": "Chaaye Khana",
            "city": "Islamabad",
            "rating": 4.2,
            "reviews": 2500,
            "price": 2,
            "image": "https://photos.example/chaaye.jpg"
        }
    ]);
    let shopping = json!([
        { "id": "packages", "name": "Packages Mall", "city": "Lahore", "rating": 4.5, "reviews": 40000, "price": 2 }
    ]);
    let arts = json!([
        { "id": "lahore-museum", "name": "Lahore Museum", "city": "Lahore", "rating": 4.6, "reviews": 12000 }
    ]);

    for (file, value) in [
        ("restaurants.json", restaurants),
        ("cafes.json", cafes),
        ("shopping.json", shopping),
        ("arts-culture.json", arts),
    ] {
        std::fs::write(data_dir.join(file), value.to_string()).unwrap();
    }

    let mapping = json!([
        { "name": "Monal", "category": "restaurants", "city": "Islamabad", "s3_folder": "restaurants/monal", "images": ["1.jpg", "2.jpg"] },
        { "placeId": "PID-AYLANTO", "name": "Aylanto", "s3Folder": "cafes/aylanto", "images": ["cover.jpg"] }
    ]);
    std::fs::write(data_dir.join("image-mapping.json"), mapping.to_string()).unwrap();

    let extra = json!([
        { "name": "Packages Mall", "category": "shopping", "city": "Lahore", "folder": "shopping/packages-mall" }
    ]);
    std::fs::write(data_dir.join("image-mappings").join("shopping.json"), extra.to_string()).unwrap();

    let manifest = json!(["restaurants/kolachi-karachi/1.jpg"]);
    std::fs::write(data_dir.join("image-manifest.json"), manifest.to_string()).unwrap();
}

struct TestApp {
    app: Router,
    root: TempDir,
}

/// Test helper: build the app the way main does, over fixture data
fn setup_app_with(config: TomlConfig) -> TestApp {
    let root = TempDir::new().unwrap();
    let data_dir = config.data_dir(root.path());
    write_fixtures(&data_dir);

    let (catalog, _) = Catalog::load_dir(&data_dir).unwrap();
    let mapping = ImageMapping::load(&data_dir, &config.images).unwrap();
    let probe = probe_from_config(&config.images, &data_dir).unwrap();
    let images = ImageResolver::new(mapping, probe, config.images.clone());
    let contact = config
        .contact
        .enabled
        .then(|| ContactInbox::new(&config.contact_dir(root.path())));

    let state = AppState::new(catalog, images, &config, contact);
    TestApp {
        app: build_router(state),
        root,
    }
}

fn setup_app() -> TestApp {
    let mut config = TomlConfig::default();
    config.images.base_url = "https://img.example".to_string();
    config.recommend.jitter = 0.0;
    setup_app_with(config)
}

/// Test helper: Create request
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app.clone().oneshot(test_request("GET", uri)).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

fn ids(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Health and metadata
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "pkv-web");
    assert!(body["version"].is_string());
    assert_eq!(body["venues"], 7);
}

#[tokio::test]
async fn test_buildinfo() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/buildinfo").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_categories_include_empty() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/categories").await;

    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().unwrap();
    assert_eq!(categories.len(), 7);
    assert_eq!(categories[0]["category"], "restaurants");
    assert_eq!(categories[0]["count"], 3);
    assert_eq!(categories[4]["category"], "arts-culture");
    assert_eq!(categories[4]["name"], "Arts & Culture");
    assert_eq!(categories[6]["count"], 0);
}

#[tokio::test]
async fn test_cities_sorted_by_count() {
    let t = setup_app();
    let (_, body) = get_json(&t.app, "/api/cities").await;

    assert_eq!(
        body,
        json!([
            {"city": "Lahore", "count": 4},
            {"city": "Islamabad", "count": 2},
            {"city": "Karachi", "count": 1}
        ])
    );
}

#[tokio::test]
async fn test_tags_with_counts() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/tags").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"tag": "Family", "count": 2},
            {"tag": "Rooftop", "count": 1}
        ])
    );
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_all_venues() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/venues").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 7);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 12);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["facets"]["categories"]["restaurants"], 3);
    assert_eq!(body["facets"]["cities"]["Lahore"], 4);
    assert!(body.get("seo").is_none());

    let first = &body["items"][0];
    assert!(first["path"].as_str().unwrap().starts_with("/venues/"));
    assert!(first["image"].is_string());
}

#[tokio::test]
async fn test_category_listing_sorted_by_rating() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/venues/restaurants?sort=rating").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["items"]), vec!["monal", "kolachi", "butt-karahi"]);
    assert_eq!(body["seo"]["title"], "Best Restaurants in Pakistan | Discover Pakistan");
}

#[tokio::test]
async fn test_category_listing_filters() {
    let t = setup_app();
    let (_, body) = get_json(&t.app, "/api/venues/restaurants?price=$$$&city=karachi").await;
    assert_eq!(ids(&body["items"]), vec!["kolachi"]);

    let (_, body) = get_json(&t.app, "/api/venues?tags=family&min_rating=4.5").await;
    assert_eq!(ids(&body["items"]), vec!["monal"]);
}

#[tokio::test]
async fn test_unknown_category_is_bad_request() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/venues/nightclubs").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_query_is_bad_request() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/venues?page=first").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_pagination_clamps_page() {
    let t = setup_app();
    let (_, body) = get_json(&t.app, "/api/venues?page_size=3&page=99&sort=name").await;

    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["page"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (_, body) = get_json(&t.app, "/api/venues/entertainment").await;
    assert_eq!(body["total_results"], 0);
    assert_eq!(body["total_pages"], 0);
    assert_eq!(body["page"], 1);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_ranks_name_matches_first() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/search?q=lahore").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["id"], "lahore-museum");
    assert_eq!(body["total_results"], 4);
    assert!(body["seo"]["title"].as_str().unwrap().contains("lahore"));
}

#[tokio::test]
async fn test_search_requires_query() {
    let t = setup_app();
    for uri in ["/api/search", "/api/search?q=", "/api/search?q=%20%20"] {
        let (status, body) = get_json(&t.app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["message"], "Search query must not be empty");
    }
}

#[tokio::test]
async fn test_search_no_results() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/search?q=sushi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 0);
    assert_eq!(body["items"], json!([]));
}

// =============================================================================
// Venue detail
// =============================================================================

#[tokio::test]
async fn test_venue_detail() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/venues/restaurants/monal").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["venue"]["name"], "The Monal Restaurant");
    assert_eq!(body["path"], "/venues/restaurants/monal");
    assert_eq!(body["image"]["source"]["kind"], "fuzzy_name");
    assert_eq!(body["image"]["url"], "https://img.example/restaurants/monal/1.jpg");
    assert_eq!(body["image"]["gallery"].as_array().unwrap().len(), 2);

    let recommended = ids(&body["recommendations"]);
    assert!(!recommended.is_empty());
    assert!(!recommended.contains(&"monal".to_string()));

    assert_eq!(body["seo"]["og_type"], "place");
    assert_eq!(body["seo"]["json_ld"]["@type"], "Restaurant");
    assert_eq!(
        body["seo"]["canonical_url"],
        "https://discoverpakistan.example/venues/restaurants/monal"
    );
}

#[tokio::test]
async fn test_duplicate_and_invalid_records_skipped() {
    let t = setup_app();
    let (_, body) = get_json(&t.app, "/api/venues/restaurants/monal").await;
    assert_eq!(body["venue"]["name"], "The Monal Restaurant");

    let (_, body) = get_json(&t.app, "/api/venues/restaurants").await;
    assert_eq!(body["total_results"], 3);
}

#[tokio::test]
async fn test_venue_not_found() {
    let t = setup_app();
    for uri in [
        "/api/venues/restaurants/no-such-venue",
        "/api/venues/cafes/monal",
        "/api/venues/nightclubs/monal",
    ] {
        let (status, body) = get_json(&t.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Venue not found");
    }
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_recommendations_exclude_and_diversify() {
    let t = setup_app();
    let (status, body) = get_json(
        &t.app,
        "/api/recommendations?city=Lahore&category=restaurants&exclude=restaurants/butt-karahi&count=3",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|r| r["id"] != "butt-karahi"));
    // Same-city venues from other categories come first
    assert!(recs.iter().all(|r| r["city"] == "Lahore"));
    assert!(recs.iter().all(|r| r["category"] != "restaurants"));
}

#[tokio::test]
async fn test_recommendations_seed_is_repeatable() {
    let mut config = TomlConfig::default();
    config.recommend.jitter = 5.0;
    let t = setup_app_with(config);

    let uri = "/api/recommendations?count=5&seed=42";
    let (_, first) = get_json(&t.app, uri).await;
    let (_, second) = get_json(&t.app, uri).await;
    assert_eq!(ids(&first["recommendations"]), ids(&second["recommendations"]));
}

#[tokio::test]
async fn test_recommendations_bad_exclude() {
    let t = setup_app();
    let (status, _) = get_json(&t.app, "/api/recommendations?exclude=monal").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Images
// =============================================================================

#[tokio::test]
async fn test_image_resolution_sources() {
    let t = setup_app();

    let (_, body) = get_json(&t.app, "/api/images/cafes/aylanto").await;
    assert_eq!(body["source"]["kind"], "place_id");
    assert_eq!(body["url"], "https://img.example/cafes/aylanto/cover.jpg");

    let (_, body) = get_json(&t.app, "/api/images/shopping/packages").await;
    assert_eq!(body["source"]["kind"], "exact_name");
    assert_eq!(body["url"], "https://img.example/shopping/packages-mall/1.jpg");

    let (_, body) = get_json(&t.app, "/api/images/cafes/chaaye-khana").await;
    assert_eq!(body["source"]["kind"], "declared");
    assert_eq!(body["url"], "https://photos.example/chaaye.jpg");

    let (_, body) = get_json(&t.app, "/api/images/restaurants/kolachi").await;
    assert_eq!(body["source"]["kind"], "probed");
    assert_eq!(body["source"]["key"], "restaurants/kolachi-karachi/1.jpg");

    let (_, body) = get_json(&t.app, "/api/images/arts-culture/lahore-museum").await;
    assert_eq!(body["source"]["kind"], "placeholder");
    assert_eq!(body["url"], "/static/placeholder.svg");
}

#[tokio::test]
async fn test_image_not_found() {
    let t = setup_app();
    let (status, body) = get_json(&t.app, "/api/images/cafes/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Venue not found");
}

#[tokio::test]
async fn test_image_cache_stats_and_clear() {
    let t = setup_app();

    get_json(&t.app, "/api/images/restaurants/kolachi").await;
    get_json(&t.app, "/api/images/restaurants/kolachi").await;

    let (_, stats) = get_json(&t.app, "/api/images/cache").await;
    assert_eq!(stats["entries"], 1);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["probe"], "manifest");
    assert_eq!(stats["mapping_entries"], 3);

    let response = t
        .app
        .clone()
        .oneshot(test_request("DELETE", "/api/images/cache"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["cleared"], 1);

    let (_, stats) = get_json(&t.app, "/api/images/cache").await;
    assert_eq!(stats["entries"], 0);
}

// =============================================================================
// Contact
// =============================================================================

#[tokio::test]
async fn test_contact_accepted_and_stored() {
    let t = setup_app();
    let submission = json!({
        "name": "Ayesha Khan",
        "email": "ayesha@example.pk",
        "phone": "+92 300 1234567",
        "message": "Please add opening hours for Chaaye Khana."
    });

    let response = t.app.clone().oneshot(json_request("/api/contact", &submission)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response.into_body()).await;
    let id = body["id"].as_str().unwrap().to_string();

    let stored = std::fs::read_to_string(t.root.path().join("contact").join("messages.jsonl")).unwrap();
    let line: Value = serde_json::from_str(stored.lines().next().unwrap()).unwrap();
    assert_eq!(line["id"], id);
    assert_eq!(line["email"], "ayesha@example.pk");
}

#[tokio::test]
async fn test_contact_reports_every_invalid_field() {
    let t = setup_app();
    let submission = json!({ "name": "A", "email": "nope", "message": "hi" });

    let response = t.app.clone().oneshot(json_request("/api/contact", &submission)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    let fields: Vec<&str> = body["error"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "message"]);

    assert!(!t.root.path().join("contact").join("messages.jsonl").exists());
}

#[tokio::test]
async fn test_contact_malformed_json() {
    let t = setup_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_disabled() {
    let mut config = TomlConfig::default();
    config.contact.enabled = false;
    let t = setup_app_with(config);

    let submission = json!({
        "name": "Ayesha Khan",
        "email": "ayesha@example.pk",
        "message": "Please add opening hours."
    });
    let response = t.app.clone().oneshot(json_request("/api/contact", &submission)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_index_page_has_head() {
    let t = setup_app();
    let response = t.app.clone().oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("<title>Discover Pakistan</title>"));
    assert!(html.contains("\"@type\":\"WebSite\""));
    assert!(!html.contains("pkv:head"));
}

#[tokio::test]
async fn test_listing_and_search_pages() {
    let t = setup_app();

    let response = t.app.clone().oneshot(test_request("GET", "/venues/cafes?city=Lahore")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("<title>Best Cafes in Lahore | Discover Pakistan</title>"));

    let response = t.app.clone().oneshot(test_request("GET", "/venues/bakeries")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t.app.clone().oneshot(test_request("GET", "/search?q=karahi")).await.unwrap();
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Search results for &quot;karahi&quot;"));
}

#[tokio::test]
async fn test_venue_page_rendered() {
    let t = setup_app();
    let response = t
        .app
        .clone()
        .oneshot(test_request("GET", "/venues/restaurants/monal"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("<h1>The Monal Restaurant</h1>"));
    assert!(html.contains("application/ld+json"));
    assert!(html.contains("rel=\"canonical\" href=\"https://discoverpakistan.example/venues/restaurants/monal\""));
    assert!(html.contains("You might also like"));
}

#[tokio::test]
async fn test_venue_page_not_found() {
    let t = setup_app();
    let response = t
        .app
        .clone()
        .oneshot(test_request("GET", "/venues/restaurants/nowhere"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("<h1>Venue not found</h1>"));
    assert!(html.contains("noindex"));
}

#[tokio::test]
async fn test_static_assets() {
    let t = setup_app();
    for (uri, content_type) in [
        ("/static/app.js", "application/javascript"),
        ("/static/placeholder.svg", "image/svg+xml"),
    ] {
        let response = t.app.clone().oneshot(test_request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], content_type);
    }
}
