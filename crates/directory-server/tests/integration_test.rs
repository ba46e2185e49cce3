//! Integration tests for the directory server
//!
//! Requests go through the full router with the in-memory backend.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use async_trait::async_trait;
use directory_server::{create_router, AppState, Backend, InMemoryBackend, StoredBusiness, User};
use localbiz_common::{Catalog, Error, NewBusiness, Result};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const BASE_URL: &str = "https://dir.example";
const TOKEN: &str = "test-session";

/// Helper to create test app sharing a backend handle with the test
fn create_test_app() -> (Router, Arc<InMemoryBackend>) {
    let backend = Arc::new(
        InMemoryBackend::new().with_session(TOKEN, User::new("owner@example.com", "Owner")),
    );
    let state = AppState::new(Catalog::builtin().unwrap(), backend.clone(), BASE_URL)
        .with_site_name("Test Directory");

    (create_router(state), backend)
}

/// Backend whose storage is down but whose sessions still resolve
struct UnavailableBackend {
    user: User,
}

#[async_trait]
impl Backend for UnavailableBackend {
    async fn get_by_id(&self, _id: uuid::Uuid) -> Result<Option<StoredBusiness>> {
        Err(Error::Backend("storage unavailable".to_string()))
    }

    async fn create(&self, _new: NewBusiness, _owner: &User) -> Result<StoredBusiness> {
        Err(Error::Backend("storage unavailable".to_string()))
    }

    async fn get_current_user(&self, session_token: &str) -> Result<Option<User>> {
        Ok((session_token == TOKEN).then(|| self.user.clone()))
    }

    async fn health_check(&self) -> Result<()> {
        Err(Error::Backend("storage unavailable".to_string()))
    }
}

fn create_unavailable_app() -> Router {
    let backend = Arc::new(UnavailableBackend {
        user: User::new("owner@example.com", "Owner"),
    });
    let state = AppState::new(Catalog::builtin().unwrap(), backend, BASE_URL);
    create_router(state)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn bakery_fields(description: &str) -> Vec<(&'static str, String)> {
    vec![
        ("name", "Maple Street Bakery".to_string()),
        ("category", "Bakeries".to_string()),
        ("description", description.to_string()),
        ("price_range", "$$".to_string()),
        ("street", "45 Maple St".to_string()),
        ("city", "Portland".to_string()),
        ("state", "OR".to_string()),
        ("postal_code", "97205".to_string()),
        ("phone", "(503) 555-0100".to_string()),
        (
            "images",
            "https://img.example.com/bakery-1.jpg\nhttps://img.example.com/bakery-2.jpg"
                .to_string(),
        ),
        ("hours_monday", "7:00 AM - 3:00 PM".to_string()),
    ]
}

async fn post_form(app: &Router, fields: &[(&'static str, String)], session: bool) -> Response {
    let pairs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let mut request = Request::builder()
        .uri("/business/new")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if session {
        request = request.header(header::COOKIE, format!("session={}", TOKEN));
    }
    app.clone()
        .oneshot(request.body(Body::from(form_body(&pairs))).unwrap())
        .await
        .unwrap()
}

fn json_ld_scripts(html: &str) -> Vec<&str> {
    html.split("<script type=\"application/ld+json\">")
        .skip(1)
        .filter_map(|s| s.split("</script>").next())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "directory-server");
}

#[tokio::test]
async fn test_business_page() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/businesses/garden-bistro").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("<h1>The Garden Bistro</h1>"));
    assert!(html.contains(
        "<link rel=\"canonical\" href=\"https://dir.example/businesses/garden-bistro\">"
    ));

    let scripts = json_ld_scripts(&html);
    assert_eq!(scripts.len(), 2);
    let business: serde_json::Value = serde_json::from_str(scripts[0]).unwrap();
    assert_eq!(business["@type"], "LocalBusiness");
    assert_eq!(business["name"], "The Garden Bistro");
    assert_eq!(business["url"], "https://dir.example/businesses/garden-bistro");
    // Monday is closed
    assert_eq!(
        business["openingHoursSpecification"]
            .as_array()
            .unwrap()
            .len(),
        6
    );
}

#[tokio::test]
async fn test_structured_data_is_stable_across_requests() {
    let (app, _backend) = create_test_app();

    let first = body_string(get(&app, "/businesses/zen-yoga-studio").await).await;
    let second = body_string(get(&app, "/businesses/zen-yoga-studio").await).await;
    assert_eq!(json_ld_scripts(&first), json_ld_scripts(&second));
}

#[tokio::test]
async fn test_unknown_business_is_not_found() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/businesses/no-such-place").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Page not found"));
}

#[tokio::test]
async fn test_location_pages() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/businesses/garden-bistro/sellwood").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    let scripts = json_ld_scripts(&html);
    let business: serde_json::Value = serde_json::from_str(scripts[0]).unwrap();
    assert_eq!(business["name"], "The Garden Bistro - Sellwood");
    assert_eq!(business["branchOf"]["name"], "The Garden Bistro");
    assert_eq!(business["address"]["streetAddress"], "8015 SE 13th Ave");

    let response = get(&app, "/businesses/garden-bistro/no-such-location").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Location exists, but under a different parent
    let response = get(&app, "/businesses/bright-smile-dental/sellwood").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_category_filter() {
    let (app, _backend) = create_test_app();

    let html = body_string(get(&app, "/businesses?category=Dentists").await).await;
    assert!(html.contains("href=\"/businesses/bright-smile-dental\""));
    assert!(!html.contains("href=\"/businesses/garden-bistro\""));

    let html = body_string(get(&app, "/").await).await;
    assert!(html.contains("href=\"/businesses/bright-smile-dental\""));
    assert!(html.contains("href=\"/businesses/garden-bistro\""));
}

#[tokio::test]
async fn test_form_requires_session() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/business/new").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/sign-in?redirect_to=%2Fbusiness%2Fnew"
    );

    let response = post_form(&app, &bakery_fields("Fresh bread every day."), false).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_form_renders_for_signed_in_user() {
    let (app, _backend) = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/business/new")
                .header(header::COOKIE, format!("session={}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("<form method=\"post\" action=\"/business/new\">"));
    assert!(html.contains("Signed in as Owner"));
}

#[tokio::test]
async fn test_short_description_rejected_before_backend() {
    let (app, backend) = create_test_app();

    let response = post_form(&app, &bakery_fields("Too short"), true).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_string(response).await;
    assert!(html.contains("Description must be at least 10 characters"));
    // Submitted values are kept
    assert!(html.contains("value=\"Maple Street Bakery\""));
    assert!(backend.is_empty().await);
}

#[tokio::test]
async fn test_create_redirects_to_new_page() {
    let (app, backend) = create_test_app();

    let response = post_form(&app, &bakery_fields("Sourdough and pastries daily."), true).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(backend.len().await, 1);

    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/business/"));

    let response = get(&app, &location).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<h1>Maple Street Bakery</h1>"));
    // No featured image submitted: the first image is the hero
    assert!(html.contains("<img class=\"hero\" src=\"https://img.example.com/bakery-1.jpg\""));
    assert!(html.contains(&format!(
        "<link rel=\"canonical\" href=\"https://dir.example{}\">",
        location
    )));
}

#[tokio::test]
async fn test_duplicate_name_shows_field_message() {
    let (app, backend) = create_test_app();
    let fields = bakery_fields("Sourdough and pastries daily.");

    let first = post_form(&app, &fields, true).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = post_form(&app, &fields, true).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let html = body_string(second).await;
    assert!(html.contains("id=\"name-error\""));
    assert!(html.contains("already exists"));
    assert_eq!(backend.len().await, 1);
}

#[tokio::test]
async fn test_stored_business_not_found() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/business/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/business/6f1c1c4e-4a8e-4b7e-9c1e-0a9a1e2b3c4d").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_create_business() {
    let (app, backend) = create_test_app();

    let payload = json!({
        "name": "Riverside Books",
        "category": "Bookstores",
        "description": "New and used books, author events every month.",
        "price_range": "$",
        "street": "300 River Rd",
        "city": "Portland",
        "state": "OR",
        "postal_code": "97201",
        "phone": "(503) 555-0177",
        "images": "https://img.example.com/books.jpg"
    });

    let request = |auth: bool, body: &serde_json::Value| {
        let mut builder = Request::builder()
            .uri("/api/businesses")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json");
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    };

    // No session
    let response = app.clone().oneshot(request(false, &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Invalid price range
    let mut bad = payload.clone();
    bad["price_range"] = json!("$$$$$");
    let response = app.clone().oneshot(request(true, &bad)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["errors"]["price_range"].is_string());
    assert!(backend.is_empty().await);

    // Valid
    let response = app.clone().oneshot(request(true, &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["record"]["slug"], "riverside-books");
    assert_eq!(
        json["record"]["featured_image"],
        "https://img.example.com/books.jpg"
    );

    // Same name again
    let response = app.clone().oneshot(request(true, &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_api_get_business() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/api/businesses/garden-bistro").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["name"], "The Garden Bistro");
    assert_eq!(json["category"], "Restaurants");

    let response = get(&app, "/api/businesses/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_sitemaps() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/sitemap.xml").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
    let xml = body_string(response).await;
    assert_eq!(xml.matches("<sitemap>").count(), 2);

    let xml = body_string(get(&app, "/sitemap-businesses.xml").await).await;
    assert!(xml.contains("<loc>https://dir.example/businesses/garden-bistro</loc>"));

    let xml = body_string(get(&app, "/sitemap-locations.xml").await).await;
    assert!(xml.contains("<loc>https://dir.example/businesses/bright-smile-dental/beaverton</loc>"));

    let robots = body_string(get(&app, "/robots.txt").await).await;
    assert!(robots.contains("Sitemap: https://dir.example/sitemap.xml"));
}

#[tokio::test]
async fn test_unknown_route_renders_not_found_page() {
    let (app, _backend) = create_test_app();

    let response = get(&app, "/definitely/not/here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Page not found"));
}

#[tokio::test]
async fn test_health_check_reports_backend_outage() {
    let app = create_unavailable_app();

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "unhealthy");
}

#[tokio::test]
async fn test_form_shows_message_when_backend_fails() {
    let app = create_unavailable_app();

    let response = post_form(&app, &bakery_fields("Fresh bread every day."), true).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_string(response).await;
    assert!(html.contains("id=\"form-error\""));
    assert!(!html.contains("id=\"name-error\""));
    // Submitted values survive the failed save
    assert!(html.contains("Maple Street Bakery"));
}

#[tokio::test]
async fn test_stored_business_page_when_backend_fails() {
    let app = create_unavailable_app();

    let response = get(&app, &format!("/business/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("Something went wrong"));
}
