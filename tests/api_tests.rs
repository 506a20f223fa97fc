use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20250615_seed_admin_user.rs)
const ADMIN_API_KEY: &str = "cinebook_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = cinebook::Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = cinebook::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    cinebook::api::router(state).await
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }

    let request = if let Some(body) = body {
        builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

async fn signup_and_login(app: &Router, email: &str) -> String {
    let (status, _) = request(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"name": "Test User", "email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["data"]["api_key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let (status, _) = request(&app, "GET", "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/api/profile", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = request(&app, "GET", "/api/profile", Some(ADMIN_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@cinebook.local");
}

#[tokio::test]
async fn test_unmatched_route_returns_standard_body() {
    let app = spawn_app().await;

    let (status, body) = request(&app, "GET", "/api/no-such-resource", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "The requested resource was not found");
}

#[tokio::test]
async fn test_signup_login_profile_flow() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Ada",
            "email": "Ada@Example.COM",
            "phone_number": "9876543210",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Email is stored normalized.
    assert_eq!(body["data"]["email"], "ada@example.com");

    let api_key = {
        let (status, body) = request(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["api_key"].as_str().unwrap().to_string()
    };

    let (status, body) = request(&app, "GET", "/api/profile", Some(&api_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ada");
    assert_eq!(body["data"]["phone_number"], "9876543210");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;
    signup_and_login(&app, "bob@example.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "bob@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_duplicate_email_case_insensitive() {
    let app = spawn_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": "carol@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": "  Carol@Example.com ", "password": "password456"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_signup_input_validation() {
    let app = spawn_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": "not-an-email", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": "dora@example.com", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "dora@example.com",
            "phone_number": "12345",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_update_allow_list() {
    let app = spawn_app().await;
    let api_key = signup_and_login(&app, "erin@example.com").await;

    // Unknown field is rejected outright.
    let (status, body) = request(
        &app,
        "PATCH",
        "/api/profile",
        Some(&api_key),
        Some(json!({"email": "evil@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not allowed"));

    let (status, body) = request(
        &app,
        "PATCH",
        "/api/profile",
        Some(&api_key),
        Some(json!({"name": "Erin Updated", "phone_number": "1112223334"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Erin Updated");
    assert_eq!(body["data"]["phone_number"], "1112223334");
    // Untouched field survives the partial update.
    assert_eq!(body["data"]["email"], "erin@example.com");
}

#[tokio::test]
async fn test_catalog_writes_are_staff_gated() {
    let app = spawn_app().await;
    let user_key = signup_and_login(&app, "frank@example.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/cities",
        Some(&user_key),
        Some(json!({"name": "Springfield"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "POST",
        "/api/cities",
        Some(ADMIN_API_KEY),
        Some(json!({"name": "Springfield"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "springfield");
}

#[tokio::test]
async fn test_city_names_normalized_and_unique() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/cities",
        Some(ADMIN_API_KEY),
        Some(json!({"name": "  New York "})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "new york");

    // Same name modulo case and whitespace is a duplicate.
    let (status, _) = request(
        &app,
        "POST",
        "/api/cities",
        Some(ADMIN_API_KEY),
        Some(json!({"name": "NEW YORK"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(&app, "GET", "/api/cities?search=york", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = request(&app, "GET", "/api/cities?search=zzz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_lookup_lists_are_public() {
    let app = spawn_app().await;

    for uri in ["/api/languages", "/api/genres", "/api/cities"] {
        let (status, body) = request(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_array());
    }
}

#[tokio::test]
async fn test_malformed_date_rejected() {
    let app = spawn_app().await;

    let (status, body) = request(&app, "GET", "/api/cinemas/1?date=last-tuesday", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
}
