use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
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

async fn create(app: &Router, uri: &str, body: Value) -> i64 {
    let (status, body) = request(app, "POST", uri, Some(ADMIN_API_KEY), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create at {uri} failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

struct Fixture {
    cinema: i64,
    language: i64,
    other_language: i64,
    /// 120-minute movie released 2020-01-01.
    movie: i64,
    /// Movie whose release date is a year out.
    unreleased_movie: i64,
}

async fn seed(app: &Router) -> Fixture {
    let city = create(app, "/api/cities", json!({"name": "gotham"})).await;
    let cinema = create(
        app,
        "/api/cinemas",
        json!({
            "name": "alpha grand",
            "city": city,
            "address": "1 First Ave",
            "rows": 3,
            "seats_per_row": 4
        }),
    )
    .await;

    let language = create(app, "/api/languages", json!({"name": "english"})).await;
    let other_language = create(app, "/api/languages", json!({"name": "french"})).await;

    let movie = create(
        app,
        "/api/movies",
        json!({
            "name": "Inception",
            "description": "A heist inside dreams.",
            "duration_minutes": 120,
            "release_date": "2020-01-01",
            "genres": [],
            "languages": [language]
        }),
    )
    .await;

    let future_release = (Utc::now() + Duration::days(365)).date_naive().to_string();
    let unreleased_movie = create(
        app,
        "/api/movies",
        json!({
            "name": "Next Year Epic",
            "description": "Not out yet.",
            "duration_minutes": 100,
            "release_date": future_release,
            "genres": [],
            "languages": [language]
        }),
    )
    .await;

    Fixture {
        cinema,
        language,
        other_language,
        movie,
        unreleased_movie,
    }
}

fn slot_body(
    fx: &Fixture,
    movie: i64,
    language: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Value {
    json!({
        "price": 250,
        "start_time": start.to_rfc3339(),
        "end_time": end.to_rfc3339(),
        "movie": movie,
        "cinema": fx.cinema,
        "language": language
    })
}

#[tokio::test]
async fn test_slot_creation_and_seat_grid() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(2);
    let end = start + Duration::minutes(130);

    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "slot create failed: {body}");
    let slot_id = body["data"]["id"].as_i64().unwrap();

    // The 3x4 grid generated at cinema creation shows up whole, every
    // seat distinct, in range, and available.
    let uri = format!("/api/slots/{slot_id}");
    let (status, body) = request(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let seats = body["data"]["seats"].as_array().unwrap();
    assert_eq!(seats.len(), 12);

    let mut coordinates = std::collections::HashSet::new();
    for seat in seats {
        let row = seat["row"].as_i64().unwrap();
        let number = seat["number"].as_i64().unwrap();
        assert!((1..=3).contains(&row));
        assert!((1..=4).contains(&number));
        assert_eq!(seat["available"], true);
        assert!(coordinates.insert((row, number)));
    }

    assert_eq!(body["data"]["movie"]["name"], "Inception");
    assert_eq!(body["data"]["language"]["name"], "english");
}

#[tokio::test]
async fn test_slot_rejects_end_before_start() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(2);
    let (status, _) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, start, start)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(
            &fx,
            fx.movie,
            fx.language,
            start,
            start - Duration::minutes(10),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_slot_rejects_unsupported_language() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(2);
    let end = start + Duration::minutes(130);

    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.other_language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("language"));
}

#[tokio::test]
async fn test_slot_rejects_overlap_in_same_cinema() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(2);
    let end = start + Duration::minutes(130);

    let (status, _) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Starts inside the booked window.
    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(
            &fx,
            fx.movie,
            fx.language,
            start + Duration::minutes(60),
            end + Duration::minutes(60),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already booked"));

    // Fully envelops the booked window.
    let (status, _) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(
            &fx,
            fx.movie,
            fx.language,
            start - Duration::minutes(30),
            end + Duration::minutes(30),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Back-to-back is allowed: the interval is half-open.
    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(
            &fx,
            fx.movie,
            fx.language,
            end,
            end + Duration::minutes(130),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "touching slot rejected: {body}");
}

#[tokio::test]
async fn test_slot_rejects_duration_shorter_than_movie() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(2);
    let end = start + Duration::minutes(90);

    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("duration"));
}

#[tokio::test]
async fn test_slot_rejects_showtime_before_release_date() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(30);
    let end = start + Duration::minutes(110);

    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.unreleased_movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("release date"));
}

#[tokio::test]
async fn test_slot_rejects_start_in_past() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() - Duration::hours(1);
    let end = start + Duration::minutes(130);

    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("past"));
}

#[tokio::test]
async fn test_slot_update_runs_the_same_gate() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let start = Utc::now() + Duration::days(2);
    let end = start + Duration::minutes(130);
    let (status, body) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let slot_id = body["data"]["id"].as_i64().unwrap();

    let second_start = end + Duration::minutes(60);
    let second_end = second_start + Duration::minutes(130);
    let (status, _) = request(
        &app,
        "POST",
        "/api/slots",
        Some(ADMIN_API_KEY),
        Some(slot_body(
            &fx,
            fx.movie,
            fx.language,
            second_start,
            second_end,
        )),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Moving the first slot onto the second must fail.
    let uri = format!("/api/slots/{slot_id}");
    let (status, _) = request(
        &app,
        "PUT",
        &uri,
        Some(ADMIN_API_KEY),
        Some(slot_body(
            &fx,
            fx.movie,
            fx.language,
            second_start + Duration::minutes(10),
            second_end + Duration::minutes(10),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // An update that does not overlap anything else (including itself)
    // passes.
    let moved_start = second_end + Duration::minutes(60);
    let moved_end = moved_start + Duration::minutes(130);
    let (status, body) = request(
        &app,
        "PUT",
        &uri,
        Some(ADMIN_API_KEY),
        Some(slot_body(&fx, fx.movie, fx.language, moved_start, moved_end)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "slot move failed: {body}");
}

#[tokio::test]
async fn test_slot_writes_require_staff() {
    let app = spawn_app().await;
    let fx = seed(&app).await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({"email": "user@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "user@example.com", "password": "password123"})),
    )
    .await;
    let user_key = body["data"]["api_key"].as_str().unwrap().to_string();

    let start = Utc::now() + Duration::days(2);
    let end = start + Duration::minutes(130);
    let (status, _) = request(
        &app,
        "POST",
        "/api/slots",
        Some(&user_key),
        Some(slot_body(&fx, fx.movie, fx.language, start, end)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
