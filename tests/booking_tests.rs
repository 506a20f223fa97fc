use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sea_orm::ActiveValue::Set;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use cinebook::entities::slots;

/// Default API key seeded by migration (must match m20250615_seed_admin_user.rs)
const ADMIN_API_KEY: &str = "cinebook_default_api_key_please_regenerate";

async fn spawn_app() -> (Router, Arc<cinebook::api::AppState>) {
    let mut config = cinebook::Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = cinebook::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = cinebook::api::router(state.clone()).await;
    (app, state)
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

struct Fixture {
    cinema: i64,
    language: i64,
    movie: i64,
    slot: i64,
}

/// City + cinema (given grid) + 120-minute movie + one slot tomorrow.
async fn seed(app: &Router, rows: i32, seats_per_row: i32) -> Fixture {
    let city = create(app, "/api/cities", json!({"name": "gotham"})).await;
    let cinema = create(
        app,
        "/api/cinemas",
        json!({
            "name": "alpha grand",
            "city": city,
            "address": "1 First Ave",
            "rows": rows,
            "seats_per_row": seats_per_row
        }),
    )
    .await;

    let language = create(app, "/api/languages", json!({"name": "english"})).await;

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

    let start = Utc::now() + Duration::days(1);
    let end = start + Duration::minutes(130);
    let slot = create(
        app,
        "/api/slots",
        json!({
            "price": 250,
            "start_time": start.to_rfc3339(),
            "end_time": end.to_rfc3339(),
            "movie": movie,
            "cinema": cinema,
            "language": language
        }),
    )
    .await;

    Fixture {
        cinema,
        language,
        movie,
        slot,
    }
}

/// Maps (row, number) -> seat id using the slot availability view.
async fn seat_map(app: &Router, slot: i64) -> HashMap<(i64, i64), i64> {
    let uri = format!("/api/slots/{slot}");
    let (status, body) = request(app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    body["data"]["seats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|seat| {
            (
                (seat["row"].as_i64().unwrap(), seat["number"].as_i64().unwrap()),
                seat["id"].as_i64().unwrap(),
            )
        })
        .collect()
}

async fn availability(app: &Router, slot: i64) -> HashMap<i64, bool> {
    let uri = format!("/api/slots/{slot}");
    let (_, body) = request(app, "GET", &uri, None, None).await;

    body["data"]["seats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|seat| (seat["id"].as_i64().unwrap(), seat["available"].as_bool().unwrap()))
        .collect()
}

/// Rewinds a slot into the past, bypassing the scheduling gate, to
/// exercise the rules that only apply once a show has started.
async fn rewind_slot(state: &Arc<cinebook::api::AppState>, slot: i64) {
    let start = Utc::now() - Duration::hours(3);
    let end = start + Duration::minutes(130);

    state
        .shared
        .store
        .update_slot(slots::ActiveModel {
            id: Set(i32::try_from(slot).unwrap()),
            start_time: Set(start),
            end_time: Set(end),
            ..Default::default()
        })
        .await
        .expect("failed to rewind slot");
}

#[tokio::test]
async fn test_full_booking_scenario() {
    // The end-to-end walkthrough: 1x2 hall, two users fighting over two
    // seats, a cancellation freeing one up again.
    let (app, _state) = spawn_app().await;
    let fx = seed(&app, 1, 2).await;

    let seats = seat_map(&app, fx.slot).await;
    assert_eq!(seats.len(), 2);
    let s11 = seats[&(1, 1)];
    let s12 = seats[&(1, 2)];

    let u1 = signup_and_login(&app, "u1@example.com").await;
    let u2 = signup_and_login(&app, "u2@example.com").await;

    // U1 takes (1,1).
    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");
    let b1 = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "B");

    // U2 cannot take the same seat.
    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u2),
        Some(json!({"slot": fx.slot, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("occupied"));

    // The other seat still works.
    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u2),
        Some(json!({"slot": fx.slot, "seats": [s12]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let avail = availability(&app, fx.slot).await;
    assert_eq!(avail[&s11], false);
    assert_eq!(avail[&s12], false);

    // U1 cancels; (1,1) frees up, (1,2) stays taken.
    let uri = format!("/api/bookings/{b1}");
    let (status, body) = request(&app, "PATCH", &uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "C");

    let avail = availability(&app, fx.slot).await;
    assert_eq!(avail[&s11], true);
    assert_eq!(avail[&s12], false);

    // The freed seat is bookable again, by anyone.
    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u2),
        Some(json!({"slot": fx.slot, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_no_partial_booking_on_conflict() {
    let (app, _state) = spawn_app().await;
    let fx = seed(&app, 1, 3).await;

    let seats = seat_map(&app, fx.slot).await;
    let a = seats[&(1, 1)];
    let b = seats[&(1, 2)];
    let c = seats[&(1, 3)];

    let u1 = signup_and_login(&app, "u1@example.com").await;
    let u2 = signup_and_login(&app, "u2@example.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [a, b]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // {B, C} must fail entirely: no ticket for C may survive.
    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u2),
        Some(json!({"slot": fx.slot, "seats": [b, c]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let avail = availability(&app, fx.slot).await;
    assert_eq!(avail[&a], false);
    assert_eq!(avail[&b], false);
    assert_eq!(avail[&c], true, "no partial booking may hold seat C");

    // U1's original booking is unchanged.
    let (status, body) = request(&app, "GET", "/api/bookings", Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["data"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["status"], "B");
    assert_eq!(bookings[0]["tickets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let (app, _state) = spawn_app().await;
    let fx = seed(&app, 1, 2).await;
    let seats = seat_map(&app, fx.slot).await;
    let s11 = seats[&(1, 1)];

    let u1 = signup_and_login(&app, "u1@example.com").await;

    // Unauthenticated.
    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        None,
        Some(json!({"slot": fx.slot, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Empty selection.
    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least one seat"));

    // Duplicate seats in one request.
    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [s11, s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Duplicate"));

    // Seats from another cinema.
    let other_cinema = create(
        &app,
        "/api/cinemas",
        json!({
            "name": "other hall",
            "city": 1,
            "address": "9 Ninth Rd",
            "rows": 1,
            "seats_per_row": 1
        }),
    )
    .await;
    let start = Utc::now() + Duration::days(3);
    let end = start + Duration::minutes(130);
    let other_slot = create(
        &app,
        "/api/slots",
        json!({
            "price": 100,
            "start_time": start.to_rfc3339(),
            "end_time": end.to_rfc3339(),
            "movie": fx.movie,
            "cinema": other_cinema,
            "language": fx.language
        }),
    )
    .await;
    let other_seats = seat_map(&app, other_slot).await;
    let foreign_seat = other_seats[&(1, 1)];

    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [foreign_seat]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("belong"));

    // Unknown slot.
    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": 9999, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let _ = fx.cinema;
}

#[tokio::test]
async fn test_booking_closed_once_show_started() {
    let (app, state) = spawn_app().await;
    let fx = seed(&app, 1, 2).await;
    let seats = seat_map(&app, fx.slot).await;
    let s11 = seats[&(1, 1)];

    let u1 = signup_and_login(&app, "u1@example.com").await;

    rewind_slot(&state, fx.slot).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("closed"));
}

#[tokio::test]
async fn test_cancellation_rules() {
    let (app, state) = spawn_app().await;
    let fx = seed(&app, 1, 2).await;
    let seats = seat_map(&app, fx.slot).await;
    let s11 = seats[&(1, 1)];
    let s12 = seats[&(1, 2)];

    let u1 = signup_and_login(&app, "u1@example.com").await;
    let u2 = signup_and_login(&app, "u2@example.com").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [s11]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let b1 = body["data"]["id"].as_i64().unwrap();

    // Someone else's booking reads as not found.
    let uri = format!("/api/bookings/{b1}");
    let (status, _) = request(&app, "PATCH", &uri, Some(&u2), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // First cancellation succeeds, second is rejected.
    let (status, _) = request(&app, "PATCH", &uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, "PATCH", &uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already been cancelled"));

    // A booking whose show has started cannot be cancelled.
    let (status, body) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u2),
        Some(json!({"slot": fx.slot, "seats": [s12]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let b2 = body["data"]["id"].as_i64().unwrap();

    rewind_slot(&state, fx.slot).await;

    let uri = format!("/api/bookings/{b2}");
    let (status, body) = request(&app, "PATCH", &uri, Some(&u2), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already started"));
}

#[tokio::test]
async fn test_booking_history_detail() {
    let (app, _state) = spawn_app().await;
    let fx = seed(&app, 2, 2).await;
    let seats = seat_map(&app, fx.slot).await;

    let u1 = signup_and_login(&app, "u1@example.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/bookings",
        Some(&u1),
        Some(json!({"slot": fx.slot, "seats": [seats[&(1, 2)], seats[&(2, 1)]]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(&app, "GET", "/api/bookings", Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);

    let bookings = body["data"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);

    let booking = &bookings[0];
    assert_eq!(booking["status"], "B");
    assert_eq!(booking["movie"], "Inception");
    assert_eq!(booking["language"], "english");
    assert_eq!(booking["cinema_name"], "alpha grand");
    assert_eq!(booking["cinema_city"], "gotham");

    let mut tickets: Vec<(i64, i64)> = booking["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["row"].as_i64().unwrap(), t["column"].as_i64().unwrap()))
        .collect();
    tickets.sort_unstable();
    assert_eq!(tickets, vec![(1, 2), (2, 1)]);

    // An account with no bookings sees an empty history.
    let u2 = signup_and_login(&app, "u2@example.com").await;
    let (status, body) = request(&app, "GET", "/api/bookings", Some(&u2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}
