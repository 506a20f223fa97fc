use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{
    ApiError, ApiResponse, AppState, CinemaDto, LookupDto, MovieDto, SeatAvailabilityDto,
    SlotDetailDto, validation,
};
use crate::services::SlotInput;

#[derive(Deserialize)]
pub struct SlotRequest {
    pub price: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub movie: i32,
    pub cinema: i32,
    pub language: i32,
}

/// GET /slots/{id}
/// Slot detail with the hosting cinema's full seat grid and a per-seat
/// availability flag derived from active tickets.
pub async fn get_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SlotDetailDto>>, ApiError> {
    validation::validate_id(id, "slot")?;

    let slot = state
        .store()
        .get_slot(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load slot: {e}")))?
        .ok_or_else(|| ApiError::not_found("Slot", id))?;

    let movie = state
        .store()
        .get_movie(slot.movie_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load movie: {e}")))?
        .ok_or_else(|| ApiError::not_found("Movie", slot.movie_id))?;

    let cinema = state
        .store()
        .get_cinema(slot.cinema_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load cinema: {e}")))?
        .ok_or_else(|| ApiError::not_found("Cinema", slot.cinema_id))?;

    let city = state
        .store()
        .get_city(cinema.city_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load city: {e}")))?
        .map(|c| c.name)
        .unwrap_or_default();

    let language = state
        .store()
        .get_languages_by_ids(&[slot.language_id])
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load language: {e}")))?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Language", slot.language_id))?;

    let seats = state
        .store()
        .seats_for_cinema(cinema.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load seats: {e}")))?;

    let occupied: HashSet<i32> = state
        .store()
        .active_seat_ids_for_slot(slot.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load occupancy: {e}")))?
        .into_iter()
        .collect();

    let seat_dtos = seats
        .into_iter()
        .map(|seat| SeatAvailabilityDto {
            id: seat.id,
            row: seat.row_number,
            number: seat.seat_number,
            available: !occupied.contains(&seat.id),
        })
        .collect();

    Ok(Json(ApiResponse::success(SlotDetailDto {
        id: slot.id,
        price: slot.price,
        start_time: slot.start_time,
        end_time: slot.end_time,
        movie: MovieDto {
            id: movie.id,
            name: movie.name,
            duration_minutes: movie.duration_minutes,
            release_date: movie.release_date,
            poster: movie.poster,
        },
        cinema: CinemaDto {
            id: cinema.id,
            name: cinema.name,
            city,
            address: cinema.address,
            image: cinema.image,
        },
        language: LookupDto {
            id: language.id,
            name: language.name,
        },
        seats: seat_dtos,
    })))
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<SlotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_staff()?;

    let input = slot_input(&payload)?;
    let slot = state.slots().create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(serde_json::json!({
            "id": slot.id,
            "price": slot.price,
            "start_time": slot.start_time,
            "end_time": slot.end_time,
        }))),
    ))
}

pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<SlotRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    user.require_staff()?;
    validation::validate_id(id, "slot")?;

    let input = slot_input(&payload)?;
    let slot = state.slots().update(id, input).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": slot.id,
        "price": slot.price,
        "start_time": slot.start_time,
        "end_time": slot.end_time,
    }))))
}

fn slot_input(payload: &SlotRequest) -> Result<SlotInput, ApiError> {
    validation::validate_id(payload.movie, "movie")?;
    validation::validate_id(payload.cinema, "cinema")?;
    validation::validate_id(payload.language, "language")?;

    Ok(SlotInput {
        price: payload.price,
        start_time: payload.start_time,
        end_time: payload.end_time,
        movie_id: payload.movie,
        cinema_id: payload.cinema,
        language_id: payload.language,
    })
}
