use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::ActiveEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, BookingDto, TicketDto, validation};

#[derive(Deserialize)]
pub struct BookingCreateRequest {
    pub slot: i32,
    pub seats: Vec<i32>,
}

/// POST /bookings
/// Books seats on a slot for the authenticated user. All five booking
/// preconditions and the write happen in the booking service; any rule
/// violation surfaces as a 400 with the violated rule's message.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<BookingCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_id(payload.slot, "slot")?;
    for seat in &payload.seats {
        validation::validate_id(*seat, "seat")?;
    }

    let booking = state
        .bookings()
        .create(user.id(), payload.slot, &payload.seats)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(serde_json::json!({
            "id": booking.id,
            "status": booking.status.to_value(),
            "seats": payload.seats,
        }))),
    ))
}

/// GET /bookings
/// The authenticated user's booking history, newest first.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<BookingDto>>>, ApiError> {
    let bookings = state
        .store()
        .list_bookings_for_user(user.id())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list bookings: {e}")))?;

    let booking_ids: Vec<i32> = bookings.iter().map(|b| b.id).collect();

    let slot_ids: Vec<i32> = {
        let mut seen = Vec::new();
        for booking in &bookings {
            if !seen.contains(&booking.slot_id) {
                seen.push(booking.slot_id);
            }
        }
        seen
    };

    let slot_map: HashMap<i32, _> = state
        .store()
        .get_slots_by_ids(&slot_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load slots: {e}")))?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let movie_ids: Vec<i32> = slot_map.values().map(|s| s.movie_id).collect();
    let movie_map: HashMap<i32, String> = state
        .store()
        .get_movies_by_ids(&movie_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load movies: {e}")))?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();

    let language_ids: Vec<i32> = slot_map.values().map(|s| s.language_id).collect();
    let language_map: HashMap<i32, String> = state
        .store()
        .get_languages_by_ids(&language_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load languages: {e}")))?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect();

    let cinema_ids: Vec<i32> = slot_map.values().map(|s| s.cinema_id).collect();
    let cinema_rows = state
        .store()
        .get_cinemas_by_ids(&cinema_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load cinemas: {e}")))?;

    let city_ids: Vec<i32> = cinema_rows.iter().map(|c| c.city_id).collect();
    let city_map: HashMap<i32, String> = state
        .store()
        .get_cities_by_ids(&city_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load cities: {e}")))?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let cinema_map: HashMap<i32, _> = cinema_rows.into_iter().map(|c| (c.id, c)).collect();

    let mut tickets_by_booking: HashMap<i32, Vec<TicketDto>> = HashMap::new();
    for (ticket, seat) in state
        .store()
        .tickets_for_bookings(&booking_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load tickets: {e}")))?
    {
        if let Some(seat) = seat {
            tickets_by_booking
                .entry(ticket.booking_id)
                .or_default()
                .push(TicketDto {
                    row: seat.row_number,
                    column: seat.seat_number,
                });
        }
    }

    let mut dtos = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let Some(slot) = slot_map.get(&booking.slot_id) else {
            continue;
        };
        let Some(cinema) = cinema_map.get(&slot.cinema_id) else {
            continue;
        };

        dtos.push(BookingDto {
            id: booking.id,
            status: booking.status.to_value(),
            movie: movie_map.get(&slot.movie_id).cloned().unwrap_or_default(),
            language: language_map
                .get(&slot.language_id)
                .cloned()
                .unwrap_or_default(),
            cinema_name: cinema.name.clone(),
            cinema_address: cinema.address.clone(),
            cinema_city: city_map.get(&cinema.city_id).cloned().unwrap_or_default(),
            start_time: slot.start_time,
            tickets: tickets_by_booking.remove(&booking.id).unwrap_or_default(),
        });
    }

    Ok(Json(ApiResponse::success(dtos)))
}

/// PATCH /bookings/{id}
/// Soft-cancels a booking the user owns, freeing its seats.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    validation::validate_id(id, "booking")?;

    let booking = state.bookings().cancel(user.id(), id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": booking.id,
        "status": booking.status.to_value(),
    }))))
}
