//! The booking lifecycle: creation with its ordered precondition gate,
//! and soft cancellation. Validation is fail-fast; the first violated
//! rule wins.

use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;

use crate::db::{BookingWrite, Store};
use crate::entities::bookings::{self, BookingStatus};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),

    #[error("Booking is closed for this showtime as it has already started or ended.")]
    SlotClosed,

    #[error("Please select at least one seat to proceed with the booking.")]
    EmptySeats,

    #[error("Duplicate seats are not allowed for booking")]
    DuplicateSeats,

    #[error("The selected seats do not belong to the cinema hosting this showtime.")]
    InvalidCinemaSeat,

    #[error("Seats {0:?} are already occupied.")]
    SeatsOccupied(Vec<i32>),

    #[error("This booking has already been cancelled.")]
    AlreadyCancelled,

    #[error("Cannot cancel a booking for a show that has already started or finished.")]
    PastShowCancel,

    #[error("Database error: {0}")]
    Database(String),
}

impl BookingError {
    fn from_db(err: &anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct BookingService {
    store: Store,
}

impl BookingService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Books `seat_ids` on a slot for a user. The occupancy check is
    /// optimistic; the partial unique index on active tickets is what
    /// actually guarantees a seat is sold once, and a violation raised by
    /// a racing writer is reported exactly like a failed check.
    pub async fn create(
        &self,
        user_id: i32,
        slot_id: i32,
        seat_ids: &[i32],
    ) -> Result<bookings::Model, BookingError> {
        let slot = self
            .store
            .get_slot(slot_id)
            .await
            .map_err(|e| BookingError::from_db(&e))?
            .ok_or_else(|| BookingError::NotFound(format!("Slot {slot_id} not found")))?;

        // 1. The show must not have started.
        if Utc::now() >= slot.start_time {
            return Err(BookingError::SlotClosed);
        }

        // 2. At least one seat.
        if seat_ids.is_empty() {
            return Err(BookingError::EmptySeats);
        }

        // 3. No seat twice in one request.
        let distinct: HashSet<i32> = seat_ids.iter().copied().collect();
        if distinct.len() != seat_ids.len() {
            return Err(BookingError::DuplicateSeats);
        }

        // 4. Every seat belongs to the hall hosting the slot.
        let seats = self
            .store
            .seats_by_ids(seat_ids)
            .await
            .map_err(|e| BookingError::from_db(&e))?;
        if seats.len() != seat_ids.len() || seats.iter().any(|s| s.cinema_id != slot.cinema_id) {
            return Err(BookingError::InvalidCinemaSeat);
        }

        // 5. None of the seats is already taken for this slot.
        let mut occupied = self
            .store
            .occupied_seat_ids(slot_id, seat_ids)
            .await
            .map_err(|e| BookingError::from_db(&e))?;
        if !occupied.is_empty() {
            occupied.sort_unstable();
            return Err(BookingError::SeatsOccupied(occupied));
        }

        let write = BookingWrite {
            user_id,
            slot_id,
            seat_ids,
        };

        match self.store.create_booking_with_tickets(write).await {
            Ok(booking) => Ok(booking),
            Err(e) if Store::is_unique_violation(&e) => {
                // Lost the race; report whichever seats are taken now.
                let mut occupied = self
                    .store
                    .occupied_seat_ids(slot_id, seat_ids)
                    .await
                    .unwrap_or_else(|_| seat_ids.to_vec());
                if occupied.is_empty() {
                    occupied = seat_ids.to_vec();
                }
                occupied.sort_unstable();
                Err(BookingError::SeatsOccupied(occupied))
            }
            Err(e) => Err(BookingError::from_db(&e)),
        }
    }

    /// Cancels a booking owned by `user_id`. Lookups are scoped to the
    /// owner, so someone else's booking id reads as not found.
    pub async fn cancel(
        &self,
        user_id: i32,
        booking_id: i32,
    ) -> Result<bookings::Model, BookingError> {
        let booking = self
            .store
            .get_booking_for_user(user_id, booking_id)
            .await
            .map_err(|e| BookingError::from_db(&e))?
            .ok_or_else(|| BookingError::NotFound(format!("Booking {booking_id} not found")))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        let slot = self
            .store
            .get_slot(booking.slot_id)
            .await
            .map_err(|e| BookingError::from_db(&e))?
            .ok_or_else(|| {
                BookingError::NotFound(format!("Slot {} not found", booking.slot_id))
            })?;

        if slot.start_time <= Utc::now() {
            return Err(BookingError::PastShowCancel);
        }

        self.store
            .cancel_booking(booking.id)
            .await
            .map_err(|e| BookingError::from_db(&e))
    }
}
