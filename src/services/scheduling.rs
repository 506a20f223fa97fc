//! The slot scheduling gate. Every create or update runs the same
//! ordered rule set; nothing is enforced lazily at read time.

use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::Set;
use thiserror::Error;

use crate::db::Store;
use crate::entities::slots;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("{0}")]
    NotFound(String),

    #[error("The selected language is not supported for this specific movie.")]
    LanguageNotSupported,

    #[error("This cinema is already booked during this time slot.")]
    OverlappingSchedule,

    #[error("The slot duration is shorter than the actual movie running time.")]
    DurationTooShort,

    #[error("Cannot schedule a showtime before the movie's official release date.")]
    BeforeReleaseDate,

    #[error("Showtimes cannot be scheduled in the past.")]
    PastStartTime,

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl SlotError {
    fn from_db(err: &anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlotInput {
    pub price: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub movie_id: i32,
    pub cinema_id: i32,
    pub language_id: i32,
}

#[derive(Clone)]
pub struct SlotService {
    store: Store,
}

impl SlotService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: SlotInput) -> Result<slots::Model, SlotError> {
        self.validate(&input, None).await?;

        let model = slots::ActiveModel {
            price: Set(input.price),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            movie_id: Set(input.movie_id),
            cinema_id: Set(input.cinema_id),
            language_id: Set(input.language_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        self.store.insert_slot(model).await.map_err(|e| {
            // Two admins racing for the same (cinema, start_time) land on
            // the unique index; report it as the overlap it is.
            if Store::is_unique_violation(&e) {
                SlotError::OverlappingSchedule
            } else {
                SlotError::from_db(&e)
            }
        })
    }

    pub async fn update(&self, id: i32, input: SlotInput) -> Result<slots::Model, SlotError> {
        let existing = self
            .store
            .get_slot(id)
            .await
            .map_err(|e| SlotError::from_db(&e))?
            .ok_or_else(|| SlotError::NotFound(format!("Slot {id} not found")))?;

        self.validate(&input, Some(existing.id)).await?;

        let model = slots::ActiveModel {
            id: Set(existing.id),
            price: Set(input.price),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            movie_id: Set(input.movie_id),
            cinema_id: Set(input.cinema_id),
            language_id: Set(input.language_id),
            ..Default::default()
        };

        self.store.update_slot(model).await.map_err(|e| {
            if Store::is_unique_violation(&e) {
                SlotError::OverlappingSchedule
            } else {
                SlotError::from_db(&e)
            }
        })
    }

    /// Runs the full rule set, in order. `exclude` carries the id of the
    /// slot being updated so it does not overlap with itself.
    async fn validate(&self, input: &SlotInput, exclude: Option<i32>) -> Result<(), SlotError> {
        if input.price <= 0 {
            return Err(SlotError::Invalid("price must be positive".to_string()));
        }

        if input.end_time <= input.start_time {
            return Err(SlotError::Invalid(
                "end_time must be after start_time".to_string(),
            ));
        }

        let movie = self
            .store
            .get_movie(input.movie_id)
            .await
            .map_err(|e| SlotError::from_db(&e))?
            .ok_or_else(|| SlotError::NotFound(format!("Movie {} not found", input.movie_id)))?;

        let cinema = self
            .store
            .get_cinema(input.cinema_id)
            .await
            .map_err(|e| SlotError::from_db(&e))?;
        if cinema.is_none() {
            return Err(SlotError::NotFound(format!(
                "Cinema {} not found",
                input.cinema_id
            )));
        }

        // 1. The movie must actually be screened in this language.
        let movie_languages = self
            .store
            .language_ids_for_movie(movie.id)
            .await
            .map_err(|e| SlotError::from_db(&e))?;
        if !movie_languages.contains(&input.language_id) {
            return Err(SlotError::LanguageNotSupported);
        }

        // 2. One showtime per hall at a time, across all movies.
        let overlaps = self
            .store
            .slot_overlap_exists(input.cinema_id, input.start_time, input.end_time, exclude)
            .await
            .map_err(|e| SlotError::from_db(&e))?;
        if overlaps {
            return Err(SlotError::OverlappingSchedule);
        }

        // 3. The slot must fit the whole movie.
        let duration = input.end_time - input.start_time;
        if duration < Duration::minutes(i64::from(movie.duration_minutes)) {
            return Err(SlotError::DurationTooShort);
        }

        // 4. No showtimes before the release date.
        if input.start_time.date_naive() < movie.release_date {
            return Err(SlotError::BeforeReleaseDate);
        }

        // 5. Evaluated against the wall clock on every save, so a slot
        // whose start has passed can no longer be edited. Matches the
        // system this replaces; see DESIGN.md.
        if input.start_time < Utc::now() {
            return Err(SlotError::PastStartTime);
        }

        Ok(())
    }
}
