//! Use cases for the catalog: lookup entities, cinemas (with their seat
//! grids) and movies.

use chrono::NaiveDate;
use sea_orm::ActiveValue::Set;
use thiserror::Error;

use crate::db::Store;
use crate::entities::{cinemas, cities, genres, languages, movies};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl CatalogError {
    fn from_db(err: &anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// The full seat coordinate set for a `rows` x `seats_per_row` hall,
/// row-major, both coordinates 1-based. The cinema-creation use case
/// feeds this to a bulk insert inside the cinema's own transaction.
#[must_use]
pub fn seat_grid(rows: i32, seats_per_row: i32) -> Vec<(i32, i32)> {
    (1..=rows)
        .flat_map(|row| (1..=seats_per_row).map(move |seat| (row, seat)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct CinemaInput {
    pub name: String,
    pub city_id: i32,
    pub address: String,
    pub rows: i32,
    pub seats_per_row: i32,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MovieInput {
    pub name: String,
    pub description: String,
    pub duration_minutes: i32,
    pub release_date: NaiveDate,
    pub poster: Option<String>,
    pub genre_ids: Vec<i32>,
    pub language_ids: Vec<i32>,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_city(&self, name: &str) -> Result<cities::Model, CatalogError> {
        let taken = self
            .store
            .city_name_exists(name)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if taken {
            return Err(CatalogError::Duplicate(format!(
                "City '{name}' already exists"
            )));
        }

        self.store.insert_city(name).await.map_err(|e| {
            if Store::is_unique_violation(&e) {
                CatalogError::Duplicate(format!("City '{name}' already exists"))
            } else {
                CatalogError::from_db(&e)
            }
        })
    }

    pub async fn create_genre(&self, name: &str) -> Result<genres::Model, CatalogError> {
        let taken = self
            .store
            .genre_name_exists(name)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if taken {
            return Err(CatalogError::Duplicate(format!(
                "Genre '{name}' already exists"
            )));
        }

        self.store.insert_genre(name).await.map_err(|e| {
            if Store::is_unique_violation(&e) {
                CatalogError::Duplicate(format!("Genre '{name}' already exists"))
            } else {
                CatalogError::from_db(&e)
            }
        })
    }

    pub async fn create_language(&self, name: &str) -> Result<languages::Model, CatalogError> {
        let taken = self
            .store
            .language_name_exists(name)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if taken {
            return Err(CatalogError::Duplicate(format!(
                "Language '{name}' already exists"
            )));
        }

        self.store.insert_language(name).await.map_err(|e| {
            if Store::is_unique_violation(&e) {
                CatalogError::Duplicate(format!("Language '{name}' already exists"))
            } else {
                CatalogError::from_db(&e)
            }
        })
    }

    /// Creates the cinema and generates its seat grid exactly once, inside
    /// the same transaction as the cinema insert.
    pub async fn create_cinema(&self, input: CinemaInput) -> Result<cinemas::Model, CatalogError> {
        if input.rows <= 0 || input.seats_per_row <= 0 {
            return Err(CatalogError::Invalid(
                "rows and seats_per_row must be positive".to_string(),
            ));
        }

        let city = self
            .store
            .get_city(input.city_id)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if city.is_none() {
            return Err(CatalogError::NotFound(format!(
                "City {} not found",
                input.city_id
            )));
        }

        let taken = self
            .store
            .cinema_location_exists(&input.name, input.city_id, &input.address, None)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if taken {
            return Err(CatalogError::Duplicate(
                "A cinema with this name and address already exists in this city".to_string(),
            ));
        }

        let grid = seat_grid(input.rows, input.seats_per_row);

        let model = cinemas::ActiveModel {
            name: Set(input.name),
            city_id: Set(input.city_id),
            address: Set(input.address),
            rows: Set(input.rows),
            seats_per_row: Set(input.seats_per_row),
            image: Set(input.image),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        self.store
            .create_cinema_with_seats(model, &grid)
            .await
            .map_err(|e| {
                if Store::is_unique_violation(&e) {
                    CatalogError::Duplicate(
                        "A cinema with this name and address already exists in this city"
                            .to_string(),
                    )
                } else {
                    CatalogError::from_db(&e)
                }
            })
    }

    /// Updates a cinema's descriptive fields. The seating layout is
    /// frozen at creation: a request that tries to change `rows` or
    /// `seats_per_row` is rejected.
    pub async fn update_cinema(
        &self,
        id: i32,
        input: CinemaInput,
    ) -> Result<cinemas::Model, CatalogError> {
        let existing = self
            .store
            .get_cinema(id)
            .await
            .map_err(|e| CatalogError::from_db(&e))?
            .ok_or_else(|| CatalogError::NotFound(format!("Cinema {id} not found")))?;

        if input.rows != existing.rows || input.seats_per_row != existing.seats_per_row {
            return Err(CatalogError::Invalid(
                "The seating layout of a cinema cannot be changed after creation".to_string(),
            ));
        }

        let city = self
            .store
            .get_city(input.city_id)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if city.is_none() {
            return Err(CatalogError::NotFound(format!(
                "City {} not found",
                input.city_id
            )));
        }

        let taken = self
            .store
            .cinema_location_exists(&input.name, input.city_id, &input.address, Some(id))
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if taken {
            return Err(CatalogError::Duplicate(
                "A cinema with this name and address already exists in this city".to_string(),
            ));
        }

        let model = cinemas::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            city_id: Set(input.city_id),
            address: Set(input.address),
            image: Set(input.image),
            ..Default::default()
        };

        self.store
            .update_cinema(model)
            .await
            .map_err(|e| CatalogError::from_db(&e))
    }

    pub async fn create_movie(&self, input: MovieInput) -> Result<movies::Model, CatalogError> {
        if input.duration_minutes <= 0 {
            return Err(CatalogError::Invalid(
                "duration_minutes must be positive".to_string(),
            ));
        }

        if input.language_ids.is_empty() {
            return Err(CatalogError::Invalid(
                "A movie needs at least one language".to_string(),
            ));
        }

        let taken = self
            .store
            .movie_name_exists(&input.name)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if taken {
            return Err(CatalogError::Duplicate(format!(
                "Movie '{}' already exists",
                input.name
            )));
        }

        let found_genres = self
            .store
            .existing_genre_ids(&input.genre_ids)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if found_genres.len() != input.genre_ids.len() {
            return Err(CatalogError::NotFound(
                "One or more genres do not exist".to_string(),
            ));
        }

        let found_languages = self
            .store
            .existing_language_ids(&input.language_ids)
            .await
            .map_err(|e| CatalogError::from_db(&e))?;
        if found_languages.len() != input.language_ids.len() {
            return Err(CatalogError::NotFound(
                "One or more languages do not exist".to_string(),
            ));
        }

        let model = movies::ActiveModel {
            name: Set(input.name.clone()),
            description: Set(input.description),
            duration_minutes: Set(input.duration_minutes),
            release_date: Set(input.release_date),
            poster: Set(input.poster),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        self.store
            .create_movie(model, &input.genre_ids, &input.language_ids)
            .await
            .map_err(|e| {
                if Store::is_unique_violation(&e) {
                    CatalogError::Duplicate(format!("Movie '{}' already exists", input.name))
                } else {
                    CatalogError::from_db(&e)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_grid_dimensions() {
        let grid = seat_grid(3, 4);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.first(), Some(&(1, 1)));
        assert_eq!(grid.last(), Some(&(3, 4)));
    }

    #[test]
    fn test_seat_grid_coordinates_in_range_and_distinct() {
        let grid = seat_grid(5, 7);
        assert!(grid.iter().all(|&(r, s)| (1..=5).contains(&r) && (1..=7).contains(&s)));

        let unique: std::collections::HashSet<_> = grid.iter().collect();
        assert_eq!(unique.len(), grid.len());
    }

    #[test]
    fn test_seat_grid_single_row() {
        assert_eq!(seat_grid(1, 2), vec![(1, 1), (1, 2)]);
    }
}
