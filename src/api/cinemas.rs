use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{
    ApiError, ApiResponse, AppState, CinemaDetailDto, CinemaDto, CinemaMovieGroupDto,
    LanguageSlotsDto, LookupDto, MovieSummaryDto, Paginated, SlotSummaryDto, validation,
};
use crate::db::CinemaFilter;
use crate::entities::{cinemas, slots};
use crate::services::catalog::CinemaInput;

#[derive(Deserialize)]
pub struct CinemasQuery {
    cities: Option<String>,
    search: Option<String>,
    page: Option<u64>,
    page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct CinemaDetailQuery {
    date: Option<String>,
}

#[derive(Deserialize)]
pub struct CinemaRequest {
    pub name: String,
    pub city: i32,
    pub address: String,
    pub rows: i32,
    pub seats_per_row: i32,
    pub image: Option<String>,
}

pub async fn list_cinemas(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CinemasQuery>,
) -> Result<Json<ApiResponse<Paginated<CinemaDto>>>, ApiError> {
    let city_ids = validation::parse_id_list(query.cities.as_deref(), "city")?;

    let (page, page_size) = {
        let config = state.config().read().await;
        validation::pagination(query.page, query.page_size, &config.pagination)
    };

    let search = query
        .search
        .as_deref()
        .map(validation::normalize_name)
        .filter(|s| !s.is_empty());

    let filter = CinemaFilter {
        page,
        page_size,
        city_ids,
        search,
    };

    let result = state
        .store()
        .list_cinemas(&filter)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list cinemas: {e}")))?;

    let items = result
        .items
        .into_iter()
        .map(|(cinema, city)| CinemaDto {
            id: cinema.id,
            name: cinema.name,
            city: city.map(|c| c.name).unwrap_or_default(),
            address: cinema.address,
            image: cinema.image,
        })
        .collect();

    Ok(Json(ApiResponse::success(Paginated {
        items,
        page,
        page_size,
        total_items: result.total_items,
        total_pages: result.total_pages,
    })))
}

/// GET /cinemas/{id}?date=YYYY-MM-DD
/// Cinema detail with upcoming showtimes for the requested date, grouped
/// movie -> language -> slots.
pub async fn get_cinema(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<CinemaDetailQuery>,
) -> Result<Json<ApiResponse<CinemaDetailDto>>, ApiError> {
    validation::validate_id(id, "cinema")?;
    let date = validation::parse_date_or_today(query.date.as_deref())?;

    let cinema = state
        .store()
        .get_cinema(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load cinema: {e}")))?
        .ok_or_else(|| ApiError::not_found("Cinema", id))?;

    let city = state
        .store()
        .get_city(cinema.city_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load city: {e}")))?
        .map(|c| c.name)
        .unwrap_or_default();

    let (day_start, day_end) = validation::day_window(date);
    let slot_rows = state
        .store()
        .slots_for_cinema_on_date(id, day_start, day_end, Utc::now())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load slots: {e}")))?;

    let movies = group_slots_by_movie(&state, &slot_rows).await?;

    Ok(Json(ApiResponse::success(CinemaDetailDto {
        id: cinema.id,
        name: cinema.name,
        city,
        address: cinema.address,
        image: cinema.image,
        rows: cinema.rows,
        seats_per_row: cinema.seats_per_row,
        movies,
    })))
}

pub async fn create_cinema(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CinemaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_staff()?;

    let input = cinema_input(payload)?;
    let cinema = state.catalog().create_cinema(input).await?;
    let dto = cinema_dto(&state, cinema).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

pub async fn update_cinema(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CinemaRequest>,
) -> Result<Json<ApiResponse<CinemaDto>>, ApiError> {
    user.require_staff()?;
    validation::validate_id(id, "cinema")?;

    let input = cinema_input(payload)?;
    let cinema = state.catalog().update_cinema(id, input).await?;
    let dto = cinema_dto(&state, cinema).await?;

    Ok(Json(ApiResponse::success(dto)))
}

// ============================================================================
// Helpers
// ============================================================================

fn cinema_input(payload: CinemaRequest) -> Result<CinemaInput, ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("Cinema name cannot be empty"));
    }

    let address = payload.address.trim().to_string();
    if address.is_empty() {
        return Err(ApiError::validation("Cinema address cannot be empty"));
    }

    validation::validate_id(payload.city, "city")?;

    Ok(CinemaInput {
        name,
        city_id: payload.city,
        address,
        rows: payload.rows,
        seats_per_row: payload.seats_per_row,
        image: payload.image,
    })
}

async fn cinema_dto(
    state: &Arc<AppState>,
    cinema: cinemas::Model,
) -> Result<CinemaDto, ApiError> {
    let city = state
        .store()
        .get_city(cinema.city_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load city: {e}")))?
        .map(|c| c.name)
        .unwrap_or_default();

    Ok(CinemaDto {
        id: cinema.id,
        name: cinema.name,
        city,
        address: cinema.address,
        image: cinema.image,
    })
}

/// Builds the movie -> language -> slots nesting for one cinema's slots,
/// preserving showtime order within each group.
pub(super) async fn group_slots_by_movie(
    state: &Arc<AppState>,
    slot_rows: &[slots::Model],
) -> Result<Vec<CinemaMovieGroupDto>, ApiError> {
    let movie_ids: Vec<i32> = {
        let mut seen = Vec::new();
        for slot in slot_rows {
            if !seen.contains(&slot.movie_id) {
                seen.push(slot.movie_id);
            }
        }
        seen
    };

    let movie_map: HashMap<i32, _> = state
        .store()
        .get_movies_by_ids(&movie_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load movies: {e}")))?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let language_ids: Vec<i32> = {
        let mut seen = Vec::new();
        for slot in slot_rows {
            if !seen.contains(&slot.language_id) {
                seen.push(slot.language_id);
            }
        }
        seen
    };

    let language_map: HashMap<i32, String> = state
        .store()
        .get_languages_by_ids(&language_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load languages: {e}")))?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect();

    let mut genres_by_movie: HashMap<i32, Vec<LookupDto>> = HashMap::new();
    for (movie_id, genre) in state
        .store()
        .genres_for_movies(&movie_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load genres: {e}")))?
    {
        genres_by_movie.entry(movie_id).or_default().push(LookupDto {
            id: genre.id,
            name: genre.name,
        });
    }

    let mut groups: Vec<CinemaMovieGroupDto> = Vec::new();

    for slot in slot_rows {
        let Some(movie) = movie_map.get(&slot.movie_id) else {
            continue;
        };

        let position = groups.iter().position(|g| g.movie.id == slot.movie_id);
        let index = match position {
            Some(index) => index,
            None => {
                groups.push(CinemaMovieGroupDto {
                    movie: MovieSummaryDto {
                        id: movie.id,
                        name: movie.name.clone(),
                        poster: movie.poster.clone(),
                        duration_minutes: movie.duration_minutes,
                        genres: genres_by_movie.get(&movie.id).cloned().unwrap_or_default(),
                    },
                    languages: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];

        let summary = SlotSummaryDto {
            id: slot.id,
            start_time: slot.start_time,
            price: slot.price,
        };

        if let Some(language) = group
            .languages
            .iter_mut()
            .find(|l| l.id == slot.language_id)
        {
            language.slots.push(summary);
        } else {
            group.languages.push(LanguageSlotsDto {
                id: slot.language_id,
                name: language_map
                    .get(&slot.language_id)
                    .cloned()
                    .unwrap_or_default(),
                slots: vec![summary],
            });
        }
    }

    Ok(groups)
}
