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
    ApiError, ApiResponse, AppState, CinemaDto, LanguageSlotsDto, LookupDto, MovieCinemaGroupDto,
    MovieDetailDto, MovieDto, Paginated, SlotSummaryDto, validation,
};
use crate::db::MovieFilter;
use crate::services::catalog::MovieInput;

#[derive(Deserialize)]
pub struct MoviesQuery {
    genres: Option<String>,
    languages: Option<String>,
    cinemas: Option<String>,
    latest_days: Option<i64>,
    date: Option<String>,
    page: Option<u64>,
    page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct MovieDetailQuery {
    date: Option<String>,
    city: Option<i32>,
}

#[derive(Deserialize)]
pub struct MovieRequest {
    pub name: String,
    pub description: String,
    pub duration_minutes: i32,
    pub release_date: chrono::NaiveDate,
    pub poster: Option<String>,
    pub genres: Vec<i32>,
    pub languages: Vec<i32>,
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MoviesQuery>,
) -> Result<Json<ApiResponse<Paginated<MovieDto>>>, ApiError> {
    let genre_ids = validation::parse_id_list(query.genres.as_deref(), "genre")?;
    let language_ids = validation::parse_id_list(query.languages.as_deref(), "language")?;
    let cinema_ids = validation::parse_id_list(query.cinemas.as_deref(), "cinema")?;

    let (page, page_size) = {
        let config = state.config().read().await;
        validation::pagination(query.page, query.page_size, &config.pagination)
    };

    // `latest_days` narrows to recent releases; non-positive values are
    // ignored, matching the lenient filter this replaces.
    let released_after = query
        .latest_days
        .filter(|&days| days > 0)
        .map(|days| Utc::now().date_naive() - chrono::Duration::days(days));

    let slot_window = match query.date.as_deref() {
        Some(raw) => {
            let date = validation::parse_date_or_today(Some(raw))?;
            Some(validation::day_window(date))
        }
        None => None,
    };

    let filter = MovieFilter {
        page,
        page_size,
        genre_ids,
        language_ids,
        cinema_ids,
        released_after,
        slot_window,
    };

    let result = state
        .store()
        .list_movies(&filter)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list movies: {e}")))?;

    let items = result
        .items
        .into_iter()
        .map(|m| MovieDto {
            id: m.id,
            name: m.name,
            duration_minutes: m.duration_minutes,
            release_date: m.release_date,
            poster: m.poster,
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

/// GET /movies/{id}?date=&city=
/// Movie detail with upcoming showtimes for the requested date, grouped
/// cinema -> language -> slots, optionally narrowed to one city.
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<MovieDetailQuery>,
) -> Result<Json<ApiResponse<MovieDetailDto>>, ApiError> {
    validation::validate_id(id, "movie")?;
    let date = validation::parse_date_or_today(query.date.as_deref())?;

    let city_filter = match query.city {
        Some(city) => Some(validation::validate_id(city, "city")?),
        None => None,
    };

    let movie = state
        .store()
        .get_movie(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load movie: {e}")))?
        .ok_or_else(|| ApiError::not_found("Movie", id))?;

    let genres: Vec<LookupDto> = state
        .store()
        .genres_for_movies(&[id])
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load genres: {e}")))?
        .into_iter()
        .map(|(_, g)| LookupDto {
            id: g.id,
            name: g.name,
        })
        .collect();

    let languages: Vec<LookupDto> = state
        .store()
        .languages_for_movies(&[id])
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load languages: {e}")))?
        .into_iter()
        .map(|(_, l)| LookupDto {
            id: l.id,
            name: l.name,
        })
        .collect();

    let (day_start, day_end) = validation::day_window(date);
    let slot_rows = state
        .store()
        .slots_for_movie_on_date(id, day_start, day_end, Utc::now(), city_filter)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load slots: {e}")))?;

    let cinemas = group_slots_by_cinema(&state, &slot_rows).await?;

    Ok(Json(ApiResponse::success(MovieDetailDto {
        id: movie.id,
        name: movie.name,
        description: movie.description,
        duration_minutes: movie.duration_minutes,
        release_date: movie.release_date,
        poster: movie.poster,
        genres,
        languages,
        cinemas,
    })))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<MovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_staff()?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("Movie name cannot be empty"));
    }

    for genre in &payload.genres {
        validation::validate_id(*genre, "genre")?;
    }
    for language in &payload.languages {
        validation::validate_id(*language, "language")?;
    }

    let movie = state
        .catalog()
        .create_movie(MovieInput {
            name,
            description: payload.description.trim().to_string(),
            duration_minutes: payload.duration_minutes,
            release_date: payload.release_date,
            poster: payload.poster,
            genre_ids: payload.genres,
            language_ids: payload.languages,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MovieDto {
            id: movie.id,
            name: movie.name,
            duration_minutes: movie.duration_minutes,
            release_date: movie.release_date,
            poster: movie.poster,
        })),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Builds the cinema -> language -> slots nesting for one movie's slots.
async fn group_slots_by_cinema(
    state: &Arc<AppState>,
    slot_rows: &[crate::entities::slots::Model],
) -> Result<Vec<MovieCinemaGroupDto>, ApiError> {
    let cinema_ids: Vec<i32> = {
        let mut seen = Vec::new();
        for slot in slot_rows {
            if !seen.contains(&slot.cinema_id) {
                seen.push(slot.cinema_id);
            }
        }
        seen
    };

    let cinema_rows = state
        .store()
        .get_cinemas_by_ids(&cinema_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load cinemas: {e}")))?;

    let city_ids: Vec<i32> = {
        let mut seen = Vec::new();
        for cinema in &cinema_rows {
            if !seen.contains(&cinema.city_id) {
                seen.push(cinema.city_id);
            }
        }
        seen
    };

    let city_map: HashMap<i32, String> = state
        .store()
        .get_cities_by_ids(&city_ids)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load cities: {e}")))?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let cinema_map: HashMap<i32, CinemaDto> = cinema_rows
        .into_iter()
        .map(|c| {
            let city = city_map.get(&c.city_id).cloned().unwrap_or_default();
            (
                c.id,
                CinemaDto {
                    id: c.id,
                    name: c.name,
                    city,
                    address: c.address,
                    image: c.image,
                },
            )
        })
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

    let mut groups: Vec<MovieCinemaGroupDto> = Vec::new();

    for slot in slot_rows {
        let Some(cinema) = cinema_map.get(&slot.cinema_id) else {
            continue;
        };

        let position = groups.iter().position(|g| g.cinema.id == slot.cinema_id);
        let index = match position {
            Some(index) => index,
            None => {
                groups.push(MovieCinemaGroupDto {
                    cinema: cinema.clone(),
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
