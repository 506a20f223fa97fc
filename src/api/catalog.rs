use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, LookupDto, validation};

#[derive(Deserialize)]
pub struct CitiesQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateLookupRequest {
    name: String,
}

pub async fn list_languages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LookupDto>>>, ApiError> {
    let languages = state
        .store()
        .list_languages()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list languages: {e}")))?;

    let dtos = languages
        .into_iter()
        .map(|l| LookupDto {
            id: l.id,
            name: l.name,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LookupDto>>>, ApiError> {
    let genres = state
        .store()
        .list_genres()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list genres: {e}")))?;

    let dtos = genres
        .into_iter()
        .map(|g| LookupDto {
            id: g.id,
            name: g.name,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn list_cities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CitiesQuery>,
) -> Result<Json<ApiResponse<Vec<LookupDto>>>, ApiError> {
    // Names are stored normalized, so the search term gets the same
    // treatment before matching.
    let search = query
        .search
        .as_deref()
        .map(validation::normalize_name)
        .filter(|s| !s.is_empty());

    let cities = state
        .store()
        .list_cities(search.as_deref())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list cities: {e}")))?;

    let dtos = cities
        .into_iter()
        .map(|c| LookupDto {
            id: c.id,
            name: c.name,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn create_city(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateLookupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_staff()?;

    let name = validation::validate_required_name(&payload.name, "City")?;
    let city = state.catalog().create_city(&name).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LookupDto {
            id: city.id,
            name: city.name,
        })),
    ))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateLookupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_staff()?;

    let name = validation::validate_required_name(&payload.name, "Genre")?;
    let genre = state.catalog().create_genre(&name).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LookupDto {
            id: genre.id,
            name: genre.name,
        })),
    ))
}

pub async fn create_language(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateLookupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_staff()?;

    let name = validation::validate_required_name(&payload.name, "Language")?;
    let language = state.catalog().create_language(&name).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LookupDto {
            id: language.id,
            name: language.name,
        })),
    ))
}
