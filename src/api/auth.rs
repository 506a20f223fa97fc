use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, StatusCode, request::Parts},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, UserProfileDto, validation};
use crate::entities::users;

const SESSION_USER_KEY: &str = "user_id";

/// Profile fields a client may change; everything else is rejected.
const PROFILE_WRITABLE_FIELDS: [&str; 3] = ["name", "phone_number", "city"];

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserProfileDto,
    pub api_key: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

// ============================================================================
// Authentication extractor
// ============================================================================

/// The authenticated caller, resolved from the session cookie first, then
/// from an `X-Api-Key` or `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: users::Model,
}

impl AuthUser {
    #[must_use]
    pub const fn id(&self) -> i32 {
        self.user.id
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.user.is_staff {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "This operation requires staff access",
            ))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Session first (fastest path for browser clients)
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(format!("Session layer error: {msg}")))?;

        if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await
            && let Ok(Some(user)) = state.store().get_user_by_id(user_id).await
        {
            tracing::Span::current().record("user_id", user.id);
            return Ok(Self { user });
        }

        if let Some(key) = extract_api_key(&parts.headers)
            && let Ok(Some(user)) = state.store().verify_api_key(&key).await
        {
            tracing::Span::current().record("user_id", user.id);
            return Ok(Self { user });
        }

        Err(ApiError::Unauthorized(
            "Authentication required".to_string(),
        ))
    }
}

/// Extract API key from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Check X-Api-Key header
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    // Check Authorization: Bearer header
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Register a new account; the session is created on success.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    let phone_number = match payload.phone_number.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(validation::validate_phone(raw)?),
    };

    let taken = state
        .store()
        .email_exists(&email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check email: {e}")))?;
    if taken {
        return Err(ApiError::validation(
            "A user with this email already exists",
        ));
    }

    let security = state.config().read().await.security.clone();

    let user = state
        .store()
        .create_user(name, &email, phone_number, &payload.password, &security)
        .await
        .map_err(|e| {
            if crate::db::Store::is_unique_violation(&e) {
                ApiError::validation("A user with this email already exists")
            } else {
                ApiError::internal(format!("Failed to create user: {e}"))
            }
        })?;

    if let Err(e) = session.insert(SESSION_USER_KEY, user.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::info!("New signup: {}", user.email);

    let profile = profile_dto(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

/// POST /auth/login
/// Authenticate with email and password, returns the profile and API key
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let email = validation::normalize_name(&payload.email);

    let user = state
        .store()
        .verify_user_password(&email, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if let Err(e) = session.insert(SESSION_USER_KEY, user.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    let api_key = user.api_key.clone();
    let profile = profile_dto(&state, &user).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user: profile,
        api_key,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let profile = profile_dto(&state, &user.user).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PATCH /profile
/// Partial update with a strict allow-list: any field outside
/// name/phone_number/city is rejected outright.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<Value>,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let Some(fields) = payload.as_object() else {
        return Err(ApiError::validation("Expected a JSON object"));
    };

    for key in fields.keys() {
        if !PROFILE_WRITABLE_FIELDS.contains(&key.as_str()) {
            return Err(ApiError::validation(format!(
                "This field is not allowed: {key}"
            )));
        }
    }

    let mut name_update: Option<Option<String>> = None;
    if let Some(value) = fields.get("name") {
        name_update = Some(match value {
            Value::Null => None,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            _ => return Err(ApiError::validation("name must be a string")),
        });
    }

    let mut phone_update: Option<Option<String>> = None;
    if let Some(value) = fields.get("phone_number") {
        phone_update = Some(match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(validation::validate_phone(s)?),
            _ => return Err(ApiError::validation("phone_number must be a string")),
        });
    }

    let mut city_update: Option<Option<i32>> = None;
    if let Some(value) = fields.get("city") {
        city_update = Some(match value {
            Value::Null => None,
            Value::Number(n) => {
                let city_id = n
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| ApiError::validation("city must be an integer ID"))?;
                validation::validate_id(city_id, "city")?;
                let exists = state
                    .store()
                    .get_city(city_id)
                    .await
                    .map_err(|e| ApiError::internal(format!("Failed to check city: {e}")))?
                    .is_some();
                if !exists {
                    return Err(ApiError::validation(format!("City {city_id} not found")));
                }
                Some(city_id)
            }
            _ => return Err(ApiError::validation("city must be an integer ID")),
        });
    }

    let updated = state
        .store()
        .update_user_profile(user.id(), name_update, phone_update, city_update)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update profile: {e}")))?;

    let profile = profile_dto(&state, &updated).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// POST /auth/api-key/regenerate
/// Generate a new random API key
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let new_api_key = state
        .store()
        .regenerate_user_api_key(user.id())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to regenerate API key: {e}")))?;

    tracing::info!("API key regenerated for user: {}", user.user.email);

    Ok(Json(ApiResponse::success(ApiKeyResponse {
        api_key: new_api_key,
    })))
}

// ============================================================================
// Helpers
// ============================================================================

async fn profile_dto(
    state: &Arc<AppState>,
    user: &users::Model,
) -> Result<UserProfileDto, ApiError> {
    let city = match user.city_id {
        Some(city_id) => state
            .store()
            .get_city(city_id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to load city: {e}")))?
            .map(|c| c.name),
        None => None,
    };

    Ok(UserProfileDto {
        name: user.name.clone(),
        email: user.email.clone(),
        phone_number: user.phone_number.clone(),
        city,
    })
}
