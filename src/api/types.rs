use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Cities, genres and languages all render the same way.
#[derive(Debug, Serialize, Clone)]
pub struct LookupDto {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct CinemaDto {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub address: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CinemaDetailDto {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub address: String,
    pub image: Option<String>,
    pub rows: i32,
    pub seats_per_row: i32,
    pub movies: Vec<CinemaMovieGroupDto>,
}

/// One movie screened at a cinema, with its slots grouped by language.
#[derive(Debug, Serialize)]
pub struct CinemaMovieGroupDto {
    pub movie: MovieSummaryDto,
    pub languages: Vec<LanguageSlotsDto>,
}

#[derive(Debug, Serialize, Clone)]
pub struct MovieSummaryDto {
    pub id: i32,
    pub name: String,
    pub poster: Option<String>,
    pub duration_minutes: i32,
    pub genres: Vec<LookupDto>,
}

#[derive(Debug, Serialize)]
pub struct LanguageSlotsDto {
    pub id: i32,
    pub name: String,
    pub slots: Vec<SlotSummaryDto>,
}

#[derive(Debug, Serialize)]
pub struct SlotSummaryDto {
    pub id: i32,
    pub start_time: DateTime<Utc>,
    pub price: i64,
}

#[derive(Debug, Serialize)]
pub struct MovieDto {
    pub id: i32,
    pub name: String,
    pub duration_minutes: i32,
    pub release_date: NaiveDate,
    pub poster: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieDetailDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub duration_minutes: i32,
    pub release_date: NaiveDate,
    pub poster: Option<String>,
    pub genres: Vec<LookupDto>,
    pub languages: Vec<LookupDto>,
    pub cinemas: Vec<MovieCinemaGroupDto>,
}

/// One cinema screening a movie, with its slots grouped by language.
#[derive(Debug, Serialize)]
pub struct MovieCinemaGroupDto {
    pub cinema: CinemaDto,
    pub languages: Vec<LanguageSlotsDto>,
}

#[derive(Debug, Serialize)]
pub struct SlotDetailDto {
    pub id: i32,
    pub price: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub movie: MovieDto,
    pub cinema: CinemaDto,
    pub language: LookupDto,
    pub seats: Vec<SeatAvailabilityDto>,
}

#[derive(Debug, Serialize)]
pub struct SeatAvailabilityDto {
    pub id: i32,
    pub row: i32,
    pub number: i32,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingDto {
    pub id: i32,
    pub status: String,
    pub movie: String,
    pub language: String,
    pub cinema_name: String,
    pub cinema_address: String,
    pub cinema_city: String,
    pub start_time: DateTime<Utc>,
    pub tickets: Vec<TicketDto>,
}

#[derive(Debug, Serialize)]
pub struct TicketDto {
    pub row: i32,
    pub column: i32,
}

#[derive(Debug, Serialize)]
pub struct UserProfileDto {
    pub name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub city: Option<String>,
}
