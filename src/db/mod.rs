use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{bookings, cinemas, cities, genres, languages, movies, seats, slots, tickets, users};

pub mod migrator;
pub mod repositories;

pub use repositories::booking::BookingWrite;
pub use repositories::cinema::{CinemaFilter, CinemaPage};
pub use repositories::movie::{MovieFilter, MoviePage};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory sqlite would see its own
        // empty database, so the pool is pinned to a single connection.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// True when `err` wraps a database unique-constraint violation. Used
    /// to translate races that slip past an optimistic check into the
    /// same user-facing error the check would have produced.
    #[must_use]
    pub fn is_unique_violation(err: &anyhow::Error) -> bool {
        err.downcast_ref::<sea_orm::DbErr>()
            .and_then(sea_orm::DbErr::sql_err)
            .is_some_and(|e| matches!(e, sea_orm::SqlErr::UniqueConstraintViolation(_)))
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    fn cinema_repo(&self) -> repositories::cinema::CinemaRepository {
        repositories::cinema::CinemaRepository::new(self.conn.clone())
    }

    fn movie_repo(&self) -> repositories::movie::MovieRepository {
        repositories::movie::MovieRepository::new(self.conn.clone())
    }

    fn slot_repo(&self) -> repositories::slot::SlotRepository {
        repositories::slot::SlotRepository::new(self.conn.clone())
    }

    fn booking_repo(&self) -> repositories::booking::BookingRepository {
        repositories::booking::BookingRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Catalog ==========

    pub async fn list_cities(&self, search: Option<&str>) -> Result<Vec<cities::Model>> {
        self.catalog_repo().list_cities(search).await
    }

    pub async fn get_city(&self, id: i32) -> Result<Option<cities::Model>> {
        self.catalog_repo().get_city(id).await
    }

    pub async fn get_cities_by_ids(&self, ids: &[i32]) -> Result<Vec<cities::Model>> {
        self.catalog_repo().get_cities_by_ids(ids).await
    }

    pub async fn insert_city(&self, name: &str) -> Result<cities::Model> {
        self.catalog_repo().insert_city(name).await
    }

    pub async fn city_name_exists(&self, name: &str) -> Result<bool> {
        self.catalog_repo().city_name_exists(name).await
    }

    pub async fn list_genres(&self) -> Result<Vec<genres::Model>> {
        self.catalog_repo().list_genres().await
    }

    pub async fn insert_genre(&self, name: &str) -> Result<genres::Model> {
        self.catalog_repo().insert_genre(name).await
    }

    pub async fn genre_name_exists(&self, name: &str) -> Result<bool> {
        self.catalog_repo().genre_name_exists(name).await
    }

    pub async fn existing_genre_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.catalog_repo().existing_genre_ids(ids).await
    }

    pub async fn list_languages(&self) -> Result<Vec<languages::Model>> {
        self.catalog_repo().list_languages().await
    }

    pub async fn get_languages_by_ids(&self, ids: &[i32]) -> Result<Vec<languages::Model>> {
        self.catalog_repo().get_languages_by_ids(ids).await
    }

    pub async fn insert_language(&self, name: &str) -> Result<languages::Model> {
        self.catalog_repo().insert_language(name).await
    }

    pub async fn language_name_exists(&self, name: &str) -> Result<bool> {
        self.catalog_repo().language_name_exists(name).await
    }

    pub async fn existing_language_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.catalog_repo().existing_language_ids(ids).await
    }

    // ========== Cinemas & seats ==========

    pub async fn create_cinema_with_seats(
        &self,
        cinema: cinemas::ActiveModel,
        grid: &[(i32, i32)],
    ) -> Result<cinemas::Model> {
        self.cinema_repo().create_with_seats(cinema, grid).await
    }

    pub async fn get_cinema(&self, id: i32) -> Result<Option<cinemas::Model>> {
        self.cinema_repo().get(id).await
    }

    pub async fn get_cinemas_by_ids(&self, ids: &[i32]) -> Result<Vec<cinemas::Model>> {
        self.cinema_repo().get_by_ids(ids).await
    }

    pub async fn list_cinemas(&self, filter: &CinemaFilter) -> Result<CinemaPage> {
        self.cinema_repo().list(filter).await
    }

    pub async fn update_cinema(&self, cinema: cinemas::ActiveModel) -> Result<cinemas::Model> {
        self.cinema_repo().update(cinema).await
    }

    pub async fn cinema_location_exists(
        &self,
        name: &str,
        city_id: i32,
        address: &str,
        exclude: Option<i32>,
    ) -> Result<bool> {
        self.cinema_repo()
            .location_exists(name, city_id, address, exclude)
            .await
    }

    pub async fn seats_for_cinema(&self, cinema_id: i32) -> Result<Vec<seats::Model>> {
        self.cinema_repo().seats_for_cinema(cinema_id).await
    }

    pub async fn seats_by_ids(&self, ids: &[i32]) -> Result<Vec<seats::Model>> {
        self.cinema_repo().seats_by_ids(ids).await
    }

    // ========== Movies ==========

    pub async fn create_movie(
        &self,
        movie: movies::ActiveModel,
        genre_ids: &[i32],
        language_ids: &[i32],
    ) -> Result<movies::Model> {
        self.movie_repo()
            .create(movie, genre_ids, language_ids)
            .await
    }

    pub async fn get_movie(&self, id: i32) -> Result<Option<movies::Model>> {
        self.movie_repo().get(id).await
    }

    pub async fn get_movies_by_ids(&self, ids: &[i32]) -> Result<Vec<movies::Model>> {
        self.movie_repo().get_by_ids(ids).await
    }

    pub async fn movie_name_exists(&self, name: &str) -> Result<bool> {
        self.movie_repo().name_exists(name).await
    }

    pub async fn list_movies(&self, filter: &MovieFilter) -> Result<MoviePage> {
        self.movie_repo().list(filter).await
    }

    pub async fn genres_for_movies(
        &self,
        movie_ids: &[i32],
    ) -> Result<Vec<(i32, genres::Model)>> {
        self.movie_repo().genres_for_movies(movie_ids).await
    }

    pub async fn languages_for_movies(
        &self,
        movie_ids: &[i32],
    ) -> Result<Vec<(i32, languages::Model)>> {
        self.movie_repo().languages_for_movies(movie_ids).await
    }

    pub async fn language_ids_for_movie(&self, movie_id: i32) -> Result<Vec<i32>> {
        self.movie_repo().language_ids_for_movie(movie_id).await
    }

    // ========== Slots ==========

    pub async fn insert_slot(&self, slot: slots::ActiveModel) -> Result<slots::Model> {
        self.slot_repo().insert(slot).await
    }

    pub async fn update_slot(&self, slot: slots::ActiveModel) -> Result<slots::Model> {
        self.slot_repo().update(slot).await
    }

    pub async fn get_slot(&self, id: i32) -> Result<Option<slots::Model>> {
        self.slot_repo().get(id).await
    }

    pub async fn get_slots_by_ids(&self, ids: &[i32]) -> Result<Vec<slots::Model>> {
        self.slot_repo().get_by_ids(ids).await
    }

    pub async fn slot_overlap_exists(
        &self,
        cinema_id: i32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude: Option<i32>,
    ) -> Result<bool> {
        self.slot_repo()
            .overlap_exists(cinema_id, start_time, end_time, exclude)
            .await
    }

    pub async fn slots_for_cinema_on_date(
        &self,
        cinema_id: i32,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<slots::Model>> {
        self.slot_repo()
            .for_cinema_on_date(cinema_id, day_start, day_end, now)
            .await
    }

    pub async fn slots_for_movie_on_date(
        &self,
        movie_id: i32,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        now: DateTime<Utc>,
        city_id: Option<i32>,
    ) -> Result<Vec<slots::Model>> {
        self.slot_repo()
            .for_movie_on_date(movie_id, day_start, day_end, now, city_id)
            .await
    }

    // ========== Bookings & tickets ==========

    pub async fn occupied_seat_ids(&self, slot_id: i32, seat_ids: &[i32]) -> Result<Vec<i32>> {
        self.booking_repo().occupied_seat_ids(slot_id, seat_ids).await
    }

    pub async fn active_seat_ids_for_slot(&self, slot_id: i32) -> Result<Vec<i32>> {
        self.booking_repo().active_seat_ids_for_slot(slot_id).await
    }

    pub async fn create_booking_with_tickets(&self, write: BookingWrite<'_>) -> Result<bookings::Model> {
        self.booking_repo().create_with_tickets(write).await
    }

    pub async fn get_booking_for_user(
        &self,
        user_id: i32,
        booking_id: i32,
    ) -> Result<Option<bookings::Model>> {
        self.booking_repo().get_for_user(user_id, booking_id).await
    }

    pub async fn list_bookings_for_user(&self, user_id: i32) -> Result<Vec<bookings::Model>> {
        self.booking_repo().list_for_user(user_id).await
    }

    pub async fn tickets_for_bookings(
        &self,
        booking_ids: &[i32],
    ) -> Result<Vec<(tickets::Model, Option<seats::Model>)>> {
        self.booking_repo().tickets_for_bookings(booking_ids).await
    }

    pub async fn cancel_booking(&self, booking_id: i32) -> Result<bookings::Model> {
        self.booking_repo().cancel(booking_id).await
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        name: Option<String>,
        email: &str,
        phone_number: Option<String>,
        password: &str,
        security: &crate::config::SecurityConfig,
    ) -> Result<users::Model> {
        self.user_repo()
            .create(name, email, phone_number, password, security)
            .await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_profile(
        &self,
        user_id: i32,
        name: Option<Option<String>>,
        phone_number: Option<Option<String>>,
        city_id: Option<Option<i32>>,
    ) -> Result<users::Model> {
        self.user_repo()
            .update_profile(user_id, name, phone_number, city_id)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<users::Model>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, user_id: i32) -> Result<String> {
        self.user_repo().regenerate_api_key(user_id).await
    }
}
