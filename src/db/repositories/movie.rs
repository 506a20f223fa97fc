use crate::entities::{genres, languages, movie_genres, movie_languages, movies, prelude::*, slots};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub page: u64,
    pub page_size: u64,
    pub genre_ids: Vec<i32>,
    pub language_ids: Vec<i32>,
    pub cinema_ids: Vec<i32>,
    /// Only movies released on or after this date (the `latest_days`
    /// query parameter, resolved by the caller).
    pub released_after: Option<NaiveDate>,
    /// Only movies with a slot inside this half-open window.
    pub slot_window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

#[derive(Debug)]
pub struct MoviePage {
    pub items: Vec<movies::Model>,
    pub total_items: u64,
    pub total_pages: u64,
}

pub struct MovieRepository {
    conn: DatabaseConnection,
}

impl MovieRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the movie and its genre/language junction rows in one
    /// transaction.
    pub async fn create(
        &self,
        movie: movies::ActiveModel,
        genre_ids: &[i32],
        language_ids: &[i32],
    ) -> Result<movies::Model> {
        let txn = self.conn.begin().await?;

        let created = Movies::insert(movie).exec_with_returning(&txn).await?;

        if !genre_ids.is_empty() {
            let rows: Vec<movie_genres::ActiveModel> = genre_ids
                .iter()
                .map(|&genre_id| movie_genres::ActiveModel {
                    movie_id: Set(created.id),
                    genre_id: Set(genre_id),
                })
                .collect();
            MovieGenres::insert_many(rows).exec(&txn).await?;
        }

        if !language_ids.is_empty() {
            let rows: Vec<movie_languages::ActiveModel> = language_ids
                .iter()
                .map(|&language_id| movie_languages::ActiveModel {
                    movie_id: Set(created.id),
                    language_id: Set(language_id),
                })
                .collect();
            MovieLanguages::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;

        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<Option<movies::Model>> {
        Ok(Movies::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<movies::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Movies::find()
            .filter(movies::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }

    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let count = Movies::find()
            .filter(movies::Column::Name.eq(name))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn list(&self, filter: &MovieFilter) -> Result<MoviePage> {
        let mut query = Movies::find().order_by_asc(movies::Column::Name);

        if !filter.genre_ids.is_empty() {
            query = query
                .join(JoinType::InnerJoin, movies::Relation::MovieGenres.def())
                .filter(movie_genres::Column::GenreId.is_in(filter.genre_ids.iter().copied()));
        }

        if !filter.language_ids.is_empty() {
            query = query
                .join(JoinType::InnerJoin, movies::Relation::MovieLanguages.def())
                .filter(
                    movie_languages::Column::LanguageId.is_in(filter.language_ids.iter().copied()),
                );
        }

        if !filter.cinema_ids.is_empty() || filter.slot_window.is_some() {
            query = query.join(JoinType::InnerJoin, movies::Relation::Slots.def());

            if !filter.cinema_ids.is_empty() {
                query =
                    query.filter(slots::Column::CinemaId.is_in(filter.cinema_ids.iter().copied()));
            }

            if let Some((window_start, window_end)) = filter.slot_window {
                query = query
                    .filter(slots::Column::StartTime.gte(window_start))
                    .filter(slots::Column::StartTime.lt(window_end));
            }
        }

        if let Some(date_from) = filter.released_after {
            query = query.filter(movies::Column::ReleaseDate.gte(date_from));
        }

        // Joins can fan out to one row per slot or junction row.
        let query = query.distinct();

        let paginator = query.paginate(&self.conn, filter.page_size);
        let total_items = paginator.num_items().await?;
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(filter.page.saturating_sub(1)).await?;

        Ok(MoviePage {
            items,
            total_items,
            total_pages,
        })
    }

    pub async fn genres_for_movies(&self, movie_ids: &[i32]) -> Result<Vec<(i32, genres::Model)>> {
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = MovieGenres::find()
            .filter(movie_genres::Column::MovieId.is_in(movie_ids.iter().copied()))
            .find_also_related(Genres)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, genre)| genre.map(|g| (link.movie_id, g)))
            .collect())
    }

    pub async fn languages_for_movies(
        &self,
        movie_ids: &[i32],
    ) -> Result<Vec<(i32, languages::Model)>> {
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = MovieLanguages::find()
            .filter(movie_languages::Column::MovieId.is_in(movie_ids.iter().copied()))
            .find_also_related(Languages)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, language)| language.map(|l| (link.movie_id, l)))
            .collect())
    }

    pub async fn language_ids_for_movie(&self, movie_id: i32) -> Result<Vec<i32>> {
        let rows = MovieLanguages::find()
            .filter(movie_languages::Column::MovieId.eq(movie_id))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|r| r.language_id).collect())
    }
}
