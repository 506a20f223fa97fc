use crate::entities::{cinemas, cities, prelude::*, seats};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};

/// Seat rows are bulk-inserted in batches to stay clear of the sqlite
/// bind-parameter limit on large halls.
const SEAT_INSERT_CHUNK: usize = 500;

#[derive(Debug, Clone)]
pub struct CinemaFilter {
    pub page: u64,
    pub page_size: u64,
    pub city_ids: Vec<i32>,
    pub search: Option<String>,
}

#[derive(Debug)]
pub struct CinemaPage {
    pub items: Vec<(cinemas::Model, Option<cities::Model>)>,
    pub total_items: u64,
    pub total_pages: u64,
}

pub struct CinemaRepository {
    conn: DatabaseConnection,
}

impl CinemaRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the cinema and its full seat grid in one transaction, so a
    /// cinema can never exist with a partial grid.
    pub async fn create_with_seats(
        &self,
        cinema: cinemas::ActiveModel,
        grid: &[(i32, i32)],
    ) -> Result<cinemas::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let created = Cinemas::insert(cinema).exec_with_returning(&txn).await?;

        let seat_models: Vec<seats::ActiveModel> = grid
            .iter()
            .map(|&(row_number, seat_number)| seats::ActiveModel {
                cinema_id: Set(created.id),
                row_number: Set(row_number),
                seat_number: Set(seat_number),
                created_at: Set(now.clone()),
                ..Default::default()
            })
            .collect();

        for chunk in seat_models.chunks(SEAT_INSERT_CHUNK) {
            Seats::insert_many(chunk.to_vec()).exec(&txn).await?;
        }

        txn.commit().await?;

        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<Option<cinemas::Model>> {
        Ok(Cinemas::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<cinemas::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Cinemas::find()
            .filter(cinemas::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }

    pub async fn list(&self, filter: &CinemaFilter) -> Result<CinemaPage> {
        let mut query = Cinemas::find()
            .find_also_related(Cities)
            .order_by_asc(cinemas::Column::Name);

        if !filter.city_ids.is_empty() {
            query = query.filter(cinemas::Column::CityId.is_in(filter.city_ids.iter().copied()));
        }

        if let Some(term) = filter.search.as_deref() {
            query = query.filter(
                Condition::any()
                    .add(cinemas::Column::Name.contains(term))
                    .add(cities::Column::Name.contains(term)),
            );
        }

        let paginator = query.paginate(&self.conn, filter.page_size);
        let total_items = paginator.num_items().await?;
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(filter.page.saturating_sub(1)).await?;

        Ok(CinemaPage {
            items,
            total_items,
            total_pages,
        })
    }

    pub async fn update(&self, cinema: cinemas::ActiveModel) -> Result<cinemas::Model> {
        Ok(cinema.update(&self.conn).await?)
    }

    pub async fn location_exists(
        &self,
        name: &str,
        city_id: i32,
        address: &str,
        exclude: Option<i32>,
    ) -> Result<bool> {
        let mut query = Cinemas::find()
            .filter(cinemas::Column::Name.eq(name))
            .filter(cinemas::Column::CityId.eq(city_id))
            .filter(cinemas::Column::Address.eq(address));

        if let Some(id) = exclude {
            query = query.filter(cinemas::Column::Id.ne(id));
        }

        Ok(query.count(&self.conn).await? > 0)
    }

    pub async fn seats_for_cinema(&self, cinema_id: i32) -> Result<Vec<seats::Model>> {
        Ok(Seats::find()
            .filter(seats::Column::CinemaId.eq(cinema_id))
            .order_by_asc(seats::Column::RowNumber)
            .order_by_asc(seats::Column::SeatNumber)
            .all(&self.conn)
            .await?)
    }

    pub async fn seats_by_ids(&self, ids: &[i32]) -> Result<Vec<seats::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Seats::find()
            .filter(seats::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }
}
