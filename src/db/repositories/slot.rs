use crate::entities::{cinemas, prelude::*, slots};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

pub struct SlotRepository {
    conn: DatabaseConnection,
}

impl SlotRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, slot: slots::ActiveModel) -> Result<slots::Model> {
        Ok(Slots::insert(slot).exec_with_returning(&self.conn).await?)
    }

    pub async fn update(&self, slot: slots::ActiveModel) -> Result<slots::Model> {
        Ok(slot.update(&self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<Option<slots::Model>> {
        Ok(Slots::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<slots::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Slots::find()
            .filter(slots::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }

    /// Half-open interval overlap against every other slot in the same
    /// cinema: existing.start < new.end AND existing.end > new.start.
    pub async fn overlap_exists(
        &self,
        cinema_id: i32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude: Option<i32>,
    ) -> Result<bool> {
        let mut query = Slots::find()
            .filter(slots::Column::CinemaId.eq(cinema_id))
            .filter(slots::Column::StartTime.lt(end_time))
            .filter(slots::Column::EndTime.gt(start_time));

        if let Some(id) = exclude {
            query = query.filter(slots::Column::Id.ne(id));
        }

        Ok(query.count(&self.conn).await? > 0)
    }

    /// Upcoming slots of one cinema inside a day window, ordered by start.
    pub async fn for_cinema_on_date(
        &self,
        cinema_id: i32,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<slots::Model>> {
        Ok(Slots::find()
            .filter(slots::Column::CinemaId.eq(cinema_id))
            .filter(slots::Column::StartTime.gte(day_start))
            .filter(slots::Column::StartTime.lt(day_end))
            .filter(slots::Column::StartTime.gt(now))
            .order_by_asc(slots::Column::StartTime)
            .all(&self.conn)
            .await?)
    }

    /// Upcoming slots of one movie inside a day window, optionally limited
    /// to cinemas of one city.
    pub async fn for_movie_on_date(
        &self,
        movie_id: i32,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        now: DateTime<Utc>,
        city_id: Option<i32>,
    ) -> Result<Vec<slots::Model>> {
        let mut query = Slots::find()
            .filter(slots::Column::MovieId.eq(movie_id))
            .filter(slots::Column::StartTime.gte(day_start))
            .filter(slots::Column::StartTime.lt(day_end))
            .filter(slots::Column::StartTime.gt(now))
            .order_by_asc(slots::Column::StartTime);

        if let Some(city) = city_id {
            query = query
                .join(JoinType::InnerJoin, slots::Relation::Cinemas.def())
                .filter(cinemas::Column::CityId.eq(city));
        }

        Ok(query.all(&self.conn).await?)
    }
}
