use crate::entities::{cities, genres, languages, prelude::*};
use anyhow::Result;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Repository for the lookup entities: cities, genres, languages.
///
/// Names arrive here already normalized (trimmed, lowercased) by the API
/// boundary.
pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Cities
    // ========================================================================

    pub async fn list_cities(&self, search: Option<&str>) -> Result<Vec<cities::Model>> {
        let mut query = Cities::find().order_by_asc(cities::Column::Name);

        if let Some(term) = search {
            query = query.filter(cities::Column::Name.contains(term));
        }

        Ok(query.all(&self.conn).await?)
    }

    pub async fn get_city(&self, id: i32) -> Result<Option<cities::Model>> {
        Ok(Cities::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_cities_by_ids(&self, ids: &[i32]) -> Result<Vec<cities::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Cities::find()
            .filter(cities::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }

    pub async fn insert_city(&self, name: &str) -> Result<cities::Model> {
        let model = cities::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Ok(Cities::insert(model)
            .exec_with_returning(&self.conn)
            .await?)
    }

    pub async fn city_name_exists(&self, name: &str) -> Result<bool> {
        let count = Cities::find()
            .filter(cities::Column::Name.eq(name))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    // ========================================================================
    // Genres
    // ========================================================================

    pub async fn list_genres(&self) -> Result<Vec<genres::Model>> {
        Ok(Genres::find()
            .order_by_asc(genres::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn insert_genre(&self, name: &str) -> Result<genres::Model> {
        let model = genres::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Ok(Genres::insert(model)
            .exec_with_returning(&self.conn)
            .await?)
    }

    pub async fn genre_name_exists(&self, name: &str) -> Result<bool> {
        let count = Genres::find()
            .filter(genres::Column::Name.eq(name))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn existing_genre_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = Genres::find()
            .filter(genres::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(|g| g.id).collect())
    }

    // ========================================================================
    // Languages
    // ========================================================================

    pub async fn list_languages(&self) -> Result<Vec<languages::Model>> {
        Ok(Languages::find()
            .order_by_asc(languages::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn get_languages_by_ids(&self, ids: &[i32]) -> Result<Vec<languages::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Languages::find()
            .filter(languages::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?)
    }

    pub async fn insert_language(&self, name: &str) -> Result<languages::Model> {
        let model = languages::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Ok(Languages::insert(model)
            .exec_with_returning(&self.conn)
            .await?)
    }

    pub async fn language_name_exists(&self, name: &str) -> Result<bool> {
        let count = Languages::find()
            .filter(languages::Column::Name.eq(name))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn existing_language_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = Languages::find()
            .filter(languages::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(|l| l.id).collect())
    }
}
