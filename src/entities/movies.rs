use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub description: String,

    /// Running time in whole minutes.
    pub duration_minutes: i32,

    pub release_date: Date,

    /// Poster path or URL; upload handling lives outside this service.
    pub poster: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::slots::Entity")]
    Slots,
    #[sea_orm(has_many = "super::movie_genres::Entity")]
    MovieGenres,
    #[sea_orm(has_many = "super::movie_languages::Entity")]
    MovieLanguages,
}

impl Related<super::slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slots.def()
    }
}

impl Related<super::movie_genres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieGenres.def()
    }
}

impl Related<super::movie_languages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieLanguages.def()
    }
}

impl Related<super::genres::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genres::Relation::Genres.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::movie_genres::Relation::Movies.def().rev())
    }
}

impl Related<super::languages::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_languages::Relation::Languages.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::movie_languages::Relation::Movies.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
