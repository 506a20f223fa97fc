use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "genres")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_genres::Entity")]
    MovieGenres,
}

impl Related<super::movie_genres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieGenres.def()
    }
}

impl Related<super::movies::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genres::Relation::Movies.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::movie_genres::Relation::Genres.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
