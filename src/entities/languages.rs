use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "languages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_languages::Entity")]
    MovieLanguages,
    #[sea_orm(has_many = "super::slots::Entity")]
    Slots,
}

impl Related<super::movie_languages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieLanguages.def()
    }
}

impl Related<super::slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slots.def()
    }
}

impl Related<super::movies::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_languages::Relation::Movies.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::movie_languages::Relation::Languages.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
