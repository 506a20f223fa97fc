use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored trimmed and lowercased; normalized at the API boundary.
    #[sea_orm(unique)]
    pub name: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cinemas::Entity")]
    Cinemas,
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::cinemas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cinemas.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
