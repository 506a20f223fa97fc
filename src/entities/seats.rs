use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "seats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub cinema_id: i32,

    /// 1-based coordinates, bounded by the owning cinema's grid.
    pub row_number: i32,

    pub seat_number: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cinemas::Entity",
        from = "Column::CinemaId",
        to = "super::cinemas::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Cinemas,
    #[sea_orm(has_many = "super::tickets::Entity")]
    Tickets,
}

impl Related<super::cinemas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cinemas.def()
    }
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
