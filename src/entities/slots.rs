use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub price: i64,

    pub start_time: DateTimeUtc,

    /// Always after `start_time`; the scheduling gate rejects anything else.
    pub end_time: DateTimeUtc,

    pub movie_id: i32,

    pub cinema_id: i32,

    pub language_id: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movies::Entity",
        from = "Column::MovieId",
        to = "super::movies::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Movies,
    #[sea_orm(
        belongs_to = "super::cinemas::Entity",
        from = "Column::CinemaId",
        to = "super::cinemas::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Cinemas,
    #[sea_orm(
        belongs_to = "super::languages::Entity",
        from = "Column::LanguageId",
        to = "super::languages::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Languages,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::tickets::Entity")]
    Tickets,
}

impl Related<super::movies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movies.def()
    }
}

impl Related<super::cinemas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cinemas.def()
    }
}

impl Related<super::languages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Languages.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
