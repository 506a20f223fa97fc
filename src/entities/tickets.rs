use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub booking_id: i32,

    /// Denormalized from the booking so the occupancy constraint can live
    /// on this table: a partial unique index over (slot_id, seat_id)
    /// WHERE active.
    pub slot_id: i32,

    pub seat_id: i32,

    /// Mirrors the booking status; flipped off on cancellation so the
    /// seat leaves the occupancy set while the row stays for history.
    pub active: bool,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bookings,
    #[sea_orm(
        belongs_to = "super::slots::Entity",
        from = "Column::SlotId",
        to = "super::slots::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Slots,
    #[sea_orm(
        belongs_to = "super::seats::Entity",
        from = "Column::SeatId",
        to = "super::seats::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Seats,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::slots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slots.def()
    }
}

impl Related<super::seats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
