use crate::entities::bookings::BookingStatus;
use crate::entities::{bookings, prelude::*, seats, tickets};
use anyhow::Result;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, sea_query::Expr,
};

/// Everything needed to persist one booking with its seat associations.
#[derive(Debug, Clone, Copy)]
pub struct BookingWrite<'a> {
    pub user_id: i32,
    pub slot_id: i32,
    pub seat_ids: &'a [i32],
}

pub struct BookingRepository {
    conn: DatabaseConnection,
}

impl BookingRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Seat ids among `seat_ids` that already hold an active ticket for
    /// the slot, across all users.
    pub async fn occupied_seat_ids(&self, slot_id: i32, seat_ids: &[i32]) -> Result<Vec<i32>> {
        if seat_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Tickets::find()
            .filter(tickets::Column::SlotId.eq(slot_id))
            .filter(tickets::Column::Active.eq(true))
            .filter(tickets::Column::SeatId.is_in(seat_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|t| t.seat_id).collect())
    }

    /// The full occupancy set of a slot, for the availability grid.
    pub async fn active_seat_ids_for_slot(&self, slot_id: i32) -> Result<Vec<i32>> {
        let rows = Tickets::find()
            .filter(tickets::Column::SlotId.eq(slot_id))
            .filter(tickets::Column::Active.eq(true))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|t| t.seat_id).collect())
    }

    /// Persists the booking row plus one ticket per seat as a single
    /// transaction. A seat raced away between the occupancy check and
    /// this insert trips the partial unique index, the transaction rolls
    /// back whole, and the violation surfaces to the caller.
    pub async fn create_with_tickets(&self, write: BookingWrite<'_>) -> Result<bookings::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let booking = Bookings::insert(bookings::ActiveModel {
            user_id: Set(write.user_id),
            slot_id: Set(write.slot_id),
            status: Set(BookingStatus::Booked),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        })
        .exec_with_returning(&txn)
        .await?;

        let ticket_rows: Vec<tickets::ActiveModel> = write
            .seat_ids
            .iter()
            .map(|&seat_id| tickets::ActiveModel {
                booking_id: Set(booking.id),
                slot_id: Set(write.slot_id),
                seat_id: Set(seat_id),
                active: Set(true),
                created_at: Set(now.clone()),
                ..Default::default()
            })
            .collect();

        Tickets::insert_many(ticket_rows).exec(&txn).await?;

        txn.commit().await?;

        Ok(booking)
    }

    pub async fn get_for_user(
        &self,
        user_id: i32,
        booking_id: i32,
    ) -> Result<Option<bookings::Model>> {
        Ok(Bookings::find_by_id(booking_id)
            .filter(bookings::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<bookings::Model>> {
        Ok(Bookings::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .all(&self.conn)
            .await?)
    }

    pub async fn tickets_for_bookings(
        &self,
        booking_ids: &[i32],
    ) -> Result<Vec<(tickets::Model, Option<seats::Model>)>> {
        if booking_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(Tickets::find()
            .filter(tickets::Column::BookingId.is_in(booking_ids.iter().copied()))
            .find_also_related(Seats)
            .all(&self.conn)
            .await?)
    }

    /// Soft state transition: the booking flips to Cancelled and its
    /// tickets leave the occupancy set, in one transaction. The ticket
    /// rows themselves stay for history.
    pub async fn cancel(&self, booking_id: i32) -> Result<bookings::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        Bookings::update_many()
            .col_expr(
                bookings::Column::Status,
                Expr::value(BookingStatus::Cancelled),
            )
            .col_expr(bookings::Column::UpdatedAt, Expr::value(now))
            .filter(bookings::Column::Id.eq(booking_id))
            .exec(&txn)
            .await?;

        Tickets::update_many()
            .col_expr(tickets::Column::Active, Expr::value(false))
            .filter(tickets::Column::BookingId.eq(booking_id))
            .exec(&txn)
            .await?;

        let updated = Bookings::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Booking {booking_id} vanished during cancellation"))?;

        txn.commit().await?;

        Ok(updated)
    }
}
