use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// The storage-level source of truth for seat occupancy: at most one
/// active ticket may exist per (slot, seat), regardless of which booking
/// owns it. Cancelled tickets stay in the table with `active = 0` and do
/// not participate in the index, which is what frees the seat.
///
/// sea-query has no builder for partial indexes, so this runs raw SQL.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_tickets_active_slot_seat \
                 ON tickets (slot_id, seat_id) WHERE active = 1",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_tickets_active_slot_seat")
            .await?;

        Ok(())
    }
}
