use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Cities)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Genres)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Languages)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Movies)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(MovieGenres)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(MovieLanguages)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Cinemas)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Seats)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Slots)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Bookings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tickets)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Composite uniques the entity derive cannot express.
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_cinemas_name_city_address \
             ON cinemas (name, city_id, address)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_seats_cinema_row_seat \
             ON seats (cinema_id, row_number, seat_number)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_slots_cinema_start \
             ON slots (cinema_id, start_time)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_tickets_booking_seat \
             ON tickets (booking_id, seat_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Slots).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Seats).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cinemas).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MovieLanguages).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MovieGenres).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movies).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Languages).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Genres).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities).to_owned())
            .await?;

        Ok(())
    }
}
