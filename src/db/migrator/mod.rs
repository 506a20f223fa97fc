use sea_orm_migration::prelude::*;

mod m20250601_initial;
mod m20250608_ticket_occupancy_index;
mod m20250615_seed_admin_user;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_initial::Migration),
            Box::new(m20250608_ticket_occupancy_index::Migration),
            Box::new(m20250615_seed_admin_user::Migration),
        ]
    }
}
