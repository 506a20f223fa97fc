use crate::entities::prelude::*;
use crate::entities::users;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key (regenerate after first login)
const DEFAULT_API_KEY: &str = "cinebook_default_api_key_please_regenerate";

/// Hash the default password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Seed a staff user so catalog and slot writes are possible on a
        // fresh database.
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Name,
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::ApiKey,
                users::Column::IsStaff,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                "admin@cinebook.local".into(),
                password_hash.into(),
                DEFAULT_API_KEY.into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = sea_orm_migration::sea_query::Query::delete()
            .from_table(Users)
            .and_where(Expr::col(users::Column::Email).eq("admin@cinebook.local"))
            .to_owned();

        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
