use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates a user with a freshly hashed password and generated API
    /// key. The email arrives normalized from the API boundary; the
    /// unique index is the last line of defense against duplicates.
    pub async fn create(
        &self,
        name: Option<String>,
        email: &str,
        phone_number: Option<String>,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<users::Model> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash =
            task::spawn_blocking(move || hash_password(&password, Some(&security)))
                .await
                .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            name: Set(name),
            email: Set(email.to_string()),
            phone_number: Set(phone_number),
            password_hash: Set(password_hash),
            api_key: Set(generate_api_key()),
            is_staff: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = users::Entity::insert(model)
            .exec_with_returning(&self.conn)
            .await?;

        Ok(created)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Verify credentials, returning the user on success.
    /// Note: this uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then_some(user))
    }

    /// Partial profile update. The outer `Option` means "field present in
    /// the request"; the inner value is what to store (allows clearing).
    pub async fn update_profile(
        &self,
        user_id: i32,
        name: Option<Option<String>>,
        phone_number: Option<Option<String>>,
        city_id: Option<Option<i32>>,
    ) -> Result<users::Model> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();

        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(phone_number) = phone_number {
            active.phone_number = Set(phone_number);
        }
        if let Some(city_id) = city_id {
            active.city_id = Set(city_id);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(active.update(&self.conn).await?)
    }

    /// Verify API key and return the associated user
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user)
    }

    pub async fn regenerate_api_key(&self, user_id: i32) -> Result<String> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for API key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let new_api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
