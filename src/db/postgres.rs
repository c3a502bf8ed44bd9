use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};

use super::{profile_not_found, ProfileStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        profile::{EMAIL_TAKEN, PROFILE_EXISTS},
        EntryUpdate, MovieId, ProfileUpdate, UserProfile, WatchlistEntry,
    },
};

/// Name of the unique constraint on `profiles.email`, see `migrations/`
const EMAIL_CONSTRAINT: &str = "profiles_email_key";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Profile store backed by PostgreSQL
///
/// Each profile is one row whose `document` column holds the whole profile as
/// JSONB. Mutations lock the row with `SELECT ... FOR UPDATE` for the length of
/// the transaction, which serializes writers to the same uid.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and brings the schema up to date
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let store = Self::new(create_pool(database_url, max_connections).await?);
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations complete");
        Ok(())
    }

    async fn modify<F>(&self, uid: &str, mutate: F) -> AppResult<UserProfile>
    where
        F: FnOnce(&mut UserProfile) -> AppResult<()> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Json<UserProfile>,)> =
            sqlx::query_as("SELECT document FROM profiles WHERE uid = $1 FOR UPDATE")
                .bind(uid)
                .fetch_optional(&mut *tx)
                .await?;

        // Dropping the transaction on an early return rolls it back
        let Some((Json(mut profile),)) = row else {
            return Err(profile_not_found());
        };
        mutate(&mut profile)?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET email = $2, document = $3, updated_at = $4
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .bind(&profile.email)
        .bind(Json(&profile))
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;
        Ok(profile)
    }
}

/// Turns unique-constraint failures into conflicts naming the duplicated field
fn map_unique_violation(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let message = match db_error.constraint() {
                Some(EMAIL_CONSTRAINT) => EMAIL_TAKEN,
                _ => PROFILE_EXISTS,
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(error)
}

#[async_trait::async_trait]
impl ProfileStore for PgProfileStore {
    async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        sqlx::query(
            r#"
            INSERT INTO profiles (uid, email, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&profile.uid)
        .bind(&profile.email)
        .bind(Json(&profile))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(profile)
    }

    async fn get_profile(&self, uid: &str) -> AppResult<UserProfile> {
        let row: Option<(Json<UserProfile>,)> =
            sqlx::query_as("SELECT document FROM profiles WHERE uid = $1")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(Json(profile),)| profile)
            .ok_or_else(profile_not_found)
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| {
            profile.apply_update(&update);
            Ok(())
        })
        .await
    }

    async fn add_entry(&self, uid: &str, entry: WatchlistEntry) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| profile.add_entry(entry)).await
    }

    async fn remove_entry(&self, uid: &str, movie_id: MovieId) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| {
            profile.remove_entry(movie_id);
            Ok(())
        })
        .await
    }

    async fn patch_entry(
        &self,
        uid: &str,
        movie_id: MovieId,
        update: EntryUpdate,
    ) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| profile.patch_entry(movie_id, &update))
            .await
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
