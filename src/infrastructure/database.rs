//! Pooled SQLite connection

use di::inject;
use di::injectable;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::ops::{Deref, DerefMut};
use std::sync::RwLock;

const DEFAULT_DATABASE_URL: &str = "sqlite:valentine.db?mode=rwc";

/// Pool installed by the process before the DI container is built. The
/// container constructs `DatabaseConnection` itself, so this is how a
/// migrated pool (or a test pool) reaches it.
static SHARED_POOL: RwLock<Option<SqlitePool>> = RwLock::new(None);

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create() -> DatabaseConnection {
        if let Some(pool) = SHARED_POOL.read().ok().and_then(|pool| pool.clone()) {
            return DatabaseConnection { connection: pool };
        }

        dotenvy::dotenv().ok();
        let connection_string =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy(&connection_string)
            .expect("Cannot connect to database");

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    pub fn from_pool(pool: SqlitePool) -> DatabaseConnection {
        DatabaseConnection { connection: pool }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        Ok(pool)
    }

    pub fn set_shared_pool(pool: SqlitePool) {
        if let Ok(mut shared) = SHARED_POOL.write() {
            *shared = Some(pool);
        }
    }

    pub fn clear_shared_pool() {
        if let Ok(mut shared) = SHARED_POOL.write() {
            *shared = None;
        }
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
