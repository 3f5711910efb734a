use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Location;

/// Durable tier for geocoding results, keyed by normalized `search_query`.
///
/// Every query checks a connection out of the pool for its own duration only.
pub struct LocationStore {
    pool: SqlitePool,
}

impl LocationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_query TEXT NOT NULL UNIQUE,
                formatted_query TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find(&self, search_query: &str) -> Result<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT search_query, formatted_query, latitude, longitude
            FROM locations
            WHERE search_query = $1
            "#,
        )
        .bind(search_query)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Keeps the first row written for a `search_query`; later writes are no-ops.
    pub async fn insert(&self, location: &Location) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (search_query, formatted_query, latitude, longitude)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (search_query) DO NOTHING
            "#,
        )
        .bind(&location.search_query)
        .bind(&location.formatted_query)
        .bind(location.latitude)
        .bind(location.longitude)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> LocationStore {
    // One connection, otherwise every pooled connection gets its own empty database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = LocationStore::new(pool);
    store.init_tables().await.unwrap();
    store
}
