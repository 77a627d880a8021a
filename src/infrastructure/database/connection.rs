use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    pub async fn initialize(config: &DatabaseConfig) -> Result<DbPool, AppError> {
        Self::ensure_parent_dir(&config.url)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;

        info!("Database connected: {}", config.url);

        Self::run_migrations(&pool).await?;

        Ok(pool)
    }

    fn ensure_parent_dir(database_url: &str) -> Result<(), AppError> {
        let Some(raw) = database_url.strip_prefix("sqlite:") else {
            return Ok(());
        };
        let path = raw.trim_start_matches("//");
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path == ":memory:" {
            return Ok(());
        }
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn initialize_creates_database_and_schema() {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("nested").join("test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 1,
            connection_timeout: 5,
        };

        let pool = Database::initialize(&config).await.expect("initialize");

        assert!(db_path.exists());

        let table_check =
            sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='sync_queue'")
                .fetch_optional(&pool)
                .await
                .expect("table lookup");
        assert!(table_check.is_some());

        pool.close().await;
    }
}
