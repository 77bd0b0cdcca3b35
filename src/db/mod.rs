pub mod memory;
pub mod models;
pub mod postgres;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::directory::{
    ArtistDirectoryQuery, DirectoryArtist, DirectoryPage, DirectoryQuery, PlatformStats,
};
pub use memory::MemoryStore;
use models::{Artist, GeneratedFile, NewArtist, NewPortfolio, Portfolio};
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/portfolio".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS artists (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    category TEXT NOT NULL,
    experience TEXT NOT NULL DEFAULT 'beginner',
    bio TEXT,
    city TEXT,
    country TEXT,
    genres TEXT[] NOT NULL DEFAULT '{}',
    social_links JSONB NOT NULL DEFAULT '{}'::jsonb,
    media JSONB NOT NULL DEFAULT '[]'::jsonb,
    is_verified BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    rating_average DOUBLE PRECISION NOT NULL DEFAULT 0,
    rating_count INTEGER NOT NULL DEFAULT 0,
    portfolio_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_artists_active_category ON artists(is_active, category);
CREATE INDEX IF NOT EXISTS idx_artists_rating ON artists(rating_average DESC, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_artists_country ON artists(country);

CREATE TABLE IF NOT EXISTS portfolios (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    artist_id UUID UNIQUE NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
    template TEXT NOT NULL DEFAULT 'modern',
    title TEXT NOT NULL,
    description TEXT,
    customizations JSONB NOT NULL DEFAULT '{}'::jsonb,
    sections JSONB NOT NULL DEFAULT '[]'::jsonb,
    views BIGINT NOT NULL DEFAULT 0,
    is_public BOOLEAN NOT NULL DEFAULT true,
    generated_files JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_portfolios_public ON portfolios(is_public);
CREATE INDEX IF NOT EXISTS idx_portfolios_directory_order
    ON portfolios(views DESC, created_at DESC);
"#;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");
    sqlx::raw_sql(MIGRATIONS).execute(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    Duplicate { field: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::Duplicate {
            field: field.into(),
        }
    }
}

/// Row counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub active_artists: i64,
    pub portfolios: i64,
}

/// Persistence backend: Postgres when DATABASE_URL is configured, otherwise
/// a process-local in-memory store.
#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }

    /// Round-trip latency of a trivial query.
    pub async fn ping(&self) -> Result<Duration, StoreError> {
        match self {
            Store::Postgres(s) => s.ping().await,
            Store::Memory(_) => Ok(Duration::ZERO),
        }
    }

    pub async fn counts(&self) -> Result<StoreCounts, StoreError> {
        match self {
            Store::Postgres(s) => s.counts().await,
            Store::Memory(s) => Ok(s.counts().await),
        }
    }

    pub async fn insert_artist(&self, artist: NewArtist) -> Result<Artist, StoreError> {
        match self {
            Store::Postgres(s) => s.insert_artist(artist).await,
            Store::Memory(s) => s.insert_artist(artist).await,
        }
    }

    pub async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>, StoreError> {
        match self {
            Store::Postgres(s) => s.find_artist(id).await,
            Store::Memory(s) => Ok(s.find_artist(id).await),
        }
    }

    /// Insert a portfolio and point its artist at it. One portfolio per artist.
    pub async fn insert_portfolio(&self, portfolio: NewPortfolio) -> Result<Portfolio, StoreError> {
        match self {
            Store::Postgres(s) => s.insert_portfolio(portfolio).await,
            Store::Memory(s) => s.insert_portfolio(portfolio).await,
        }
    }

    pub async fn find_portfolio(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError> {
        match self {
            Store::Postgres(s) => s.find_portfolio(id).await,
            Store::Memory(s) => Ok(s.find_portfolio(id).await),
        }
    }

    /// Increment the view counter and return the updated portfolio.
    pub async fn record_view(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError> {
        match self {
            Store::Postgres(s) => s.record_view(id).await,
            Store::Memory(s) => Ok(s.record_view(id).await),
        }
    }

    /// Atomically append to the portfolio's generated-file list.
    /// Returns false when the portfolio does not exist.
    pub async fn append_generated_file(
        &self,
        id: Uuid,
        file: &GeneratedFile,
    ) -> Result<bool, StoreError> {
        match self {
            Store::Postgres(s) => s.append_generated_file(id, file).await,
            Store::Memory(s) => Ok(s.append_generated_file(id, file).await),
        }
    }

    pub async fn public_directory(&self, query: &DirectoryQuery) -> Result<DirectoryPage, StoreError> {
        match self {
            Store::Postgres(s) => s.public_directory(query).await,
            Store::Memory(s) => Ok(s.public_directory(query).await),
        }
    }

    pub async fn artist_directory(
        &self,
        query: &ArtistDirectoryQuery,
    ) -> Result<Vec<DirectoryArtist>, StoreError> {
        match self {
            Store::Postgres(s) => s.artist_directory(query).await,
            Store::Memory(s) => Ok(s.artist_directory(query).await),
        }
    }

    pub async fn platform_stats(&self, now: DateTime<Utc>) -> Result<PlatformStats, StoreError> {
        match self {
            Store::Postgres(s) => s.platform_stats(now).await,
            Store::Memory(s) => Ok(s.platform_stats(now).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_default_uses_env_or_fallback() {
        let config = DbConfig::default();
        assert!(config.max_connections >= 1);
        assert!(config.connect_timeout_secs >= 1);
        assert!(config.idle_timeout_secs >= 1);
        assert!(!config.url.is_empty());
    }

    #[test]
    fn test_duplicate_error_names_field() {
        assert_eq!(
            StoreError::duplicate("email").to_string(),
            "email already exists"
        );
    }

    #[tokio::test]
    async fn test_memory_store_pings() {
        let store = Store::memory();
        assert_eq!(store.backend(), "memory");
        assert_eq!(store.ping().await.unwrap(), Duration::ZERO);
    }
}
