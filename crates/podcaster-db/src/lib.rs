//! # podcaster-db
//!
//! PostgreSQL database layer for the podcaster backoffice.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for every entity
//! - A generic link-table repository whose overwrite runs in one
//!   transaction under a per-parent advisory lock
//! - Embedded migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use podcaster_db::{AppConfig, Database, EntityRepository, Wall};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let db = Database::connect_with_app_config(&config).await?;
//!
//!     db.walls.create(Wall {
//!         id: podcaster_db::new_v7(),
//!         name: "Home".to_string(),
//!         description: "Landing page".to_string(),
//!     }).await?;
//!     Ok(())
//! }
//! ```

pub mod associations;
pub mod blocks;
pub mod categories;
pub mod episodes;
pub mod media;
pub mod pool;
pub mod programs;
pub mod tags;
pub mod walls;

// Always compiled so integration tests (in tests/) can use it.
pub mod test_fixtures;

// Re-export core types
pub use podcaster_core::*;

pub use associations::{
    PgAssociationRepository, PgBlockProgramRepository, PgProgramCategoryRepository,
    PgProgramTagRepository, PgWallBlockRepository,
};
pub use blocks::PgBlockRepository;
pub use categories::PgCategoryRepository;
pub use episodes::PgEpisodeRepository;
pub use media::PgMediaRepository;
pub use pool::{
    create_pool, create_pool_from_config, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use programs::PgProgramRepository;
pub use tags::PgTagRepository;
pub use walls::PgWallRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub walls: PgWallRepository,
    pub blocks: PgBlockRepository,
    pub programs: PgProgramRepository,
    pub episodes: PgEpisodeRepository,
    pub media: PgMediaRepository,
    pub tags: PgTagRepository,
    pub categories: PgCategoryRepository,
    /// Blocks placed on walls.
    pub wall_blocks: PgWallBlockRepository,
    /// Programs placed in blocks.
    pub block_programs: PgBlockProgramRepository,
    pub program_tags: PgProgramTagRepository,
    pub program_categories: PgProgramCategoryRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            walls: PgWallRepository::new(pool.clone()),
            blocks: PgBlockRepository::new(pool.clone()),
            programs: PgProgramRepository::new(pool.clone()),
            episodes: PgEpisodeRepository::new(pool.clone()),
            media: PgMediaRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            categories: PgCategoryRepository::new(pool.clone()),
            wall_blocks: PgAssociationRepository::new(pool.clone()),
            block_programs: PgAssociationRepository::new(pool.clone()),
            program_tags: PgAssociationRepository::new(pool.clone()),
            program_categories: PgAssociationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect using the database section of the application configuration.
    pub async fn connect_with_app_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let pool = create_pool_from_config(&config.database).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
