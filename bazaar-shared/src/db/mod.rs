//! Database layer
//!
//! PostgreSQL connection pooling and schema migrations. Row types and
//! queries live in [`crate::models`].
//!
//! ```no_run
//! use bazaar_shared::db::{create_pool, run_migrations, DatabaseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod migrations;
pub mod pool;

pub use migrations::{
    drop_database, ensure_database_exists, get_migration_status, run_migrations, MigrationStatus,
};
pub use pool::{close_pool, create_pool, get_pool_stats, health_check, DatabaseConfig, PoolStats};
