//! Schema migrations
//!
//! Migration files live in `migrations/` at the workspace root as
//! reversible `{timestamp}_{name}.up.sql` / `.down.sql` pairs and are
//! embedded into the binary at compile time.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applied-migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of successfully applied migrations
    pub applied_migrations: usize,

    /// Latest applied version (timestamp)
    pub latest_version: Option<i64>,

    /// Every embedded migration has been applied
    pub is_up_to_date: bool,
}

/// Applies all pending migrations
///
/// # Errors
///
/// Fails if a migration is malformed, fails to execute, or was changed
/// after being applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations complete");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reports which migrations have been applied
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            is_up_to_date: false,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    let embedded = sqlx::migrate!("../migrations");
    let expected = embedded
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .count();
    let newest = embedded.iter().map(|m| m.version).max();

    Ok(status_from(count as usize, latest_version, expected, newest))
}

fn status_from(
    applied: usize,
    latest_version: Option<i64>,
    expected: usize,
    newest: Option<i64>,
) -> MigrationStatus {
    MigrationStatus {
        applied_migrations: applied,
        latest_version,
        is_up_to_date: applied >= expected && latest_version == newest,
    }
}

/// Creates the database named in `database_url` if it is missing
///
/// Meant for development and test setups.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }
    Ok(())
}

/// Drops the database named in `database_url`
///
/// Permanently deletes all data. Test setups only.
pub async fn drop_database(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        warn!("Dropping database");
        Postgres::drop_database(database_url).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_up_to_date() {
        let status = status_from(5, Some(20250101000004), 5, Some(20250101000004));
        assert!(status.is_up_to_date);
        assert_eq!(status.applied_migrations, 5);
    }

    #[test]
    fn test_status_behind() {
        let status = status_from(3, Some(20250101000002), 5, Some(20250101000004));
        assert!(!status.is_up_to_date);
    }

    #[test]
    fn test_embedded_migrations_are_reversible() {
        let embedded = sqlx::migrate!("../migrations");
        assert_eq!(
            embedded
                .iter()
                .filter(|m| m.migration_type.is_up_migration())
                .count(),
            5
        );
        assert!(embedded
            .iter()
            .any(|m| m.migration_type.is_down_migration()));
    }
}
