/// Embedded schema migrations
///
/// Migration files live in `migrations/` at the workspace root and are
/// compiled into the binary, so the API can bring an empty database up to
/// date on boot.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applies every migration that has not run yet
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");
    MIGRATOR.run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert!(!versions.is_empty());

        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted, "migrations must be ordered by version");
    }
}
