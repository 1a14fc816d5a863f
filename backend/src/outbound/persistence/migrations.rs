//! Embedded schema migrations.
//!
//! Migrations ship inside the binary so a fresh database reaches the current
//! schema at startup, before seeding. `diesel_migrations` drives a
//! synchronous connection, so the harness runs on a blocking thread.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::debug;

use crate::domain::ports::FareRuleStoreError;

/// Embedded migrations from the `backend/migrations` directory.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run all pending migrations against the given database URL.
///
/// # Errors
///
/// Returns a connection error when the database is unreachable and a query
/// error when a migration fails to apply.
pub async fn migrate_schema(database_url: &str) -> Result<(), FareRuleStoreError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| FareRuleStoreError::connection(err.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| FareRuleStoreError::query(format!("migration: {err}")))?;
        debug!(applied = applied.len(), "schema migrations up to date");
        Ok(())
    })
    .await
    .map_err(|err| FareRuleStoreError::query(format!("migration task: {err}")))?
}
