//! Embedded schema migrations.
//!
//! The SQL files under the workspace-level `migrations/` directory are
//! compiled into the binary via `sqlx::migrate!`, so the integration
//! harness and any embedding process can bring a fresh database up to
//! the current schema without shipping loose files.

use sqlx::PgPool;
use tracing::info;

use gymstack_core::error::{AppError, ErrorKind};

/// Apply every migration not yet recorded in the target database.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let migrator = sqlx::migrate!("../../migrations");
    info!(available = migrator.iter().count(), "Applying schema migrations");

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to apply schema migrations: {e}"),
            e,
        )
    })?;

    info!("Database schema is up to date");
    Ok(())
}
