//! Database initialization
//!
//! Creates the SQLite database on first run and applies the schema
//! idempotently, so modules can start against a missing or existing file
//! without a separate migration step.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;

    // Idempotent - safe to call multiple times
    create_crs_documents_table(&pool).await?;
    create_crs_audit_log_table(&pool).await?;

    Ok(pool)
}

/// Initialize an in-memory database (tests and ephemeral runs)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    configure_pragmas(&pool).await?;
    create_crs_documents_table(&pool).await?;
    create_crs_audit_log_table(&pool).await?;
    Ok(pool)
}

async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer; the optimistic-lock
    // UPDATE statements rely on SQLite serializing writes underneath.
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

async fn create_crs_documents_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS crs_documents (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            snapshot_version INTEGER NOT NULL,
            edit_version INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'draft',
            content TEXT NOT NULL,
            provenance TEXT NOT NULL,
            created_by TEXT NOT NULL,
            approved_by TEXT,
            rejection_reason TEXT,
            reviewed_at TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (project_id, snapshot_version)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_crs_documents_project
         ON crs_documents (project_id, snapshot_version DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_crs_audit_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS crs_audit_log (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            old_status TEXT,
            new_status TEXT,
            new_content TEXT,
            summary TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES crs_documents(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_crs_audit_log_document
         ON crs_audit_log (document_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
