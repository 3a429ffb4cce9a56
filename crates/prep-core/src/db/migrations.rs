//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Execute a migration's statements inside one transaction
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: entity tables
///
/// Each entity row keeps its full JSON snapshot in `data`; the other columns
/// exist only to back the secondary indexes.
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                company TEXT,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                data TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_questions_kind ON questions(kind)",
            "CREATE INDEX IF NOT EXISTS idx_questions_company ON questions(company)",
            "CREATE INDEX IF NOT EXISTS idx_questions_kind_company ON questions(kind, company)",
            "CREATE INDEX IF NOT EXISTS idx_questions_favorite ON questions(is_favorite)",
            "CREATE INDEX IF NOT EXISTS idx_questions_created ON questions(created_at DESC)",
            "CREATE TABLE IF NOT EXISTS bookmarks (
                id TEXT PRIMARY KEY,
                resource_type TEXT NOT NULL,
                category TEXT,
                status TEXT NOT NULL DEFAULT 'unread',
                created_at INTEGER NOT NULL,
                data TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_bookmarks_type ON bookmarks(resource_type)",
            "CREATE INDEX IF NOT EXISTS idx_bookmarks_category ON bookmarks(category)",
            "CREATE INDEX IF NOT EXISTS idx_bookmarks_status ON bookmarks(status)",
            "CREATE INDEX IF NOT EXISTS idx_bookmarks_created ON bookmarks(created_at DESC)",
            "CREATE TABLE IF NOT EXISTS interviews (
                id TEXT PRIMARY KEY,
                company TEXT NOT NULL,
                date_time INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled',
                created_at INTEGER NOT NULL,
                data TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_interviews_company ON interviews(company)",
            "CREATE INDEX IF NOT EXISTS idx_interviews_date ON interviews(date_time)",
            "CREATE TABLE IF NOT EXISTS company_notes (
                company TEXT PRIMARY KEY,
                updated_at INTEGER NOT NULL,
                data TEXT NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: durable sync queue
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS sync_queue (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                op TEXT NOT NULL,
                store TEXT NOT NULL,
                data TEXT,
                entity_id TEXT,
                timestamp INTEGER NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
