// Database layer: SQLite storage for the OEWG analysis tables.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever OEWG_DB_PATH points
// (defaults to ./data/oewg_analysis.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteDatabase;
pub use traits::Database;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Open (or create) the database and create the schema.
///
/// Called by `oewg-ternary init` and `import`.
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `oewg-ternary init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}

/// Initialize the SQLite database and wrap it in the async trait.
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    Ok(Arc::new(SqliteDatabase::new(initialize(db_path)?)))
}

/// Open an existing SQLite database behind the async trait.
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    Ok(Arc::new(SqliteDatabase::new(open(db_path)?)))
}
