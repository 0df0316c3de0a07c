mod schema;

use std::path::Path;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

pub use schema::DEFAULT_CATEGORIES;
use schema::{INITIAL_SCHEMA, SEEDED_KEY};

/// Database wrapper providing connection management and schema initialization.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Uses IF NOT EXISTS for idempotent execution. The default categories
    /// are seeded only once, so categories the user deleted stay deleted.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        self.seed_default_categories()?;
        Ok(())
    }

    fn seed_default_categories(&self) -> Result<()> {
        if self.setting(SEEDED_KEY)?.is_some() {
            return Ok(());
        }

        let tx = self.conn.unchecked_transaction()?;
        for name in DEFAULT_CATEGORIES {
            tx.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, '1')",
            [SEEDED_KEY],
        )?;
        tx.commit()?;

        tracing::debug!("seeded default categories");
        Ok(())
    }

    /// Reads a value from the settings table.
    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Writes a value to the settings table, replacing any previous value.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
