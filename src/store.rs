//! Ledger handle and schema management.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::Result;

/// Handle to the ledger database. Owns the connection; every mutating
/// operation runs its statements inside a single transaction on it.
pub struct Ledger {
    pub(crate) conn: Connection,
}

impl Ledger {
    /// Opens (or creates) a file-backed ledger database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
        Self::init(conn)
    }

    /// Opens a transient in-memory ledger. Used by the test suites.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        run_migrations(&conn)?;
        Ok(Self { conn })
    }
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS credits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            principal INTEGER NOT NULL CHECK (principal > 0),
            remaining INTEGER NOT NULL CHECK (remaining >= 0),
            reason TEXT,
            status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'settled')),
            FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            credit_id INTEGER NOT NULL,
            client_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            note TEXT,
            FOREIGN KEY (credit_id) REFERENCES credits(id) ON DELETE CASCADE,
            FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(name);
        CREATE INDEX IF NOT EXISTS idx_credits_client ON credits(client_id);
        CREATE INDEX IF NOT EXISTS idx_credits_status ON credits(status);
        CREATE INDEX IF NOT EXISTS idx_payments_credit ON payments(credit_id);
        ",
    )?;
    ensure_column(
        conn,
        "clients",
        "locality",
        "ALTER TABLE clients ADD COLUMN locality TEXT",
    )?;
    Ok(())
}

fn ensure_column(conn: &Connection, table: &str, column: &str, alter_sql: &str) -> Result<()> {
    let present: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = ?"),
        params![column],
        |row| row.get(0),
    )?;
    if present == 0 {
        conn.execute(alter_sql, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // the clients table as created before the locality column existed
    const LEGACY_CLIENTS: &str = "
        CREATE TABLE clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
    ";

    #[test]
    fn backfills_locality_on_older_databases() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(LEGACY_CLIENTS).unwrap();
        conn.execute("INSERT INTO clients (name) VALUES ('Ibrahim')", [])
            .unwrap();

        run_migrations(&conn).unwrap();

        let mut ledger = Ledger { conn };
        let id = ledger
            .create_client("Samir", None, Some("Cherchell"), None)
            .unwrap();
        assert_eq!(
            ledger.client(id).unwrap().locality.as_deref(),
            Some("Cherchell")
        );
        // rows from before the migration read back with no locality
        let old = ledger.search_clients("Ibrahim").unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].locality, None);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let mut ledger = Ledger { conn };
        assert!(ledger
            .create_client("Ibrahim", None, Some("Tipaza"), None)
            .is_ok());
    }
}
