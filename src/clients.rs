//! Client lifecycle and per-client balance views.

use rusqlite::{params, OptionalExtension};
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::model::{from_cents, Client, ClientAccount, ClientEdit};
use crate::store::Ledger;

const ACCOUNT_SELECT: &str = "
    SELECT
        c.id,
        c.name,
        c.phone,
        c.locality,
        c.note,
        IFNULL(SUM(CASE WHEN cr.status = 'open' THEN cr.remaining ELSE 0 END), 0) AS outstanding
    FROM clients c
    LEFT JOIN credits cr ON cr.client_id = c.id
";

impl Ledger {
    /// Creates a client. Name uniqueness is a business rule, not a
    /// constraint; the first match wins when resolving credits by name.
    pub fn create_client(
        &mut self,
        name: &str,
        phone: Option<&str>,
        locality: Option<&str>,
        note: Option<&str>,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("client name must not be empty".into()));
        }
        self.conn.execute(
            "INSERT INTO clients (name, phone, locality, note) VALUES (?, ?, ?, ?)",
            params![name, phone, locality, note],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Edits one client field. The identity and contact fields are the only
    /// editable ones; balances are derived and cannot be touched.
    pub fn edit_client(&mut self, client_id: i64, edit: ClientEdit) -> Result<()> {
        let changed = match edit {
            ClientEdit::Name(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(LedgerError::Validation("client name must not be empty".into()));
                }
                self.conn.execute(
                    "UPDATE clients SET name = ? WHERE id = ?",
                    params![name, client_id],
                )?
            }
            ClientEdit::Phone(phone) => self.conn.execute(
                "UPDATE clients SET phone = ? WHERE id = ?",
                params![phone, client_id],
            )?,
            ClientEdit::Locality(locality) => self.conn.execute(
                "UPDATE clients SET locality = ? WHERE id = ?",
                params![locality, client_id],
            )?,
            ClientEdit::Note(note) => self.conn.execute(
                "UPDATE clients SET note = ? WHERE id = ?",
                params![note, client_id],
            )?,
        };
        if changed == 0 {
            return Err(LedgerError::ClientNotFound(client_id));
        }
        Ok(())
    }

    /// Deletes a client together with all of their credits and payments.
    pub fn delete_client(&mut self, client_id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?", params![client_id])?;
        if changed == 0 {
            return Err(LedgerError::ClientNotFound(client_id));
        }
        info!(client = client_id, "client deleted with credits and payments");
        Ok(())
    }

    pub fn client(&self, client_id: i64) -> Result<Client> {
        self.conn
            .query_row(
                "SELECT id, name, phone, locality, note, created_at FROM clients WHERE id = ?",
                params![client_id],
                |row| {
                    Ok(Client {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        phone: row.get(2)?,
                        locality: row.get(3)?,
                        note: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or(LedgerError::ClientNotFound(client_id))
    }

    /// All clients with their live outstanding totals.
    pub fn list_clients(&self) -> Result<Vec<ClientAccount>> {
        let sql = format!("{ACCOUNT_SELECT} GROUP BY c.id ORDER BY c.name COLLATE NOCASE");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], account_from_row)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    /// Clients whose name, phone or locality matches the search term.
    pub fn search_clients(&self, term: &str) -> Result<Vec<ClientAccount>> {
        let sql = format!(
            "{ACCOUNT_SELECT}
             WHERE c.name LIKE ?1 OR c.phone LIKE ?1 OR c.locality LIKE ?1
             GROUP BY c.id
             ORDER BY c.name COLLATE NOCASE"
        );
        let pattern = format!("%{term}%");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern], account_from_row)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClientAccount> {
    Ok(ClientAccount {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        locality: row.get(3)?,
        note: row.get(4)?,
        outstanding: from_cents(row.get(5)?),
    })
}
