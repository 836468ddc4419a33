//! Credit lifecycle: creation, field edits, settlement, deletion, and the
//! read side (listings with derived paid totals, outstanding total).

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, ToSql};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::model::{checked_amount, from_cents, Credit, CreditEdit, CreditFilter, CreditRow, CreditStatus};
use crate::store::Ledger;

const CREDIT_SELECT: &str = "
    SELECT
        cr.id,
        cr.client_id,
        c.name,
        cr.date,
        cr.principal,
        IFNULL(SUM(p.amount), 0) AS paid,
        cr.remaining,
        cr.reason,
        cr.status
    FROM credits cr
    JOIN clients c ON c.id = cr.client_id
    LEFT JOIN payments p ON p.credit_id = cr.id
";

impl Ledger {
    /// Opens a credit for the named client, with `remaining = principal`.
    pub fn create_credit(
        &mut self,
        client_name: &str,
        date: NaiveDate,
        principal: Decimal,
        reason: Option<&str>,
    ) -> Result<i64> {
        let cents = checked_amount(principal)?;
        let tx = self.conn.transaction()?;

        let client_id: i64 = tx
            .query_row(
                "SELECT id FROM clients WHERE name = ?",
                params![client_name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| LedgerError::UnknownClient(client_name.to_string()))?;

        tx.execute(
            "INSERT INTO credits (client_id, date, principal, remaining, reason)
             VALUES (?, ?, ?, ?, ?)",
            params![client_id, date, cents, cents, reason],
        )?;
        let credit_id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(credit = credit_id, client = client_id, amount = %principal, "credit opened");
        Ok(credit_id)
    }

    /// Edits one credit field. Date and reason are freely editable; the
    /// principal only while the credit is open, never below what has already
    /// been collected. The remaining balance is re-read inside the same
    /// transaction and recomputed as `new principal - paid`, so the balance
    /// invariant holds whatever the caller last saw.
    pub fn edit_credit(&mut self, credit_id: i64, edit: CreditEdit) -> Result<()> {
        match edit {
            CreditEdit::Date(date) => {
                let changed = self.conn.execute(
                    "UPDATE credits SET date = ? WHERE id = ?",
                    params![date, credit_id],
                )?;
                if changed == 0 {
                    return Err(LedgerError::CreditNotFound(credit_id));
                }
            }
            CreditEdit::Reason(reason) => {
                let changed = self.conn.execute(
                    "UPDATE credits SET reason = ? WHERE id = ?",
                    params![reason, credit_id],
                )?;
                if changed == 0 {
                    return Err(LedgerError::CreditNotFound(credit_id));
                }
            }
            CreditEdit::Principal(value) => {
                let cents = checked_amount(value)?;
                let tx = self.conn.transaction()?;

                let row = tx
                    .query_row(
                        "SELECT principal, remaining, status FROM credits WHERE id = ?",
                        params![credit_id],
                        |row| {
                            Ok((
                                row.get::<_, i64>(0)?,
                                row.get::<_, i64>(1)?,
                                row.get::<_, String>(2)?,
                            ))
                        },
                    )
                    .optional()?;
                let (principal, remaining, status) =
                    row.ok_or(LedgerError::CreditNotFound(credit_id))?;

                if CreditStatus::from_db(&status) == Some(CreditStatus::Settled) {
                    return Err(LedgerError::ImmutableField("principal"));
                }
                let paid = principal - remaining;
                if cents < paid {
                    return Err(LedgerError::BelowPaid {
                        principal: value,
                        paid: from_cents(paid),
                    });
                }

                tx.execute(
                    "UPDATE credits SET principal = ?, remaining = ? WHERE id = ?",
                    params![cents, cents - paid, credit_id],
                )?;
                tx.execute(
                    "UPDATE credits SET status = 'settled' WHERE id = ? AND remaining <= 0",
                    params![credit_id],
                )?;
                tx.commit()?;
                debug!(credit = credit_id, principal = %value, "credit principal updated");
            }
        }
        Ok(())
    }

    /// Force-closes a credit: records a synthetic payment of the full
    /// remaining balance, dated today, and marks the credit settled. This is
    /// the only operation that writes a payment on the caller's behalf; the
    /// synthetic row keeps the payment history numerically consistent with
    /// the balance.
    pub fn settle_credit(&mut self, credit_id: i64, client_id: i64) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let remaining: i64 = tx
            .query_row(
                "SELECT remaining FROM credits WHERE id = ? AND client_id = ?",
                params![credit_id, client_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(LedgerError::CreditNotFound(credit_id))?;
        if remaining <= 0 {
            return Err(LedgerError::AlreadySettled(credit_id));
        }

        let today = Utc::now().date_naive();
        tx.execute(
            "INSERT INTO payments (credit_id, client_id, date, amount, note)
             VALUES (?, ?, ?, ?, NULL)",
            params![credit_id, client_id, today, remaining],
        )?;
        let payment_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE credits SET remaining = 0, status = 'settled' WHERE id = ?",
            params![credit_id],
        )?;
        tx.commit()?;

        info!(credit = credit_id, amount = %from_cents(remaining), "credit settled");
        Ok(payment_id)
    }

    /// Deletes a credit and, through the cascade, all of its payments.
    /// Client totals are live sums, so nothing else needs recomputing.
    pub fn delete_credit(&mut self, credit_id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM credits WHERE id = ?", params![credit_id])?;
        if changed == 0 {
            return Err(LedgerError::CreditNotFound(credit_id));
        }
        info!(credit = credit_id, "credit deleted with payments");
        Ok(())
    }

    pub fn credit(&self, credit_id: i64) -> Result<Credit> {
        self.conn
            .query_row(
                "SELECT id, client_id, date, principal, remaining, reason, status
                 FROM credits WHERE id = ?",
                params![credit_id],
                |row| {
                    let status: String = row.get(6)?;
                    Ok(Credit {
                        id: row.get(0)?,
                        client_id: row.get(1)?,
                        date: row.get(2)?,
                        principal: from_cents(row.get(3)?),
                        remaining: from_cents(row.get(4)?),
                        reason: row.get(5)?,
                        status: CreditStatus::from_db(&status).unwrap_or(CreditStatus::Open),
                    })
                },
            )
            .optional()?
            .ok_or(LedgerError::CreditNotFound(credit_id))
    }

    /// Lists credits matching the filter, each with its derived paid total.
    pub fn list_credits(&self, filter: &CreditFilter) -> Result<Vec<CreditRow>> {
        let status = filter.status.map(|s| s.as_str());
        let pattern = filter.search.as_ref().map(|term| format!("%{term}%"));

        let mut sql = format!("{CREDIT_SELECT} WHERE 1 = 1");
        let mut args: Vec<&dyn ToSql> = Vec::new();
        if let Some(status) = &status {
            sql.push_str(" AND cr.status = ?");
            args.push(status);
        }
        if let Some(client_id) = &filter.client_id {
            sql.push_str(" AND cr.client_id = ?");
            args.push(client_id);
        }
        if let Some(pattern) = &pattern {
            sql.push_str(" AND (c.name LIKE ? OR cr.reason LIKE ? OR cr.date LIKE ?)");
            args.push(pattern);
            args.push(pattern);
            args.push(pattern);
        }
        sql.push_str(" GROUP BY cr.id ORDER BY c.name COLLATE NOCASE, cr.date");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(&args[..], |row| {
            let status: String = row.get(8)?;
            Ok(CreditRow {
                id: row.get(0)?,
                client_id: row.get(1)?,
                client_name: row.get(2)?,
                date: row.get(3)?,
                principal: from_cents(row.get(4)?),
                paid: from_cents(row.get(5)?),
                remaining: from_cents(row.get(6)?),
                reason: row.get(7)?,
                status: CreditStatus::from_db(&status).unwrap_or(CreditStatus::Open),
            })
        })?;

        let mut credits = Vec::new();
        for row in rows {
            credits.push(row?);
        }
        Ok(credits)
    }

    /// Total still owed across all open credits. Derived on every call, so
    /// it cannot drift from the ledger.
    pub fn total_outstanding(&self) -> Result<Decimal> {
        let cents: i64 = self.conn.query_row(
            "SELECT IFNULL(SUM(remaining), 0) FROM credits WHERE status = 'open'",
            [],
            |row| row.get(0),
        )?;
        Ok(from_cents(cents))
    }
}
