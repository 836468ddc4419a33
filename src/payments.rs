//! Payment (versement) lifecycle. Inserting and deleting a payment are
//! exact algebraic inverses on the parent credit's balance, which is what
//! keeps the ledger consistent across arbitrary add/delete sequences.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::model::{checked_amount, from_cents, Payment};
use crate::store::Ledger;

impl Ledger {
    /// Records a payment against a credit. The payment row, the balance
    /// decrement and the status flip commit as one transaction; the credit
    /// lookup is scoped to the owning client, so a mismatched pair reads as
    /// not found.
    pub fn add_payment(
        &mut self,
        credit_id: i64,
        client_id: i64,
        date: NaiveDate,
        amount: Decimal,
        note: Option<&str>,
    ) -> Result<i64> {
        let cents = checked_amount(amount)?;
        let tx = self.conn.transaction()?;

        let remaining: i64 = tx
            .query_row(
                "SELECT remaining FROM credits WHERE id = ? AND client_id = ?",
                params![credit_id, client_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(LedgerError::CreditNotFound(credit_id))?;
        if cents > remaining {
            return Err(LedgerError::Overpayment {
                amount: from_cents(cents),
                remaining: from_cents(remaining),
            });
        }

        tx.execute(
            "INSERT INTO payments (credit_id, client_id, date, amount, note)
             VALUES (?, ?, ?, ?, ?)",
            params![credit_id, client_id, date, cents, note],
        )?;
        let payment_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE credits SET remaining = remaining - ? WHERE id = ?",
            params![cents, credit_id],
        )?;
        tx.execute(
            "UPDATE credits SET status = 'settled' WHERE id = ? AND remaining <= 0",
            params![credit_id],
        )?;
        tx.commit()?;

        debug!(payment = payment_id, credit = credit_id, amount = %from_cents(cents), "payment recorded");
        Ok(payment_id)
    }

    /// Deletes a payment and restores its amount to the parent credit,
    /// reopening the credit if the balance comes back above zero. Payments
    /// are never edited in place; corrections are delete + recreate.
    pub fn delete_payment(&mut self, payment_id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;

        let row = tx
            .query_row(
                "SELECT amount, credit_id FROM payments WHERE id = ?",
                params![payment_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let (amount, credit_id) = row.ok_or(LedgerError::PaymentNotFound(payment_id))?;

        tx.execute("DELETE FROM payments WHERE id = ?", params![payment_id])?;
        tx.execute(
            "UPDATE credits SET remaining = remaining + ? WHERE id = ?",
            params![amount, credit_id],
        )?;
        tx.execute(
            "UPDATE credits SET status = 'open' WHERE id = ? AND remaining > 0",
            params![credit_id],
        )?;
        tx.commit()?;

        debug!(payment = payment_id, credit = credit_id, amount = %from_cents(amount), "payment deleted");
        Ok(())
    }

    /// Payments recorded against a credit, in chronological order.
    pub fn list_payments(&self, credit_id: i64) -> Result<Vec<Payment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, credit_id, client_id, date, amount, note
             FROM payments
             WHERE credit_id = ?
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(params![credit_id], |row| {
            Ok(Payment {
                id: row.get(0)?,
                credit_id: row.get(1)?,
                client_id: row.get(2)?,
                date: row.get(3)?,
                amount: from_cents(row.get(4)?),
                note: row.get(5)?,
            })
        })?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?);
        }
        Ok(payments)
    }
}
