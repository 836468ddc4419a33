//! Customer credit ledger backed by SQLite.
//!
//! Clients receive credits (amounts owed) and pay them down with partial
//! payments ("versements"). The crate owns the derived quantities: a
//! credit's `remaining` balance always equals its principal minus the sum
//! of its payments, and its status is `settled` exactly when that balance
//! reaches zero. Every mutation runs as a single SQLite transaction, so a
//! failure at any step leaves the ledger untouched.
//!
//! ```no_run
//! use ardoise::{CreditFilter, Ledger};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! # fn main() -> ardoise::Result<()> {
//! let mut ledger = Ledger::open("ardoise.db")?;
//! let client_id = ledger.create_client("Ibrahim", Some("0556000000"), None, None)?;
//! let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
//! let credit_id = ledger.create_credit("Ibrahim", date, Decimal::new(150_000, 2), Some("avance"))?;
//! ledger.add_payment(credit_id, client_id, date, Decimal::new(50_000, 2), None)?;
//! for row in ledger.list_credits(&CreditFilter::default())? {
//!     println!("{} owes {}", row.client_name, row.remaining);
//! }
//! # Ok(())
//! # }
//! ```

mod clients;
mod credits;
mod error;
mod model;
mod payments;
mod store;

pub use error::{LedgerError, Result};
pub use model::{
    Client, ClientAccount, ClientEdit, Credit, CreditEdit, CreditFilter, CreditRow, CreditStatus,
    Payment,
};
pub use store::Ledger;
