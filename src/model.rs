//! Entities, typed field selectors and fixed-point money conversion.
//!
//! Amounts are stored as integer cents so SQL sums and comparisons are
//! exact, and exposed as `rust_decimal::Decimal` at the API boundary.
//! Binary floating point never enters the ledger.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Credit lifecycle state, derived from the remaining balance: a credit is
/// `settled` iff its remaining balance is zero. Deleting a payment can take
/// a settled credit back to `open`; that reversal is intentional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Open,
    Settled,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Open => "open",
            CreditStatus::Settled => "settled",
        }
    }

    pub(crate) fn from_db(value: &str) -> Option<Self> {
        match value {
            "open" => Some(CreditStatus::Open),
            "settled" => Some(CreditStatus::Settled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub locality: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

/// A client row with its live outstanding balance, summed over open credits.
/// The total is derived at read time and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ClientAccount {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub locality: Option<String>,
    pub note: Option<String>,
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credit {
    pub id: i64,
    pub client_id: i64,
    pub date: NaiveDate,
    pub principal: Decimal,
    pub remaining: Decimal,
    pub reason: Option<String>,
    pub status: CreditStatus,
}

/// A credit as listed to callers: joined with the client name and carrying
/// the derived `paid` total, so `remaining == principal - paid` can be
/// checked independently of the stored balance.
#[derive(Debug, Clone, Serialize)]
pub struct CreditRow {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub date: NaiveDate,
    pub principal: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub reason: Option<String>,
    pub status: CreditStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub credit_id: i64,
    pub client_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub note: Option<String>,
}

/// Filter for credit listings. All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreditFilter {
    pub status: Option<CreditStatus>,
    pub client_id: Option<i64>,
    /// Matched with LIKE against client name, reason and date.
    pub search: Option<String>,
}

/// An edit to a single credit field, carrying the typed new value.
/// `remaining`, `status` and computed totals are not representable here,
/// so they cannot be edited at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CreditEdit {
    Date(NaiveDate),
    Reason(Option<String>),
    Principal(Decimal),
}

/// An edit to a single client field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ClientEdit {
    Name(String),
    Phone(Option<String>),
    Locality(Option<String>),
    Note(Option<String>),
}

/// Converts a decimal amount to integer cents, rounding to two decimal
/// places (midpoint away from zero). None on overflow.
pub(crate) fn to_cents(amount: Decimal) -> Option<i64> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Validates a caller-supplied amount and converts it to cents. Rejects
/// anything that is not strictly positive once rounded to cents.
pub(crate) fn checked_amount(amount: Decimal) -> Result<i64> {
    let cents = to_cents(amount).ok_or(LedgerError::InvalidAmount(amount))?;
    if cents <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(cents)
}
