//! Typed envelopes for the provider responses the archiver consumes itself.
//!
//! Transaction and document records are deliberately *not* typed: they pass
//! through as raw `serde_json::Value` maps so that every field the provider
//! sends survives the trip to the document store unchanged.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Login response envelope (`includeAccountsInResponse=true`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub customer_name: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// The single account the credentials resolve to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Opaque key embedded (URL-escaped) in all account-scoped paths.
    pub full_account_key: String,
    pub iban: String,
    pub description: String,
    pub account_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_balances_list: Vec<Balance>,
}

/// One per-currency balance entry, in minor currency units.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub book_balance: i64,
    pub currency: String,
}

/// Renders minor currency units as a decimal (1234 -> "12.34").
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

/// Renders a transaction amount with the sign suffix implied by its type.
/// The provider reports magnitudes; direction lives in `transactionType`,
/// which is either `Credit` or `Debit`.
pub fn format_amount(amount: i64, transaction_type: &str) -> String {
    let suffix = if transaction_type == "Credit" { '+' } else { '-' };
    format!("{}{suffix}", format_minor_units(amount))
}

/// Extracts a required string id field from a passthrough record.
pub fn record_id<'a>(record: &'a Value, field: &str) -> Result<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Invariant {
            message: format!("record is missing its {field} field"),
        })
}

/// Best-effort string field lookup, for diagnostics only.
pub fn record_str<'a>(record: &'a Value, field: &str) -> &'a str {
    record.get(field).and_then(Value::as_str).unwrap_or("")
}
