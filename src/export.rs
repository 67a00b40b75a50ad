//! Export driver.
//!
//! Drains a record stream to newline-delimited JSON: one object per line, in
//! stream order, flushed record by record so unbounded histories never
//! accumulate in memory.

use std::io::Write;

use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::info;

use cgd_archiver_core::{model, Result};

/// Writes each enriched transaction as one JSON line, logging a progress
/// summary per record at info level.
pub async fn write_transactions<S, W>(mut records: S, out: &mut W) -> Result<()>
where
    S: Stream<Item = Result<Value>> + Unpin,
    W: Write,
{
    while let Some(transaction) = records.next().await {
        let transaction = transaction?;
        if tracing::enabled!(tracing::Level::INFO) {
            let amount = transaction.get("amount").and_then(Value::as_i64).unwrap_or(0);
            info!(
                "transaction {} {:>10} {}",
                model::record_str(&transaction, "valueDate"),
                model::format_amount(amount, model::record_str(&transaction, "transactionType")),
                model::record_str(&transaction, "description"),
            );
        }
        writeln!(out, "{}", serde_json::to_string(&transaction)?)?;
        out.flush()?;
    }
    Ok(())
}

/// Writes each enriched document as one JSON line, in provider order.
pub async fn write_documents<S, W>(mut records: S, out: &mut W) -> Result<()>
where
    S: Stream<Item = Result<Value>> + Unpin,
    W: Write,
{
    while let Some(document) = records.next().await {
        let document = document?;
        info!(
            "document {} {}",
            model::record_str(&document, "issueDate"),
            model::record_str(&document, "name"),
        );
        writeln!(out, "{}", serde_json::to_string(&document)?)?;
        out.flush()?;
    }
    Ok(())
}
