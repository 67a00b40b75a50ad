//! Import driver.
//!
//! Replays an exported NDJSON file into the document store, upserting each
//! record by its stable id. The first rejected upsert aborts the whole run;
//! re-running after a fix is idempotent.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::info;

use cgd_archiver_core::{model, Result, StoreClient};

#[derive(Debug, Clone, Copy)]
pub enum RecordKind {
    Transactions,
    Documents,
}

/// One import target: which file feeds which index, keyed by which field.
pub struct ImportProfile {
    pub kind: RecordKind,
    pub file: &'static str,
    pub index: &'static str,
    pub id_field: &'static str,
    pub pipeline: Option<&'static str>,
}

pub const TRANSACTIONS: ImportProfile = ImportProfile {
    kind: RecordKind::Transactions,
    file: "transactions.json",
    index: "transactions",
    id_field: "transactionId",
    pipeline: None,
};

/// Documents route through the server-side `document` ingest pipeline, which
/// derives extra fields (e.g. extracted text) from the base64 contents.
pub const DOCUMENTS: ImportProfile = ImportProfile {
    kind: RecordKind::Documents,
    file: "documents.json",
    index: "documents",
    id_field: "documentId",
    pipeline: Some("document"),
};

/// Upserts every record in the file, returning how many were imported.
pub async fn import_file(
    store: &StoreClient,
    profile: &ImportProfile,
    path: &Path,
) -> Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut imported = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(&line)?;
        let id = model::record_id(&record, profile.id_field)?.to_string();
        log_record(profile.kind, &record);
        store
            .upsert(profile.index, &id, profile.pipeline, &record)
            .await?;
        imported += 1;
    }
    Ok(imported)
}

fn log_record(kind: RecordKind, record: &Value) {
    match kind {
        RecordKind::Transactions => {
            if tracing::enabled!(tracing::Level::INFO) {
                let amount = record.get("amount").and_then(Value::as_i64).unwrap_or(0);
                info!(
                    "importing transaction {} {:>10} {}",
                    model::record_str(record, "valueDate"),
                    model::format_amount(amount, model::record_str(record, "transactionType")),
                    model::record_str(record, "description"),
                );
            }
        }
        RecordKind::Documents => {
            info!(
                "importing document {} {}",
                model::record_str(record, "issueDate"),
                model::record_str(record, "name"),
            );
        }
    }
}
