//! Structured error types for the archiver.
//!
//! Every failure aborts the current run; runs are operator-initiated and
//! idempotent to re-run, so there is no retry or partial-result salvage.

use thiserror::Error;

/// Primary error type for provider and store operations
#[derive(Error, Debug)]
pub enum Error {
    /// Login or logout rejected by the provider
    #[error("authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Credentials map to something other than exactly one account
    #[error("unsupported credentials: expected exactly one account, got {count}")]
    UnsupportedAccount { count: usize },

    /// Any other non-success provider response
    #[error("{operation} failed ({status}): {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// A record did not have the shape the provider contract promises
    #[error("invariant violated: {message}")]
    Invariant { message: String },

    /// Document store upsert rejected
    #[error("failed to import {id} ({status}): {body}")]
    Import {
        id: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using Error
pub type Result<T> = std::result::Result<T, Error>;
