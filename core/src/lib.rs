//! Core library for the CGD account archiver: the authenticated provider
//! client and the document store upsert client.

pub mod client;
pub mod error;
pub mod model;
pub mod store;

// Re-exports for convenience
pub use client::CgdClient;
pub use error::{Error, Result};
pub use store::StoreClient;
