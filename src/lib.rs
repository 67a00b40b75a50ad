//! Driver logic shared by the `cgd-export` and `cgd-import` binaries.

pub mod export;
pub mod import;
pub mod logging;
