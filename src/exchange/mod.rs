//! Export/import exchange module
//!
//! Serializes the full card collection into a versioned JSON document and
//! reconstructs a collection from one. Import always mints fresh ids and
//! rewrites cross-references so merged batches never collide with existing
//! cards (or with each other).

use thiserror::Error;

mod document;
mod import;

pub use document::{export_document, ExchangeDocument, EXPORT_VERSION};
pub use import::{import_document, import_from_file};

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The import file could not be read at all.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure while writing an export.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload was read but is not a valid exchange document: not JSON,
    /// missing the `cards` field, or `cards` is not a card array.
    #[error("Malformed exchange document: {0}")]
    MalformedDocument(String),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
