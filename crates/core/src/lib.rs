//! Content lake, typed content model and site helpers for Sobremesa.

pub mod client;
pub mod content;
pub mod document;
pub mod events;
pub mod listing;
pub mod mutation;
pub mod portable_text;
pub mod qr;
pub mod queries;
pub mod schema;
pub mod search;
pub mod seo;
pub mod stats;
pub mod store;
pub mod ui;

use thiserror::Error;

pub use client::ContentClient;
pub use document::{Document, ValidationError};
pub use store::{Perspective, Store, StoreError};

/// Failures while reading typed content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Query(#[from] sobremesa_groq::QueryError),
    #[error("unexpected query result shape: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
