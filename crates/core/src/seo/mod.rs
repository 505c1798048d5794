//! Search-engine and answer-engine helpers: meta tag sizing, voice-search
//! copy and schema.org JSON-LD.

pub mod jsonld;
pub mod meta;
pub mod voice;

pub use meta::{fit_description, fit_title, PageMeta};
pub use voice::truncate_at_word;
