//! Interactive widget state, kept server-side and driven by query
//! parameters.

pub mod carousel;
pub mod faq;

pub use carousel::Carousel;
pub use faq::{FaqAccordion, FaqItemState};
