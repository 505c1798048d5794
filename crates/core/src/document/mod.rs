pub mod id;
pub mod model;
pub mod validate;

pub use id::DocumentIdKind;
pub use model::{Document, DocumentRow};
pub use validate::{validate_document, ValidationError, ValidationIssue};
