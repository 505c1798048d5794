pub mod executor;
pub mod patch;
pub mod types;

pub use executor::{Committer, MutationError};
pub use patch::{apply_patch, PatchError};
pub use types::{Mutation, MutationResponse, MutationResult, PatchMutation, PatchOperations};
