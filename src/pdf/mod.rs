pub mod document;
pub mod extract;
pub mod merge;

#[cfg(test)]
pub(crate) mod fixtures;

pub use document::{OutputDocument, SourceDocument};
pub use extract::extract_pages;
pub use merge::{merge_documents, MergeInput};
