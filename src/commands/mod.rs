pub mod extract;
pub mod merge;
