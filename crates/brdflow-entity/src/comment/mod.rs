//! Comment documents.

pub mod model;

pub use model::Comment;
