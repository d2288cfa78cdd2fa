//! # brdflow-database
//!
//! Interface to the hosted document store that holds BRD requests and
//! their comments, plus an in-process implementation with live queries.

pub mod fixture;
pub mod live;
pub mod memory;
pub mod query;
pub mod store;

pub use live::LiveQuery;
pub use memory::MemoryDocumentStore;
pub use query::{CommentQuery, RequestFilter};
pub use store::DocumentStore;
