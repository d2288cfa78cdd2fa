//! BRD request documents.

pub mod model;
pub mod status;

pub use model::BrdRequest;
pub use status::RequestStatus;
