//! # brdflow-core
//!
//! Core crate for BRD Flow. Contains configuration schemas, string-keyed
//! document identifiers, collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other BRD Flow crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
