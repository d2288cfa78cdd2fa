//! Core type definitions used across the BRD Flow workspace.

pub mod id;

pub use id::*;
