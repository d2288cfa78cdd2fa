//! # brdflow-entity
//!
//! Document models for BRD Flow. Request and comment structs mirror the
//! documents held by the external document store (field names are
//! camelCase on the wire). [`notification::Notification`] is a derived
//! value built client-side and never stored as its own document.

pub mod comment;
pub mod notification;
pub mod request;
