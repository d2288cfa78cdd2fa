//! Traits for collaborators that live outside the notification subsystem.

pub mod navigator;

pub use navigator::{Navigator, NoopNavigator};
