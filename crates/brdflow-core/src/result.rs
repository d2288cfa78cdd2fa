//! Convenience result type alias for BRD Flow.

use crate::error::AppError;

/// A specialized `Result` type for BRD Flow operations.
pub type AppResult<T> = Result<T, AppError>;
