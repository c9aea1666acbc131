//! Animation error types

use thiserror::Error;

/// Errors raised while building an animation or resolving an easing curve
///
/// Only construction can fail. Once a handle exists, every lifecycle
/// operation is infallible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A numeric parameter was out of range (duration, start/end value, bezier control point)
    #[error("Invalid animation parameter: {0}")]
    InvalidParameter(String),

    /// The easing identifier is not in the catalog
    #[error("Unknown easing identifier: {0:?}")]
    UnknownEasing(String),
}

/// Result type for animation construction
pub type Result<T> = std::result::Result<T, AnimationError>;
