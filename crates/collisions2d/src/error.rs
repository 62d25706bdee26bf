//! Error types for the collision system

use crate::foundation::collections::BodyHandle;
use thiserror::Error;

/// Broad classification of a [`CollisionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An id or body handle is not tracked
    NotFound,
    /// Shape parameters were rejected at construction time
    InvalidShape,
}

/// Errors returned by bodies, the BVH and the collision system
///
/// All of these are local, recoverable conditions. Geometric degeneracies
/// (zero-length axes, coincident centers) are never reported here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// No bodies are registered under this id
    #[error("No body registered under id '{0}'")]
    UnknownId(String),

    /// The handle does not refer to a tracked body
    #[error("Body {0:?} is not tracked")]
    UnknownBody(BodyHandle),

    /// Shape parameters that would produce NaN or empty geometry
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

impl CollisionError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownId(_) | Self::UnknownBody(_) => ErrorKind::NotFound,
            Self::InvalidShape(_) => ErrorKind::InvalidShape,
        }
    }

    /// Shorthand for `kind() == ErrorKind::NotFound`
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CollisionError>;
