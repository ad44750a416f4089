/// Convenience result type used across the crate.
pub type RasterResult<T> = Result<T, RasterError>;

/// Top-level error taxonomy.
///
/// `NoMemory` and `Unsupported` are recoverable: callers fall back to immediate execution or
/// sequential replay. `Replay` means a backend rejected an entry that was already accepted into
/// the journal and is not recovered locally.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// Allocation failure while building or storing a journal entry.
    #[error("out of memory")]
    NoMemory,

    /// The requested path declines the operation; use the alternative path.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The destination surface can no longer be modified.
    #[error("surface finished")]
    Finished,

    /// Invalid caller input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A backend failed while replaying logged operations.
    #[error("replay error: {0}")]
    Replay(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RasterError {
    /// Build a [`RasterError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`RasterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RasterError::Replay`] value.
    pub fn replay(msg: impl Into<String>) -> Self {
        Self::Replay(msg.into())
    }

    /// Return `true` for errors that mean "try the other path" rather than failure.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::NoMemory | Self::Unsupported(_))
    }
}

impl From<std::collections::TryReserveError> for RasterError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::NoMemory
    }
}

/// Successful outcome of a single drawing call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawStatus {
    /// Pixels may have changed.
    Drawn,
    /// The call was a no-op (fully clipped, empty shape, transparent source with a bounded
    /// operator, ...).
    NothingToDo,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
