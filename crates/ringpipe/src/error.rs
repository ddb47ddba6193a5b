use thiserror::Error;

/// Error types for the non-blocking pipe operations.
///
/// The blocking operations never return these: end-of-stream and
/// sunk data are normal terminal conditions there, reported through the
/// element counts instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipeError {
    /// A bounded pipe has no room for even one element right now.
    #[error("pipe is full")]
    Full,

    /// No buffered elements, but producer handles are still alive.
    #[error("pipe is empty")]
    Empty,

    /// Every consumer handle has been released; pushed data would be
    /// unobservable.
    #[error("all consumer handles have been released")]
    Disconnected,

    /// A buffer growth failed to allocate. The pipe no longer accepts
    /// elements; buffered data stays readable.
    #[error("buffer growth failed: allocation exhausted")]
    GrowthFailed,
}

impl PipeError {
    /// Returns `true` if retrying later can succeed (e.g. [`Full`](Self::Full)).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full | Self::Empty)
    }

    /// Returns `true` if this error indicates the pipe is permanently
    /// unwritable.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::GrowthFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(PipeError::Full.is_recoverable());
        assert!(PipeError::Empty.is_recoverable());
        assert!(!PipeError::Disconnected.is_recoverable());

        assert!(PipeError::Disconnected.is_terminal());
        assert!(PipeError::GrowthFailed.is_terminal());
        assert!(!PipeError::Full.is_terminal());
    }
}
