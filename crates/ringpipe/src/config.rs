/// Default number of element slots allocated when a pipe is created.
///
/// Small enough to be cheap for short-lived pipes, large enough that a
/// handful of cache lines' worth of elements fit before the first growth.
pub const DEFAULT_INITIAL_CAPACITY: usize = 32;

/// Configuration for a [`Pipe`](crate::Pipe).
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum number of buffered elements. `0` means unbounded: pushes
    /// never block and the buffer grows on demand.
    pub limit: usize,
    /// Number of element slots allocated up front. Clamped to `limit` on
    /// bounded pipes.
    pub initial_capacity: usize,
    /// Enable metrics collection (slight overhead).
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    ///
    /// # Panics
    ///
    /// Panics if `initial_capacity` is 0.
    pub const fn new(limit: usize, initial_capacity: usize, enable_metrics: bool) -> Self {
        assert!(initial_capacity > 0, "initial_capacity must be at least 1");

        Self {
            limit,
            initial_capacity,
            enable_metrics,
        }
    }

    /// An unbounded pipe: pushes grow the buffer instead of blocking.
    pub const fn unbounded() -> Self {
        Self::new(0, DEFAULT_INITIAL_CAPACITY, false)
    }

    /// A bounded pipe holding at most `limit` elements.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is 0; use [`Config::unbounded`] for an unbounded pipe.
    pub const fn bounded(limit: usize) -> Self {
        assert!(limit > 0, "a bounded pipe needs a non-zero limit");
        Self::new(limit, DEFAULT_INITIAL_CAPACITY, false)
    }

    /// Returns `true` if pushes block (or chunk) at a fixed occupancy.
    #[inline]
    pub const fn is_bounded(&self) -> bool {
        self.limit > 0
    }

    /// The capacity the pipe's buffer starts out with.
    #[inline]
    pub(crate) fn start_capacity(&self) -> usize {
        if self.limit > 0 {
            self.initial_capacity.min(self.limit)
        } else {
            self.initial_capacity
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Low latency configuration: a fixed 4K-element buffer allocated up
/// front, so pushes never pay a reallocation and never shrink.
pub const LOW_LATENCY_CONFIG: Config = Config::new(1 << 12, 1 << 12, false);

/// High throughput configuration: unbounded, with a large initial
/// allocation so early batches trigger fewer growths.
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(0, 1 << 13, false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let config = Config::default();
        assert_eq!(config.limit, 0);
        assert!(!config.is_bounded());
        assert_eq!(config.start_capacity(), DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    fn test_bounded_clamps_start_capacity() {
        let config = Config::bounded(4);
        assert!(config.is_bounded());
        assert_eq!(config.start_capacity(), 4);

        let config = Config::bounded(1000);
        assert_eq!(config.start_capacity(), DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "initial_capacity")]
    fn test_zero_initial_capacity_rejected() {
        let _ = Config::new(0, 0, false);
    }

    #[test]
    fn test_presets() {
        // Fixed-size: the whole limit is allocated up front.
        assert!(LOW_LATENCY_CONFIG.is_bounded());
        assert_eq!(LOW_LATENCY_CONFIG.start_capacity(), LOW_LATENCY_CONFIG.limit);

        assert!(!HIGH_THROUGHPUT_CONFIG.is_bounded());
        assert!(HIGH_THROUGHPUT_CONFIG.start_capacity() > DEFAULT_INITIAL_CAPACITY);
    }
}
