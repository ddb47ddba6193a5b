use ringpipe::Config;

/// Configuration shared by every stage of a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StageConfig {
    /// Upper bound on the number of elements handed to one transform call.
    pub batch_len: usize,
    /// Configuration for the pipes threaded between stages.
    pub pipe: Config,
}

impl StageConfig {
    /// Default number of elements per transform call.
    pub const DEFAULT_BATCH_LEN: usize = 256;

    /// Creates a stage configuration.
    ///
    /// # Panics
    ///
    /// Panics if `batch_len` is 0.
    pub const fn new(batch_len: usize, pipe: Config) -> Self {
        assert!(batch_len > 0, "batch_len must be at least 1");
        Self { batch_len, pipe }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BATCH_LEN, Config::unbounded())
    }
}
