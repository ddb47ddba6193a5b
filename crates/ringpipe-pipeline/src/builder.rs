use crate::pipeline::{Pipeline, PipelineOutput};
use crate::StageConfig;
use ringpipe::{Consumer, Pipe, Producer};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// =============================================================================
// STAGE WIRING
// =============================================================================
//
// Each `.stage()` call threads a fresh pipe between the current tail and a
// newly spawned worker. The worker owns its input consumer and its output
// producer; both are released by `Drop` on every exit path, so an
// unwinding transform still cascades end-of-stream downstream instead of
// wedging the rest of the chain.
//
// A parallel stage shares one input pipe and one output pipe among
// `width` workers. Elements go to whichever worker pops them first, so
// output ordering across workers is unspecified; the output pipe sees
// end-of-stream once the last worker drains the shared input and exits.
//
// =============================================================================

/// Builds a chain of transform stages connected by pipes.
///
/// The first type parameter is the element type fed into the pipeline,
/// the second the element type of the current tail. Each [`stage`] call
/// can change the tail type; the compiler enforces that adjacent stages
/// agree, which is what makes a mis-typed chain unrepresentable.
///
/// [`stage`]: Self::stage
///
/// # Example
///
/// ```
/// use ringpipe_pipeline::PipelineBuilder;
///
/// let line = PipelineBuilder::<u32>::new()
///     .stage(|elems, out| {
///         let doubled: Vec<u32> = elems.iter().map(|x| x * 2).collect();
///         out.send(&doubled);
///     })
///     .stage(|elems, out| {
///         let bumped: Vec<u64> = elems.iter().map(|x| u64::from(*x) + 1).collect();
///         out.send(&bumped);
///     })
///     .build();
///
/// line.input.send(&[1, 2, 3]);
/// drop(line.input);
///
/// let mut buf = [0u64; 8];
/// assert_eq!(line.output.recv(&mut buf), 3);
/// assert_eq!(&buf[..3], &[3, 5, 7]);
/// ```
pub struct PipelineBuilder<I: Copy, T: Copy = I> {
    input: Producer<I>,
    tail: Consumer<T>,
    workers: Vec<JoinHandle<()>>,
    config: StageConfig,
}

impl<I: Copy + Send + 'static> PipelineBuilder<I> {
    /// Starts a pipeline with the default [`StageConfig`].
    pub fn new() -> Self {
        Self::with_config(StageConfig::default())
    }

    /// Starts a pipeline with a custom [`StageConfig`].
    pub fn with_config(config: StageConfig) -> Self {
        let (input, tail) = stage_pipe(&config);
        Self {
            input,
            tail,
            workers: Vec::new(),
            config,
        }
    }
}

impl<I: Copy + Send + 'static> Default for PipelineBuilder<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Copy + Send + 'static, T: Copy + Send + 'static> PipelineBuilder<I, T> {
    /// Appends a stage running `transform` on one worker thread.
    ///
    /// The transform receives each popped batch and the producer for the
    /// stage's output pipe; it may push any number of elements, including
    /// none. It must not assume anything about batch boundaries.
    pub fn stage<U, F>(mut self, transform: F) -> PipelineBuilder<I, U>
    where
        U: Copy + Send + 'static,
        F: FnMut(&[T], &Producer<U>) + Send + 'static,
    {
        let (out_producer, out_consumer) = stage_pipe(&self.config);
        let input = self.tail;
        let batch_len = self.config.batch_len;

        self.workers.push(thread::spawn(move || {
            run_stage(&input, &out_producer, batch_len, transform);
        }));

        PipelineBuilder {
            input: self.input,
            tail: out_consumer,
            workers: self.workers,
            config: self.config,
        }
    }

    /// Appends a stage fanned out over `width` worker threads sharing one
    /// input pipe and one output pipe.
    ///
    /// Each element is processed by exactly one worker, but which worker
    /// pops which batch is up to the scheduler: output ordering across
    /// workers is unspecified.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0.
    pub fn parallel_stage<U, F>(mut self, width: usize, transform: F) -> PipelineBuilder<I, U>
    where
        U: Copy + Send + 'static,
        F: Fn(&[T], &Producer<U>) + Send + Sync + 'static,
    {
        assert!(width > 0, "a parallel stage needs at least one worker");

        let (out_producer, out_consumer) = stage_pipe(&self.config);
        let transform = Arc::new(transform);
        let input = self.tail;
        let batch_len = self.config.batch_len;

        for _ in 0..width {
            let input = input.clone();
            let output = out_producer.clone();
            let transform = Arc::clone(&transform);
            self.workers.push(thread::spawn(move || {
                run_stage(&input, &output, batch_len, |elems, out| (*transform)(elems, out));
            }));
        }

        // The workers now hold the only handles on this stage's pipes.
        drop(input);
        drop(out_producer);

        PipelineBuilder {
            input: self.input,
            tail: out_consumer,
            workers: self.workers,
            config: self.config,
        }
    }

    /// Finishes the chain, yielding the head producer and tail consumer.
    pub fn build(self) -> Pipeline<I, T> {
        Pipeline {
            input: self.input,
            output: PipelineOutput::new(self.tail, self.workers),
        }
    }
}

/// Creates one inter-stage pipe, pre-sized for a couple of batches, and
/// hands back its two endpoints. The root is dropped here so the pipe
/// lives exactly as long as the stage handles.
fn stage_pipe<T: Copy>(config: &StageConfig) -> (Producer<T>, Consumer<T>) {
    let pipe = Pipe::with_config(config.pipe);
    pipe.reserve(2 * config.batch_len);
    (pipe.producer(), pipe.consumer())
}

/// One stage worker: pop a batch, transform it, repeat until the input
/// reports end-of-stream.
fn run_stage<T, U, F>(input: &Consumer<T>, output: &Producer<U>, batch_len: usize, mut transform: F)
where
    T: Copy,
    U: Copy,
    F: FnMut(&[T], &Producer<U>),
{
    let mut batch = Vec::with_capacity(batch_len);
    loop {
        let n = input.recv_into(&mut batch, batch_len);
        if n == 0 {
            break;
        }
        transform(&batch, output);
    }
}
