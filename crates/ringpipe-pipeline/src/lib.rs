//! Typed stage pipelines over [`ringpipe`].
//!
//! A pipeline fuses a sequence of transforms into a chain of pipes, each
//! driven by its own worker thread: every stage pops batches from its
//! input pipe, hands them to the transform together with a producer for
//! its output pipe, and exits once the input reports end-of-stream. A
//! stage can also be fanned out over several workers sharing its pipes,
//! trading output ordering for parallelism.
//!
//! Shutdown is driven entirely by handle release: dropping the pipeline's
//! input producer lets the first stage drain and exit, which releases its
//! output producer, and so on down the chain until the output consumer
//! sees end-of-stream. Dropping the output then joins the workers.
//!
//! # Example
//!
//! ```
//! use ringpipe_pipeline::{parallel, PipelineBuilder};
//!
//! // A linear chain with a typed boundary between the stages.
//! let line = PipelineBuilder::<u32>::new()
//!     .stage(|elems, out| {
//!         let squared: Vec<u64> = elems.iter().map(|x| u64::from(*x) * u64::from(*x)).collect();
//!         out.send(&squared);
//!     })
//!     .build();
//!
//! line.input.send(&[1, 2, 3, 4]);
//! drop(line.input);
//!
//! let mut buf = [0u64; 8];
//! let mut got = Vec::new();
//! loop {
//!     let n = line.output.recv(&mut buf);
//!     if n == 0 {
//!         break;
//!     }
//!     got.extend_from_slice(&buf[..n]);
//! }
//! assert_eq!(got, vec![1, 4, 9, 16]);
//!
//! // The same transform fanned out over four workers.
//! let fan = parallel(4, |elems: &[u32], out| {
//!     let negated: Vec<i64> = elems.iter().map(|x| -i64::from(*x)).collect();
//!     out.send(&negated);
//! });
//! fan.input.send(&[5]);
//! drop(fan.input);
//! let mut one = [0i64; 1];
//! assert_eq!(fan.output.recv(&mut one), 1);
//! assert_eq!(one[0], -5);
//! ```

mod builder;
mod config;
mod pipeline;

pub use builder::PipelineBuilder;
pub use config::StageConfig;
pub use pipeline::{Pipeline, PipelineOutput};

use ringpipe::Producer;

/// Builds a single-stage pipeline fanned out over `width` workers.
///
/// Convenience for the common "one hot transform, many cores" shape;
/// equivalent to `PipelineBuilder::new().parallel_stage(width, transform).build()`.
///
/// # Panics
///
/// Panics if `width` is 0.
pub fn parallel<T, U, F>(width: usize, transform: F) -> Pipeline<T, U>
where
    T: Copy + Send + 'static,
    U: Copy + Send + 'static,
    F: Fn(&[T], &Producer<U>) + Send + Sync + 'static,
{
    PipelineBuilder::<T>::new()
        .parallel_stage(width, transform)
        .build()
}
