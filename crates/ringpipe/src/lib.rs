//! ringpipe - Bounded MPMC Blocking Pipe
//!
//! A thread-safe multi-producer multi-consumer pipe over fixed-size
//! (`Copy`) elements: a growable ring buffer behind a mutex, two condition
//! variables for the producer/consumer handoff, and separate reference
//! counts for the two sides so each can observe the other's departure.
//!
//! # Key Features
//!
//! - Batch push/pop with wrap-aware copies (at most two segments per call)
//! - Unbounded pipes grow geometrically and shrink back when drained
//! - Two-sided shutdown: releasing the last producer turns blocked pops
//!   into end-of-stream; releasing the last consumer turns pushes into
//!   no-ops
//! - Opportunistic spin (crossbeam `Backoff`) before parking readers
//!
//! # Example
//!
//! ```
//! use ringpipe::Pipe;
//! use std::thread;
//!
//! let pipe = Pipe::<u64>::bounded(1024);
//! let tx = pipe.producer();
//! let rx = pipe.consumer();
//! drop(pipe);
//!
//! let writer = thread::spawn(move || {
//!     for chunk in (0..10_000u64).collect::<Vec<_>>().chunks(97) {
//!         tx.send(chunk);
//!     }
//! });
//!
//! let mut buf = [0u64; 256];
//! let mut total = 0u64;
//! loop {
//!     let n = rx.recv(&mut buf);
//!     if n == 0 {
//!         break; // every producer is gone and the pipe is drained
//!     }
//!     total += buf[..n].iter().sum::<u64>();
//! }
//! writer.join().unwrap();
//! assert_eq!(total, (0..10_000u64).sum());
//! ```

mod config;
mod error;
mod handle;
mod invariants;
mod metrics;
mod pipe;
mod ring;

pub use config::{Config, DEFAULT_INITIAL_CAPACITY, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::PipeError;
pub use handle::{Consumer, Producer};
pub use metrics::MetricsSnapshot;
pub use pipe::Pipe;
