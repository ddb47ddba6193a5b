use crate::invariants::debug_assert_refcount_live;
use crate::metrics::Metrics;
use crate::ring::RingBuf;
use crate::{Config, Consumer, MetricsSnapshot, PipeError, Producer};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

// =============================================================================
// HANDOFF PROTOCOL
// =============================================================================
//
// One mutex guards every mutable field: the ring, both refcounts, and the
// broken flag. Two condition variables carry the two wait reasons:
//
//   not_empty  - readers park here while the ring is empty and producers
//                are alive. Signalled by every push and broadcast by the
//                release of the last producer handle.
//   not_full   - writers park here while a bounded ring sits at its limit
//                and consumers are alive. Signalled by every pop and
//                broadcast by the release of the last consumer handle.
//
// Every wait sits in a loop that re-checks its predicate under the mutex,
// so spurious wakeups and stolen wakeups are both harmless. A transfer of
// a single element wakes one waiter; anything that can satisfy more than
// one waiter at once (a batch, a refcount hitting zero) broadcasts.
//
// End-of-stream ordering: a pop reports EOF only when the ring is empty
// AND the producer refcount is zero, so data buffered before the last
// producer release is always drained first.
//
// =============================================================================

pub(crate) struct PipeState<T> {
    ring: RingBuf<T>,
    /// Live producer handles, plus one credit held by the root [`Pipe`].
    producers: usize,
    /// Live consumer handles, plus one credit held by the root [`Pipe`].
    consumers: usize,
    /// Set when a growth allocation fails; pushes then behave as if every
    /// consumer had been released. Buffered data stays readable.
    broken: bool,
}

pub(crate) struct Core<T> {
    state: Mutex<PipeState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    config: Config,
    metrics: Metrics,
}

impl<T: Copy> Core<T> {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            state: Mutex::new(PipeState {
                ring: RingBuf::with_capacity(config.start_capacity()),
                producers: 1,
                consumers: 1,
                broken: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            config,
            metrics: Metrics::new(),
        }
    }

    /// Locks the state, recovering from poison.
    ///
    /// The only panics possible under this lock are debug assertions; the
    /// state they leave behind is still safe to drain and shut down.
    fn lock(&self) -> MutexGuard<'_, PipeState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_not_empty<'a>(&self, guard: MutexGuard<'a, PipeState<T>>) -> MutexGuard<'a, PipeState<T>> {
        self.not_empty
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_not_full<'a>(&self, guard: MutexGuard<'a, PipeState<T>>) -> MutexGuard<'a, PipeState<T>> {
        self.not_full
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------------------------------------------------
    // REFCOUNTS
    // ---------------------------------------------------------------------

    pub(crate) fn attach_producer(&self) {
        self.lock().producers += 1;
    }

    pub(crate) fn release_producer(&self) {
        let mut state = self.lock();
        debug_assert_refcount_live!(state.producers, "producer");
        state.producers -= 1;
        let last = state.producers == 0;
        drop(state);

        if last {
            // Every parked reader must observe end-of-stream.
            self.not_empty.notify_all();
        }
    }

    pub(crate) fn attach_consumer(&self) {
        self.lock().consumers += 1;
    }

    pub(crate) fn release_consumer(&self) {
        let mut state = self.lock();
        debug_assert_refcount_live!(state.consumers, "consumer");
        state.consumers -= 1;
        let last = state.consumers == 0;
        drop(state);

        if last {
            // Every parked writer must observe the sink.
            self.not_full.notify_all();
        }
    }

    // ---------------------------------------------------------------------
    // PUSH
    // ---------------------------------------------------------------------

    /// Blocking push of a whole batch.
    ///
    /// Returns the number of elements accepted. Fewer than `items.len()`
    /// only when every consumer was released or a growth failed; the
    /// remainder is dropped, since nothing can ever observe it.
    ///
    /// On a bounded pipe a batch larger than the free room is written in
    /// room-sized chunks, waking readers after each chunk and waiting on
    /// `not_full` in between.
    pub(crate) fn push(&self, items: &[T]) -> usize {
        if items.is_empty() {
            return 0;
        }

        let limit = self.config.limit;
        let mut pushed = 0;
        let mut state = self.lock();

        while pushed < items.len() {
            if state.consumers == 0 || state.broken {
                break;
            }

            if limit > 0 && state.ring.len() == limit {
                state = self.wait_not_full(state);
                continue;
            }

            let room = if limit == 0 {
                items.len() - pushed
            } else {
                (limit - state.ring.len()).min(items.len() - pushed)
            };
            let chunk = &items[pushed..pushed + room];

            if state.ring.free() < chunk.len() {
                let needed = state.ring.len() + chunk.len();
                if self.grow(&mut state, needed).is_err() {
                    state.broken = true;
                    continue;
                }
            }

            state.ring.push_slice(chunk);
            pushed += chunk.len();
            self.wake_readers(chunk.len());
        }

        let dropped = items.len() - pushed;
        drop(state);

        if self.config.enable_metrics {
            if pushed > 0 {
                self.metrics.add_elems_pushed(pushed as u64);
                self.metrics.add_batches_pushed(1);
            }
            if dropped > 0 {
                self.metrics.add_elems_sunk(dropped as u64);
            }
        }

        pushed
    }

    /// Non-blocking push. Accepts whatever fits right now.
    pub(crate) fn try_push(&self, items: &[T]) -> Result<usize, PipeError> {
        if items.is_empty() {
            return Ok(0);
        }

        let limit = self.config.limit;
        let mut state = self.lock();

        if state.broken {
            return Err(PipeError::GrowthFailed);
        }
        if state.consumers == 0 {
            return Err(PipeError::Disconnected);
        }

        let room = if limit == 0 {
            items.len()
        } else {
            let room = limit - state.ring.len();
            if room == 0 {
                return Err(PipeError::Full);
            }
            room.min(items.len())
        };
        let chunk = &items[..room];

        if state.ring.free() < chunk.len() {
            let needed = state.ring.len() + chunk.len();
            if self.grow(&mut state, needed).is_err() {
                state.broken = true;
                return Err(PipeError::GrowthFailed);
            }
        }

        state.ring.push_slice(chunk);
        self.wake_readers(chunk.len());
        drop(state);

        if self.config.enable_metrics {
            self.metrics.add_elems_pushed(chunk.len() as u64);
            self.metrics.add_batches_pushed(1);
        }

        Ok(room)
    }

    // ---------------------------------------------------------------------
    // POP
    // ---------------------------------------------------------------------

    /// Blocking pop into a slice. Returns 0 only at end-of-stream.
    pub(crate) fn pop(&self, dst: &mut [T]) -> usize {
        if dst.is_empty() {
            return 0;
        }

        let mut state = self.lock();
        loop {
            if !state.ring.is_empty() {
                break;
            }
            if state.producers == 0 {
                return 0;
            }
            state = self.wait_not_empty(state);
        }

        let n = state.ring.pop_slice(dst);
        self.finish_pop(state, n);
        n
    }

    /// Blocking pop appending up to `max_n` elements to `dst`.
    pub(crate) fn pop_into(&self, dst: &mut Vec<T>, max_n: usize) -> usize {
        if max_n == 0 {
            return 0;
        }

        let mut state = self.lock();
        loop {
            if !state.ring.is_empty() {
                break;
            }
            if state.producers == 0 {
                return 0;
            }
            state = self.wait_not_empty(state);
        }

        let n = state.ring.pop_into(dst, max_n);
        self.finish_pop(state, n);
        n
    }

    /// Non-blocking pop.
    ///
    /// `None` means empty with producers still attached (a retry can
    /// succeed); `Some(0)` is end-of-stream.
    pub(crate) fn try_pop(&self, dst: &mut [T]) -> Option<usize> {
        if dst.is_empty() {
            return Some(0);
        }

        let mut state = self.lock();
        if state.ring.is_empty() {
            if state.producers == 0 {
                return Some(0);
            }
            return None;
        }

        let n = state.ring.pop_slice(dst);
        self.finish_pop(state, n);
        Some(n)
    }

    fn finish_pop(&self, mut state: MutexGuard<'_, PipeState<T>>, n: usize) {
        self.maybe_shrink(&mut state);
        drop(state);

        if n == 1 {
            self.not_full.notify_one();
        } else {
            self.not_full.notify_all();
        }

        if self.config.enable_metrics {
            self.metrics.add_elems_popped(n as u64);
            self.metrics.add_batches_popped(1);
        }
    }

    // ---------------------------------------------------------------------
    // CAPACITY
    // ---------------------------------------------------------------------

    /// Grows the ring geometrically until it covers `needed` slots,
    /// clamping at the limit on bounded pipes.
    fn grow(
        &self,
        state: &mut MutexGuard<'_, PipeState<T>>,
        needed: usize,
    ) -> Result<(), std::collections::TryReserveError> {
        let mut target = state.ring.capacity().max(1);
        while target < needed {
            target *= 2;
        }
        if self.config.limit > 0 {
            // Callers never ask for more than the limit.
            target = target.min(self.config.limit);
        }

        state.ring.realloc(target)?;
        if self.config.enable_metrics {
            self.metrics.add_growths(1);
        }
        Ok(())
    }

    /// Halves the buffer once occupancy falls to a quarter of capacity.
    ///
    /// Advisory: never below the configured start capacity, and a failed
    /// reallocation keeps the old buffer.
    fn maybe_shrink(&self, state: &mut MutexGuard<'_, PipeState<T>>) {
        let cap = state.ring.capacity();
        let floor = self.config.start_capacity();
        if cap > floor && state.ring.len() <= cap / 4 {
            let target = (cap / 2).max(floor);
            if state.ring.realloc(target).is_ok() && self.config.enable_metrics {
                self.metrics.add_shrinks(1);
            }
        }
    }

    /// Pre-grows the ring so at least `n` elements fit without another
    /// reallocation. Advisory, like shrink.
    pub(crate) fn reserve(&self, n: usize) {
        let mut target = n;
        if self.config.limit > 0 {
            target = target.min(self.config.limit);
        }

        let mut state = self.lock();
        if target > state.ring.capacity() {
            let grown = state.ring.realloc(target).is_ok();
            if grown && self.config.enable_metrics {
                self.metrics.add_growths(1);
            }
        }
    }

    fn wake_readers(&self, transferred: usize) {
        if transferred == 1 {
            self.not_empty.notify_one();
        } else {
            self.not_empty.notify_all();
        }
    }

    // ---------------------------------------------------------------------
    // INTROSPECTION
    // ---------------------------------------------------------------------

    pub(crate) fn len(&self) -> usize {
        self.lock().ring.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.lock().ring.capacity()
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// The root owner of a pipe.
///
/// Holds one producer credit and one consumer credit, so the creator can
/// mint handles of either side before letting go. Dropping the root
/// releases both credits; from then on the pipe lives exactly as long as
/// its outstanding [`Producer`] and [`Consumer`] handles.
///
/// # Example
///
/// ```
/// use ringpipe::Pipe;
/// use std::thread;
///
/// let pipe = Pipe::<u32>::unbounded();
/// let tx = pipe.producer();
/// let rx = pipe.consumer();
/// drop(pipe);
///
/// let writer = thread::spawn(move || {
///     tx.send(&[1, 2, 3]);
///     // tx drops here: rx sees end-of-stream after draining
/// });
///
/// let mut buf = [0u32; 8];
/// let mut received = Vec::new();
/// loop {
///     let n = rx.recv(&mut buf);
///     if n == 0 {
///         break;
///     }
///     received.extend_from_slice(&buf[..n]);
/// }
/// writer.join().unwrap();
/// assert_eq!(received, vec![1, 2, 3]);
/// ```
pub struct Pipe<T: Copy> {
    core: Arc<Core<T>>,
}

impl<T: Copy> Pipe<T> {
    /// Creates a pipe with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            core: Arc::new(Core::new(config)),
        }
    }

    /// An unbounded pipe: pushes never block, the buffer grows on demand.
    pub fn unbounded() -> Self {
        Self::with_config(Config::unbounded())
    }

    /// A bounded pipe holding at most `limit` elements; pushes block while
    /// it is full.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is 0.
    pub fn bounded(limit: usize) -> Self {
        Self::with_config(Config::bounded(limit))
    }

    /// Mints a new producer handle.
    pub fn producer(&self) -> Producer<T> {
        Producer::attach(&self.core)
    }

    /// Mints a new consumer handle.
    pub fn consumer(&self) -> Consumer<T> {
        Consumer::attach(&self.core)
    }

    /// Hints that the pipe should hold at least `n` elements without
    /// growing again.
    pub fn reserve(&self, n: usize) {
        self.core.reserve(n);
    }

    /// Current number of buffered elements.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if no elements are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of allocated element slots.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// The configured element limit; 0 means unbounded.
    pub fn limit(&self) -> usize {
        self.core.config().limit
    }

    /// Metrics snapshot; all zeros unless `Config::enable_metrics` is set.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.core.metrics()
    }
}

impl<T: Copy> Drop for Pipe<T> {
    fn drop(&mut self) {
        self.core.release_producer();
        self.core.release_consumer();
    }
}
