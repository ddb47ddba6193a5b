use crate::invariants::debug_assert_nonempty_batch;
use crate::pipe::Core;
use crate::PipeError;
use crossbeam_utils::Backoff;
use std::slice;
use std::sync::Arc;

/// Write capability for one pipe.
///
/// Cloning mints another producer handle; the pipe reports end-of-stream
/// to consumers once every producer handle (and the root's producer
/// credit) has been dropped. Handles from the same pipe can push from
/// different threads concurrently; batches from distinct handles
/// interleave only at chunk boundaries, never inside one.
pub struct Producer<T: Copy> {
    core: Arc<Core<T>>,
}

impl<T: Copy> Producer<T> {
    pub(crate) fn attach(core: &Arc<Core<T>>) -> Self {
        core.attach_producer();
        Self {
            core: Arc::clone(core),
        }
    }

    /// Copies the whole batch into the pipe, blocking while a bounded pipe
    /// is full.
    ///
    /// Returns the number of elements accepted. This is `items.len()`
    /// unless every consumer handle was released (or a growth allocation
    /// failed) part-way, in which case the remainder is dropped: data
    /// nobody can pop is not worth blocking for.
    pub fn send(&self, items: &[T]) -> usize {
        debug_assert_nonempty_batch!(items.len(), "send");
        self.core.push(items)
    }

    /// Single-element convenience. Returns `false` if the element was
    /// dropped (no consumers, or the pipe is broken).
    pub fn push(&self, item: T) -> bool {
        self.core.push(slice::from_ref(&item)) == 1
    }

    /// Copies in whatever fits without blocking.
    ///
    /// On a bounded pipe this can accept fewer than `items.len()`
    /// elements; `Err(PipeError::Full)` means not even one fit.
    pub fn try_send(&self, items: &[T]) -> Result<usize, PipeError> {
        debug_assert_nonempty_batch!(items.len(), "try_send");
        self.core.try_push(items)
    }
}

impl<T: Copy> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self::attach(&self.core)
    }
}

impl<T: Copy> Drop for Producer<T> {
    fn drop(&mut self) {
        self.core.release_producer();
    }
}

/// Read capability for one pipe.
///
/// Cloning mints another consumer handle; once every consumer handle (and
/// the root's consumer credit) has been dropped, pushes become no-ops.
/// Each buffered element is delivered to exactly one consumer.
pub struct Consumer<T: Copy> {
    core: Arc<Core<T>>,
}

impl<T: Copy> Consumer<T> {
    pub(crate) fn attach(core: &Arc<Core<T>>) -> Self {
        core.attach_consumer();
        Self {
            core: Arc::clone(core),
        }
    }

    /// Copies up to `out.len()` elements out, blocking while the pipe is
    /// empty and producers are attached.
    ///
    /// Returns 0 only at end-of-stream: empty pipe, all producer handles
    /// released. Data buffered before the last release is always drained
    /// first.
    ///
    /// Spins briefly before parking; the gap between batches is usually
    /// shorter than a trip through the scheduler.
    pub fn recv(&self, out: &mut [T]) -> usize {
        debug_assert_nonempty_batch!(out.len(), "recv");

        let backoff = Backoff::new();
        loop {
            if let Some(n) = self.core.try_pop(out) {
                return n;
            }
            if backoff.is_completed() {
                return self.core.pop(out);
            }
            backoff.snooze();
        }
    }

    /// Like [`recv`](Self::recv), but clears `buf` and fills it with up to
    /// `max_n` elements. No pre-initialised slice needed, which makes it
    /// the natural receive for worker loops.
    pub fn recv_into(&self, buf: &mut Vec<T>, max_n: usize) -> usize {
        debug_assert_nonempty_batch!(max_n, "recv_into");
        buf.clear();
        self.core.pop_into(buf, max_n)
    }

    /// Copies out whatever is buffered without blocking.
    ///
    /// `Ok(0)` is end-of-stream; `Err(PipeError::Empty)` means a retry can
    /// succeed because producers are still attached.
    pub fn try_recv(&self, out: &mut [T]) -> Result<usize, PipeError> {
        debug_assert_nonempty_batch!(out.len(), "try_recv");
        self.core.try_pop(out).ok_or(PipeError::Empty)
    }
}

impl<T: Copy> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self::attach(&self.core)
    }
}

impl<T: Copy> Drop for Consumer<T> {
    fn drop(&mut self) {
        self.core.release_consumer();
    }
}

#[cfg(test)]
mod tests {
    use crate::{Pipe, PipeError};

    #[test]
    fn test_clone_extends_lifetime() {
        let pipe = Pipe::<u32>::unbounded();
        let tx = pipe.producer();
        let tx2 = tx.clone();
        let rx = pipe.consumer();
        drop(pipe);
        drop(tx);

        // tx2 still holds the producer side open.
        let mut buf = [0u32; 1];
        assert_eq!(rx.try_recv(&mut buf), Err(PipeError::Empty));

        tx2.push(7);
        assert_eq!(rx.try_recv(&mut buf), Ok(1));
        assert_eq!(buf[0], 7);

        drop(tx2);
        assert_eq!(rx.try_recv(&mut buf), Ok(0));
    }

    #[test]
    fn test_try_send_full_and_partial() {
        let pipe = Pipe::<u32>::bounded(3);
        let tx = pipe.producer();
        let rx = pipe.consumer();
        drop(pipe);

        assert_eq!(tx.try_send(&[1, 2, 3, 4, 5]), Ok(3));
        assert_eq!(tx.try_send(&[6]), Err(PipeError::Full));

        let mut buf = [0u32; 3];
        assert_eq!(rx.try_recv(&mut buf), Ok(3));
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_try_send_disconnected() {
        let pipe = Pipe::<u32>::unbounded();
        let tx = pipe.producer();
        drop(pipe);

        assert_eq!(tx.try_send(&[1]), Err(PipeError::Disconnected));
    }

    #[test]
    fn test_recv_into_reuses_buffer() {
        let pipe = Pipe::<u32>::unbounded();
        let tx = pipe.producer();
        let rx = pipe.consumer();
        drop(pipe);

        tx.send(&[1, 2, 3]);
        let mut buf = vec![99, 99, 99, 99];
        assert_eq!(rx.recv_into(&mut buf, 8), 3);
        assert_eq!(buf, vec![1, 2, 3]);
    }
}
