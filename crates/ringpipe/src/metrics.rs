use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe metrics counters, updated with relaxed atomics.
///
/// All counters are monotonic. Collection is gated on
/// `Config::enable_metrics`; when disabled the counters are never touched.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    elems_pushed: AtomicU64,
    elems_popped: AtomicU64,
    batches_pushed: AtomicU64,
    batches_popped: AtomicU64,
    elems_sunk: AtomicU64,
    growths: AtomicU64,
    shrinks: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_elems_pushed(&self, n: u64) {
        self.elems_pushed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_elems_popped(&self, n: u64) {
        self.elems_popped.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_batches_pushed(&self, n: u64) {
        self.batches_pushed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_batches_popped(&self, n: u64) {
        self.batches_popped.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_elems_sunk(&self, n: u64) {
        self.elems_sunk.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_growths(&self, n: u64) {
        self.growths.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_shrinks(&self, n: u64) {
        self.shrinks.fetch_add(n, Ordering::Relaxed);
    }

    /// Takes a consistent-enough snapshot of all counters.
    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elems_pushed: self.elems_pushed.load(Ordering::Relaxed),
            elems_popped: self.elems_popped.load(Ordering::Relaxed),
            batches_pushed: self.batches_pushed.load(Ordering::Relaxed),
            batches_popped: self.batches_popped.load(Ordering::Relaxed),
            elems_sunk: self.elems_sunk.load(Ordering::Relaxed),
            growths: self.growths.load(Ordering::Relaxed),
            shrinks: self.shrinks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a pipe's [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Elements copied into the ring.
    pub elems_pushed: u64,
    /// Elements copied out of the ring.
    pub elems_popped: u64,
    /// Push calls that moved at least one element.
    pub batches_pushed: u64,
    /// Pop calls that moved at least one element.
    pub batches_popped: u64,
    /// Elements dropped because every consumer was released.
    pub elems_sunk: u64,
    /// Buffer growth reallocations.
    pub growths: u64,
    /// Buffer shrink reallocations.
    pub shrinks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let m = Metrics::new();
        m.add_elems_pushed(5);
        m.add_elems_pushed(3);
        m.add_batches_pushed(2);
        m.add_growths(1);

        let snap = m.snapshot();
        assert_eq!(snap.elems_pushed, 8);
        assert_eq!(snap.batches_pushed, 2);
        assert_eq!(snap.growths, 1);
        assert_eq!(snap.elems_popped, 0);
    }
}
