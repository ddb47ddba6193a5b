//! Debug assertion macros for pipe invariants.
//!
//! Only active in debug builds (`debug_assertions`), so there is zero
//! overhead in release builds. Misuse that trips one of these in debug is
//! undefined behaviourally (not memory-unsafe) in release.

/// Assert that occupancy does not exceed capacity.
///
/// **Invariant**: `0 ≤ len ≤ capacity`
///
/// Used in: `RingBuf::push_slice()` after the occupancy update
macro_rules! debug_assert_occupancy {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "occupancy {} exceeds capacity {}",
            $len,
            $capacity
        )
    };
}

/// Assert that a batch fits in the free slots the caller claimed.
///
/// **Invariant**: raw slot writes only land on unoccupied slots
///
/// Used in: `RingBuf::push_slice()` before any slot is written
macro_rules! debug_assert_room {
    ($wanted:expr, $free:expr) => {
        debug_assert!(
            $wanted <= $free,
            "pushing {} elements into {} free slots",
            $wanted,
            $free
        )
    };
}

/// Assert that a handle release has a refcount to decrement.
///
/// **Invariant**: every release is paired with a prior attach
///
/// Used in: `Core::release_producer()` / `Core::release_consumer()`
macro_rules! debug_assert_refcount_live {
    ($count:expr, $side:literal) => {
        debug_assert!($count > 0, "{} refcount underflow", $side)
    };
}

/// Assert that a transfer batch is non-empty.
///
/// Zero-sized pushes and pops are programmer errors; the release build
/// returns 0 without touching the pipe.
///
/// Used in: `Producer::send()`, `Consumer::recv()` and the try variants
macro_rules! debug_assert_nonempty_batch {
    ($len:expr, $op:literal) => {
        debug_assert!($len > 0, "{} called with a zero-length batch", $op)
    };
}

pub(crate) use debug_assert_nonempty_batch;
pub(crate) use debug_assert_occupancy;
pub(crate) use debug_assert_refcount_live;
pub(crate) use debug_assert_room;
