//! Room on the host stack for the recursive parser and interpreter.

/// Below this many free bytes a new segment is allocated before recursing.
const RED_ZONE: usize = 100 * 1024;
const SEGMENT_SIZE: usize = 1024 * 1024;

/// Runs `f`, moving it onto a fresh heap-allocated stack segment first if the
/// current stack is nearly exhausted.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}
