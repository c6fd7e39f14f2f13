//! Stack growth for recursive passes.
//!
//! Expression lowering and the reference interpreter both recurse on the
//! shape of their input. Wrapping the recursive step in
//! [`ensure_sufficient_stack`] keeps a deeply nested expression or a deep
//! call chain from overflowing the native stack.
//!
//! On native targets the stack is grown with `stacker` once less than the
//! red zone remains. On wasm the closure runs directly.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
