//! Stack safety for the recursive walks of the runtime.
//!
//! The evaluator, the static checker, pattern resolution, equality and the
//! pretty printer all recurse over user-controlled structures. Each recursive
//! step goes through [`ensure_sufficient_stack`], which grows the native stack
//! when the remaining space drops below a red zone.
//!
//! # Platform Support
//!
//! - **Native targets**: `stacker::maybe_grow`.
//! - **WASM targets**: plain call, the host manages the stack.

/// Remaining stack below which a new segment is allocated (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// fn eval_node(&mut self, node: NodeId) -> EvalResult {
///     ensure_sufficient_stack(|| self.eval_node_inner(node))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version, calls `f` directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
