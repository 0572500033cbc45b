//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a running interpreter.
///
/// The interpreter polls the token at function entry and on loop
/// back-edges. A fired token unwinds execution with an uncatchable
/// cancellation signal; `catch` and `finally` blocks do not run.
///
/// # Examples
///
/// ```
/// use interpreter::CancellationToken;
///
/// let token = CancellationToken::new();
/// let remote = token.clone();
/// std::thread::spawn(move || remote.cancel()).join().unwrap();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Safe to call from any thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag so the interpreter can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
