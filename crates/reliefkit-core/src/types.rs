//! Type aliases for commonly used complex types.
//!
//! Gives meaningful names to the nested types shared across the workspace
//! so call sites stay readable.

use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A boxed dynamically-typed iterator.
///
/// Used when the concrete iterator type varies at runtime, e.g. forward vs
/// reverse scan-line traversal (`Range<T>` and `Rev<Range<T>>` are different
/// types).
pub type BoxedIterator<T> = Box<dyn Iterator<Item = T>>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}
