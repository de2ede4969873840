//! Type aliases for shared-ownership types.
//!
//! The visualizer runs on a single execution context and shares state
//! with `Rc<RefCell<T>>`; anything an event source may touch from another
//! thread goes through `Arc<Mutex<T>>` instead.

use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

/// State shared between the stage and its collaborators on one thread.
///
/// # Example
/// ```rust,ignore
/// let frames: Shared<FrameLog> = shared(FrameLog::default());
/// frames.borrow_mut().record(..);
/// ```
pub type Shared<T> = Rc<RefCell<T>>;

/// State touched by event sources on other threads (`parking_lot::Mutex`).
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// Queue filled by event sources and drained by the tick loop.
pub type ThreadSafeDeque<T> = Arc<Mutex<VecDeque<T>>>;

/// Wrap `value` in a [`Shared`].
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Wrap `value` in a [`ThreadSafe`].
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_mutation_is_visible_through_clones() {
        let a = shared(1);
        let b = Rc::clone(&a);
        *b.borrow_mut() += 1;
        assert_eq!(*a.borrow(), 2);
    }

    #[test]
    fn test_thread_safe_across_threads() {
        let counter = thread_safe(0usize);
        let c = Arc::clone(&counter);
        std::thread::spawn(move || *c.lock() += 5)
            .join()
            .expect("thread panicked");
        assert_eq!(*counter.lock(), 5);
    }
}
