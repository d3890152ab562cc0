//! A one-shot, read-many rendezvous between a [`crate::task::Task`] and
//! whoever wants to observe its [`Outcome`].

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::outcome::{DynOutcome, Outcome};

enum Slot<R> {
    Pending,
    Ready(Outcome<R>),
}

struct Shared<R> {
    slot: Mutex<Slot<R>>,
    ready: Condvar,
}

impl<R> Shared<R> {
    fn new() -> Self {
        Shared {
            slot: Mutex::new(Slot::Pending),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, outcome: Outcome<R>) {
        let mut slot = self.slot.lock().unwrap();
        assert!(
            matches!(*slot, Slot::Pending),
            "a future's outcome slot may only be written once"
        );
        *slot = Slot::Ready(outcome);
        drop(slot);
        self.ready.notify_all();
    }

    fn wait(&self) -> MutexGuard<'_, Slot<R>> {
        let mut slot = self.slot.lock().unwrap();
        while matches!(*slot, Slot::Pending) {
            slot = self.ready.wait(slot).unwrap();
        }
        slot
    }

    fn poll(&self) -> Option<MutexGuard<'_, Slot<R>>> {
        let slot = self.slot.lock().unwrap();
        match *slot {
            Slot::Pending => None,
            Slot::Ready(_) => Some(slot),
        }
    }
}

/// The producer side of a [`Future`], held by the [`crate::task::Task`]
/// that owns it. Writing twice is a contract violation.
pub(crate) struct Promise<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Promise<R> {
    pub(crate) fn publish(&self, outcome: Outcome<R>) {
        self.shared.publish(outcome);
    }
}

/// A blocking, read-only view of an already-published [`Outcome`].
///
/// Obtained from [`Future::wait`] / [`Future::peek`]; borrows the
/// future it came from.
pub struct OutcomeRef<'a, R> {
    guard: MutexGuard<'a, Slot<R>>,
}

impl<R> Deref for OutcomeRef<'_, R> {
    type Target = Outcome<R>;

    fn deref(&self) -> &Outcome<R> {
        match &*self.guard {
            Slot::Ready(outcome) => outcome,
            Slot::Pending => unreachable!("OutcomeRef is only constructed once Ready"),
        }
    }
}

/// A cloneable, multi-observer handle to a not-yet-available
/// [`Outcome`].
///
/// Cloning adds an observer; it does not duplicate the underlying
/// slot. Exactly one producer writes the slot exactly once.
pub struct Future<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for Future<R> {
    fn clone(&self) -> Self {
        Future {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R> fmt::Debug for Future<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future").finish_non_exhaustive()
    }
}

/// Creates a linked `(Promise, Future)` pair around a fresh, empty
/// slot.
pub(crate) fn channel<R>() -> (Promise<R>, Future<R>) {
    let shared = Arc::new(Shared::new());
    (
        Promise {
            shared: Arc::clone(&shared),
        },
        Future { shared },
    )
}

impl<R> Future<R> {
    /// Blocks until the outcome is published.
    pub fn wait(&self) {
        let _ = self.shared.wait();
    }

    /// Blocks, then returns a read-only view of the outcome.
    pub fn peek(&self) -> OutcomeRef<'_, R> {
        OutcomeRef {
            guard: self.shared.wait(),
        }
    }

    /// Non-blocking: a view of the outcome if it has been published
    /// yet, `None` otherwise.
    pub fn try_peek(&self) -> Option<OutcomeRef<'_, R>> {
        self.shared.poll().map(|guard| OutcomeRef { guard })
    }

    /// Blocks, returns whether the outcome is [`Outcome::Value`].
    pub fn success(&self) -> bool {
        self.peek().is_success()
    }

    /// Converts this typed future into a type-erased [`DynFuture`].
    ///
    /// The erased handle shares the same underlying slot; it is not a
    /// new observer slot, just a narrower view of this one.
    pub fn into_dyn(self) -> DynFuture
    where
        R: Send + 'static,
    {
        DynFuture {
            inner: Box::new(self),
        }
    }
}

/// A type-erased handle to a [`Future`]'s outcome.
///
/// Preserves `wait`, `success`, `get_failure`, `get_failure_message`
/// and `get_cancellation`; `get_value` is downgraded to an untyped
/// pointer (or the shared unit marker for void callables).
pub struct DynFuture {
    inner: Box<dyn ErasedFutureObj>,
}

/// Object-safe trait erasing a typed [`Future`]'s capabilities down to
/// what [`DynFuture`] exposes.
trait ErasedFutureObj: Send {
    fn wait(&self);
    fn with_outcome(&self, f: &mut dyn FnMut(&dyn DynOutcome));
}

impl<R: Send> ErasedFutureObj for Future<R> {
    fn wait(&self) {
        Future::wait(self);
    }

    fn with_outcome(&self, f: &mut dyn FnMut(&dyn DynOutcome)) {
        let view = self.peek();
        f(&*view);
    }
}

impl DynFuture {
    /// Blocks until the outcome is published.
    pub fn wait(&self) {
        self.inner.wait();
    }

    /// Blocks, returns whether the outcome is a success.
    pub fn success(&self) -> bool {
        let mut out = false;
        self.inner.with_outcome(&mut |o| out = o.success());
        out
    }

    /// Blocks, returns an untyped pointer to the value (or the shared
    /// unit marker for void callables), `None` for `Cancelled`/`Failed`.
    pub fn get_value(&self) -> Option<*const ()> {
        let mut out = None;
        self.inner.with_outcome(&mut |o| out = o.get_value());
        out
    }

    /// Blocks, returns non-null if the outcome is `Cancelled`.
    pub fn get_cancellation(&self) -> Option<*const ()> {
        let mut out = None;
        self.inner.with_outcome(&mut |o| out = o.get_cancellation());
        out
    }

    /// Blocks, returns an untyped pointer to the panic payload if the
    /// outcome is `Failed`.
    pub fn get_failure(&self) -> Option<*const (dyn std::any::Any + Send)> {
        let mut out = None;
        self.inner.with_outcome(&mut |o| {
            out = o.get_failure().map(|payload| payload as *const _);
        });
        out
    }

    /// Blocks, returns the failure message if the outcome is
    /// `Failed`.
    pub fn get_failure_message(&self) -> Option<String> {
        let mut out = None;
        self.inner
            .with_outcome(&mut |o| out = o.get_failure_message());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_observes_the_same_outcome() {
        let (promise, future) = channel::<i32>();
        let clone = future.clone();
        promise.publish(Outcome::Value(9));
        assert_eq!(future.peek().value(), Some(&9));
        assert_eq!(clone.peek().value(), Some(&9));
    }

    #[test]
    fn try_peek_is_none_before_publication() {
        let (_promise, future) = channel::<i32>();
        assert!(future.try_peek().is_none());
    }

    #[test]
    #[should_panic(expected = "may only be written once")]
    fn publishing_twice_panics() {
        let (promise, _future) = channel::<i32>();
        promise.publish(Outcome::Value(1));
        promise.publish(Outcome::Value(2));
    }
}
