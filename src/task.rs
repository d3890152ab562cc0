//! [`Task`]: a movable, single-use package of a callable plus its
//! outcome producer.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::future::{self, Future, Promise};
use crate::outcome::Outcome;

/// The payload a task body raises to voluntarily cancel itself.
///
/// Rust has no first-class "raise a cancellation signal" construct, so
/// this plays the role spec.md §9 calls for: "a distinguished signal
/// that the launch handler maps to `Cancelled`", implemented as a
/// panic payload the launcher recognizes by type, mirroring the
/// teacher's own panic-payload downcasting in its failure-capture path
/// (`traceforge::runtime::execution::Execution::step`).
///
/// ```
/// workforce::task::Task::create(|| -> i32 {
///     std::panic::panic_any(workforce::task::Cancel);
/// });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Cancel;

/// A single-use, move-only package of a callable and the producer side
/// of its [`Future`].
///
/// `started` transitions `false` -> `true` exactly once: whichever of
/// [`Task::launch`] or [`Task::cancel`] flips it first wins, and the
/// other becomes a no-op. Dropping a `Task` that never started
/// publishes [`Outcome::Cancelled`].
pub struct Task<R> {
    callable: Option<Box<dyn FnOnce() -> R + Send>>,
    promise: Option<Promise<R>>,
    started: AtomicBool,
    #[cfg(debug_assertions)]
    ended: AtomicBool,
}

impl<R> Task<R> {
    /// Packages `callable` into a `Task`, returning it alongside a
    /// [`Future`] that will observe its eventual [`Outcome`].
    ///
    /// Rust callables capture their arguments by closure rather than
    /// through a separate argument list, so `Task::create(move || ...)`
    /// plays the role of spec.md's `Task::create(callable, args…)`.
    pub fn create<F>(callable: F) -> (Task<R>, Future<R>)
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (promise, future) = future::channel();
        let task = Task {
            callable: Some(Box::new(callable)),
            promise: Some(promise),
            started: AtomicBool::new(false),
            #[cfg(debug_assertions)]
            ended: AtomicBool::new(false),
        };
        (task, future)
    }

    /// Runs the callable and publishes its outcome.
    ///
    /// Launching a task twice is a programming error, not a supported
    /// idempotent call: debug builds assert on it. Never panics on the
    /// callable's behalf, though — failures and self-cancellation
    /// inside the callable are captured into the published [`Outcome`],
    /// not propagated to the caller of `launch`.
    pub fn launch(&mut self)
    where
        R: 'static,
    {
        let already_started = self.started.swap(true, Ordering::AcqRel);
        debug_assert!(!already_started, "Task::launch called more than once");
        if already_started {
            return;
        }
        log::trace!("task launching");

        let callable = self
            .callable
            .take()
            .expect("started flipped false->true exactly once, callable must still be present");
        let promise = self
            .promise
            .take()
            .expect("started flipped false->true exactly once, promise must still be present");

        let result = panic::catch_unwind(AssertUnwindSafe(callable));
        let outcome = match result {
            Ok(value) => Outcome::Value(value),
            Err(payload) => classify_unwind(payload),
        };

        let is_success = outcome.is_success();
        promise.publish(outcome);

        #[cfg(debug_assertions)]
        self.ended.store(true, Ordering::Release);
        log::trace!("task finished: success = {is_success}");
    }

    /// If the task hasn't started yet, marks it started and publishes
    /// [`Outcome::Cancelled`]. Otherwise a no-op. Safe to call
    /// concurrently with any observer of the task's [`Future`].
    pub fn cancel(&mut self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        log::trace!("task cancelled before launch");
        self.callable = None;
        if let Some(promise) = self.promise.take() {
            promise.publish(Outcome::Cancelled);
        }
        #[cfg(debug_assertions)]
        self.ended.store(true, Ordering::Release);
    }
}

fn classify_unwind<R>(payload: Box<dyn Any + Send>) -> Outcome<R> {
    if payload.is::<Cancel>() {
        Outcome::Cancelled
    } else {
        Outcome::Failed(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_publishes_value() {
        let (mut task, future) = Task::create(|| 2 + 2);
        task.launch();
        assert_eq!(future.peek().value(), Some(&4));
    }

    #[test]
    fn drop_before_launch_cancels() {
        let (task, future) = Task::<i32>::create(|| 1);
        drop(task);
        assert!(future.peek().is_cancelled());
    }

    #[test]
    #[should_panic(expected = "launch called more than once")]
    fn second_launch_panics_in_debug() {
        let (mut task, _future) = Task::create(|| 1);
        task.launch();
        task.launch();
    }

    #[test]
    fn panic_is_captured_as_failed() {
        let (mut task, future) = Task::create(|| -> i32 { panic!("boom") });
        task.launch();
        let outcome = future.peek();
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_message().as_deref(), Some("boom"));
    }

    #[test]
    fn cancel_signal_is_captured_as_cancelled() {
        let (mut task, future) = Task::create(|| -> i32 { panic::panic_any(Cancel) });
        task.launch();
        assert!(future.peek().is_cancelled());
    }
}

impl<R> Drop for Task<R> {
    fn drop(&mut self) {
        if !self.started.load(Ordering::Acquire) {
            self.cancel();
        }
        #[cfg(debug_assertions)]
        debug_assert!(
            self.ended.load(Ordering::Acquire),
            "Task dropped while started but not ended: the callable must have been \
             interrupted mid-launch, which this library never does on its own"
        );
    }
}
