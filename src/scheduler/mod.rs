//! The abstract scheduler contract a [`crate::worker::Worker`] pulls
//! work from.

mod queue;

pub use queue::TaskQueue;

/// A thread-safe source of work for workers.
///
/// The only concrete implementation in scope is [`TaskQueue`], a FIFO
/// scheduler; `Scheduler` is kept as a trait (rather than a concrete
/// struct baked into `Worker`) so the worker state machine doesn't
/// need to know about queues, admission, or FIFO ordering at all —
/// exactly the "capability abstraction behind a stable interface"
/// spec.md §9 asks for in place of the original's pointer-to-impl
/// idiom.
pub trait Scheduler: Send + Sync {
    /// Invoked by a worker willing to execute tasks.
    ///
    /// Loops internally: computes work availability, asks `predicate`
    /// whether to proceed, and if so either runs the next task (when
    /// work is available) or blocks until work arrives, the scheduler
    /// completes, or [`Scheduler::check_waiting_predicates`] is called
    /// — then repeats. Returns once `predicate` returns `false` or the
    /// scheduler is [`Scheduler::is_completed`].
    ///
    /// `predicate` is evaluated under the scheduler's own lock and must
    /// not try to acquire any lock the caller already holds other than
    /// its own; it may take and release a different, unrelated lock
    /// (in practice, the calling worker's lock) internally.
    fn start_scheduled_work(&self, predicate: &mut dyn FnMut(bool) -> bool);

    /// Wakes every thread currently blocked inside step 5 of
    /// [`Scheduler::start_scheduled_work`] so each re-evaluates its
    /// predicate. Does not affect workers currently running a task.
    fn check_waiting_predicates(&self);

    /// Non-blocking observation of the latched completion flag.
    fn is_completed(&self) -> bool;

    /// Blocks until [`Scheduler::is_completed`] would return `true`.
    fn wait_until_completed(&self);
}
