//! `workforce`: a small concurrency substrate of tasks, schedulers and
//! workers.
//!
//! A [`task::Task`] packages a callable with the producer side of a
//! [`future::Future`]; a [`scheduler::Scheduler`] (concretely,
//! [`scheduler::TaskQueue`]) holds admitted tasks and hands them out
//! to [`worker::Worker`]s under a pull protocol; a worker drives itself
//! through a `WAIT`/`WORK`/`TERMINATE` state machine, either on its own
//! thread or on the caller's; [`delayed_start::DelayedStart`] defers
//! starting a worker until some later event hands it off.
//!
//! ```
//! use workforce::scheduler::TaskQueue;
//! use workforce::worker;
//!
//! let queue = TaskQueue::new();
//! let w = worker::r#async(queue.scheduler(), None);
//!
//! let future = queue.submit(|| 1 + 1);
//! queue.close();
//! w.wait();
//!
//! assert_eq!(future.peek().value(), Some(&2));
//! ```

pub mod delayed_start;
pub mod future;
pub mod outcome;
pub mod scheduler;
pub mod task;
pub mod worker;

pub use delayed_start::DelayedStart;
pub use future::{DynFuture, Future, OutcomeRef};
pub use outcome::{DynOutcome, Outcome, UNIT};
pub use scheduler::{Scheduler, TaskQueue};
pub use task::{Cancel, Task};
pub use worker::{Worker, WorkerState};
