//! The asynchronous [`Worker`] variant: `start` spawns a dedicated
//! thread and returns immediately.

use std::sync::{Arc, Mutex};

use super::{construct, Kind, Worker};
use crate::delayed_start::DelayedStart;
use crate::scheduler::Scheduler;

/// Builds a worker that runs its main loop on a private thread of its
/// own.
///
/// With `delay` omitted, the thread is spawned immediately.
/// With `delay` given, construction only registers the worker with
/// the [`DelayedStart`]; the thread is spawned once `delay` hands it
/// off. Dropping the returned handle joins that thread, blocking
/// until the worker's loop has actually returned.
///
/// Named with a raw identifier because `async` is a reserved keyword.
pub fn r#async(scheduler: Arc<dyn Scheduler>, delay: Option<&DelayedStart>) -> Arc<Worker> {
    construct(scheduler, Kind::Async(Mutex::new(None)), delay)
}
