//! The synchronous [`Worker`] variant: `start` runs on the caller's
//! own thread.

use std::sync::Arc;

use super::{construct, Kind, Worker};
use crate::delayed_start::DelayedStart;
use crate::scheduler::Scheduler;

/// Builds a worker that runs its main loop on whichever thread calls
/// [`Worker::start`].
///
/// With `delay` omitted, the worker is started immediately — meaning
/// this call itself blocks the calling thread until the worker
/// terminates. With `delay` given, construction only registers the
/// worker with the [`DelayedStart`]; some later caller's thread runs
/// the loop once `delay` hands it off.
pub fn sync(scheduler: Arc<dyn Scheduler>, delay: Option<&DelayedStart>) -> Arc<Worker> {
    construct(scheduler, Kind::Sync, delay)
}
