//! [`DelayedStart`]: a single-slot coordinator that defers starting a
//! worker until it is handed off, explicitly triggered, or dropped.

use std::sync::{Arc, Mutex};

use crate::worker::Worker;

/// Holds at most one not-yet-started [`Worker`], deferring its
/// [`Worker::start`] call.
///
/// Holding an `Arc<Worker>` rather than the `Worker` itself means the
/// caller that built the worker keeps its own handle (to call
/// `request_state`, `wait`, etc. on) while `DelayedStart` separately
/// holds the trigger to start it — neither side needs exclusive
/// ownership of the other.
///
/// Accepting a second worker while one is already held starts the
/// first before taking custody of the second, so a `DelayedStart`
/// never silently drops or leaks a worker it was given. Dropping a
/// `DelayedStart` starts whatever it is still holding.
#[derive(Default)]
pub struct DelayedStart {
    held: Mutex<Option<Arc<Worker>>>,
}

impl DelayedStart {
    /// Creates an empty `DelayedStart`.
    pub fn new() -> Self {
        DelayedStart {
            held: Mutex::new(None),
        }
    }

    /// Registers `worker` to be started later, starting whatever
    /// worker was previously held.
    pub(crate) fn accept(&self, worker: Arc<Worker>) {
        let mut held = self.held.lock().unwrap();
        if let Some(previous) = held.take() {
            log::trace!("delayed start: handing off, starting previously held worker");
            previous.start();
        }
        *held = Some(worker);
    }

    /// Starts the held worker, if any. A no-op on an empty
    /// `DelayedStart`.
    pub fn start(&self) {
        let mut held = self.held.lock().unwrap();
        if let Some(worker) = held.take() {
            log::trace!("delayed start: starting held worker");
            worker.start();
        }
    }

    /// `true` if no worker is currently held.
    pub fn is_empty(&self) -> bool {
        self.held.lock().unwrap().is_none()
    }
}

impl Drop for DelayedStart {
    fn drop(&mut self) {
        self.start();
    }
}
