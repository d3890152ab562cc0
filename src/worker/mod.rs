//! A consumer of a [`crate::scheduler::Scheduler`] driven by a
//! `WAIT` / `WORK` / `TERMINATE` state machine.

mod async_worker;
mod sync_worker;

pub use async_worker::r#async;
pub use sync_worker::sync;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::delayed_start::DelayedStart;
use crate::scheduler::Scheduler;

/// The three states a [`Worker`] can observe itself in, or be asked to
/// move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Parked, not pulling work from the scheduler.
    Wait,
    /// Pulling and executing work from the scheduler.
    Work,
    /// Terminal: the worker's run loop has returned for good.
    Terminate,
}

struct Status {
    current: WorkerState,
    requested: WorkerState,
}

struct Inner {
    scheduler: Arc<dyn Scheduler>,
    status: Mutex<Status>,
    cv: std::sync::Condvar,
    has_run: AtomicBool,
}

enum Kind {
    Sync,
    Async(Mutex<Option<std::thread::JoinHandle<()>>>),
}

/// A worker pulling tasks from a [`crate::scheduler::Scheduler`] under
/// a controlled `WAIT`/`WORK`/`TERMINATE` state machine.
///
/// Constructed via [`sync`] (runs on the caller's thread) or
/// [`r#async`] (owns a private thread); both share this type and the
/// state machine in this module. Obtained wrapped in an `Arc` so a
/// [`DelayedStart`] can hold a handle to a not-yet-started worker
/// without taking exclusive ownership away from its creator.
pub struct Worker {
    inner: Arc<Inner>,
    kind: Kind,
}

impl Worker {
    fn new(scheduler: Arc<dyn Scheduler>, kind: Kind) -> Arc<Worker> {
        Arc::new(Worker {
            inner: Arc::new(Inner {
                scheduler,
                status: Mutex::new(Status {
                    current: WorkerState::Wait,
                    requested: WorkerState::Work,
                }),
                cv: std::sync::Condvar::new(),
                has_run: AtomicBool::new(false),
            }),
            kind,
        })
    }

    /// Runs the main loop.
    ///
    /// For a synchronous worker this blocks the calling thread until
    /// the loop terminates. For an asynchronous worker this spawns a
    /// dedicated thread and returns immediately; calling it again
    /// while that thread is alive is a no-op.
    pub fn start(&self) {
        self.inner.has_run.store(true, Ordering::Release);
        match &self.kind {
            Kind::Sync => run_loop(&self.inner),
            Kind::Async(slot) => {
                let mut guard = slot.lock().unwrap();
                if guard.is_some() {
                    return;
                }
                let inner = Arc::clone(&self.inner);
                *guard = Some(std::thread::spawn(move || run_loop(&inner)));
            }
        }
    }

    /// Requests that the worker transition to state `s`.
    ///
    /// A no-op if `requested` is already `s`. Rejecting a transition
    /// out of `TERMINATE` is a contract violation, asserted in debug
    /// builds. Wakes both the worker's own condition and the
    /// scheduler's predicate-waiters whenever `requested` actually
    /// changes, since a worker can be parked either in its own `WAIT`
    /// loop or inside the scheduler's `start_scheduled_work` — the
    /// caller has no way to know which, so both are always signalled.
    pub fn request_state(&self, s: WorkerState) {
        let mut status = self.inner.status.lock().unwrap();
        if status.requested == WorkerState::Terminate {
            debug_assert!(
                s == WorkerState::Terminate,
                "cannot request a state transition out of TERMINATE"
            );
            return;
        }
        if status.requested == s {
            return;
        }
        log::debug!("worker requested state {:?} -> {s:?}", status.requested);
        status.requested = s;
        drop(status);
        self.inner.cv.notify_all();
        self.inner.scheduler.check_waiting_predicates();
    }

    /// The worker's last-observed state.
    pub fn get_state(&self) -> WorkerState {
        self.inner.status.lock().unwrap().current
    }

    /// The state the worker has most recently been asked to reach.
    pub fn get_requested_state(&self) -> WorkerState {
        self.inner.status.lock().unwrap().requested
    }

    /// Blocks until the worker reaches `TERMINATE`.
    ///
    /// First waits for the scheduler to complete (so a `WAIT`-parked
    /// worker, which only learns of scheduler completion when woken,
    /// gets a chance to notice), then broadcasts the worker's own
    /// condition before blocking on it. Broadcasting before blocking
    /// is essential: blocking first would deadlock against a worker
    /// parked inside the scheduler rather than in its own `WAIT` loop.
    pub fn wait(&self) {
        self.inner.scheduler.wait_until_completed();
        self.inner.cv.notify_all();
        let mut status = self.inner.status.lock().unwrap();
        while status.current != WorkerState::Terminate {
            status = self.inner.cv.wait(status).unwrap();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Kind::Async(slot) = &self.kind {
            if let Some(handle) = slot.lock().unwrap().take() {
                let _ = handle.join();
            }
        }
        #[cfg(debug_assertions)]
        if self.inner.has_run.load(Ordering::Acquire) {
            debug_assert_eq!(
                self.get_state(),
                WorkerState::Terminate,
                "Worker destroyed before reaching TERMINATE"
            );
        }
    }
}

/// The state-machine core shared by both worker variants (spec.md
/// §4.5): released around every blocking operation, re-acquired
/// around state reads/writes.
fn run_loop(inner: &Arc<Inner>) {
    let mut status = inner.status.lock().unwrap();
    'outer: loop {
        status.current = status.requested;
        log::debug!("worker entering {:?}", status.current);
        if status.requested == WorkerState::Terminate {
            break 'outer;
        }
        while status.requested == WorkerState::Wait {
            if inner.scheduler.is_completed() {
                break 'outer;
            }
            status = inner.cv.wait(status).unwrap();
        }
        if status.requested == WorkerState::Work {
            if inner.scheduler.is_completed() {
                break 'outer;
            }
            drop(status);
            let mut predicate = |_work_available: bool| -> bool {
                inner.status.lock().unwrap().requested == WorkerState::Work
            };
            inner.scheduler.start_scheduled_work(&mut predicate);
            status = inner.status.lock().unwrap();
        }
    }
    status.current = WorkerState::Terminate;
    log::debug!("worker terminated");
    drop(status);
    inner.cv.notify_all();
}

fn construct(scheduler: Arc<dyn Scheduler>, kind: Kind, delay: Option<&DelayedStart>) -> Arc<Worker> {
    let worker = Worker::new(scheduler, kind);
    match delay {
        Some(delay) => {
            delay.accept(Arc::clone(&worker));
        }
        None => worker.start(),
    }
    worker
}
